//! Image descriptors.
//!
//! An [`ImageDescriptor`] is everything the harness needs to know about one
//! fixture Dockerfile before starting a container from it: the image name
//! derived from its location, the base image it declares, and where that
//! base image is pulled from after substitution.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use imagesmith_core::error::{ImageError, Result};
use serde::Serialize;

use crate::dockerfile::{scan_base_image, DockerfileLayout};
use crate::oci::{ImageReference, Substitution};

/// Derived names for one Dockerfile. Immutable once built.
///
/// Descriptors are ordered (and compared for equality) by the canonical
/// string of `image_name`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDescriptor {
    location: PathBuf,
    local_name: ImageReference,
    image_name: ImageReference,
    base_image_name: ImageReference,
    base_image_name_substituted: ImageReference,
}

impl ImageDescriptor {
    /// Derive a descriptor from a Dockerfile path.
    ///
    /// Fails without producing a partial descriptor if the path does not
    /// follow the resources layout, the file cannot be read, it lacks an
    /// `ARG BASE_IMAGE="..."` line, or substitution is refused.
    pub fn derive(location: &Path, substitution: &Substitution) -> Result<Self> {
        let layout = DockerfileLayout::parse(location)?;
        let local_name = layout.reference()?;
        let image_name = substitution.apply(&local_name)?;
        let base_image_name = scan_base_image(location)?;
        let base_image_name_substituted = substitution.apply(&base_image_name)?;

        tracing::debug!(
            path = %location.display(),
            image = %image_name,
            base = %base_image_name,
            base_substituted = %base_image_name_substituted,
            "Derived image descriptor"
        );

        Ok(Self {
            location: location.to_path_buf(),
            local_name,
            image_name,
            base_image_name,
            base_image_name_substituted,
        })
    }

    /// Path of the Dockerfile this descriptor was derived from.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// `repository:version` exactly as laid out on disk.
    pub fn local_name(&self) -> &ImageReference {
        &self.local_name
    }

    /// Name the built image is tagged with (after substitution).
    pub fn image_name(&self) -> &ImageReference {
        &self.image_name
    }

    /// Base image as declared in the Dockerfile.
    pub fn base_image_name(&self) -> &ImageReference {
        &self.base_image_name
    }

    /// Base image redirected to the internal registry.
    pub fn base_image_name_substituted(&self) -> &ImageReference {
        &self.base_image_name_substituted
    }

    /// Compare against a descriptor that may be absent.
    ///
    /// An absent descriptor is a caller bug, reported as a configuration
    /// error rather than ordered first.
    pub fn try_compare(&self, other: Option<&ImageDescriptor>) -> Result<Ordering> {
        match other {
            Some(other) => Ok(self.cmp(other)),
            None => Err(ImageError::Config(format!(
                "cannot compare descriptor {} to an absent descriptor",
                self.image_name
            ))),
        }
    }
}

impl PartialEq for ImageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ImageDescriptor {}

impl PartialOrd for ImageDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.image_name
            .canonical_name()
            .cmp(&other.image_name.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::{NoopSubstitutor, Substitution};
    use imagesmith_core::config::SubstitutionConfig;
    use tempfile::TempDir;

    fn default_substitution() -> Substitution {
        Substitution::from_config(&SubstitutionConfig::default())
    }

    fn fixture(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn derive(root: &Path, repo: &str, version: &str) -> ImageDescriptor {
        let path = fixture(
            root,
            &format!("resources/{}/{}/Dockerfile", repo, version),
            "ARG BASE_IMAGE=\"alpine:3.20\"\nFROM ${BASE_IMAGE}\n",
        );
        ImageDescriptor::derive(&path, &default_substitution()).unwrap()
    }

    #[test]
    fn test_derive_postgres_init() {
        let tmp = TempDir::new().unwrap();
        let path = fixture(
            tmp.path(),
            "resources/openliberty/testcontainers/postgres-init/17-alpine/Dockerfile",
            "ARG BASE_IMAGE=\"postgres:17-alpine\"\nFROM ${BASE_IMAGE}\nCOPY init.sql /docker-entrypoint-initdb.d/\n",
        );

        let d = ImageDescriptor::derive(&path, &default_substitution()).unwrap();
        assert_eq!(d.location(), path.as_path());
        assert_eq!(
            d.local_name().canonical_name(),
            "openliberty/testcontainers/postgres-init:17-alpine"
        );
        assert_eq!(
            d.image_name().canonical_name(),
            "localhost/openliberty/testcontainers/postgres-init:17-alpine"
        );
        assert_eq!(d.base_image_name().canonical_name(), "postgres:17-alpine");
        assert_eq!(
            d.base_image_name_substituted().canonical_name(),
            "localhost/openliberty/testcontainers/postgres:17-alpine"
        );
    }

    #[test]
    fn test_derive_without_mirror() {
        let tmp = TempDir::new().unwrap();
        let path = fixture(
            tmp.path(),
            "resources/acme/redis/7/Dockerfile",
            "ARG BASE_IMAGE=\"redis:7\"\n",
        );
        let d = ImageDescriptor::derive(&path, &Substitution::new(NoopSubstitutor)).unwrap();
        assert_eq!(d.image_name().canonical_name(), "acme/redis:7");
        assert_eq!(d.base_image_name_substituted().canonical_name(), "redis:7");
    }

    #[test]
    fn test_derive_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let a = derive(tmp.path(), "acme/db", "1.0");
        let b = derive(tmp.path(), "acme/db", "1.0");
        assert_eq!(a.image_name().canonical_name(), b.image_name().canonical_name());
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_missing_base_image() {
        let tmp = TempDir::new().unwrap();
        let path = fixture(tmp.path(), "resources/acme/db/1/Dockerfile", "FROM alpine:3\n");
        let err = ImageDescriptor::derive(&path, &default_substitution()).unwrap_err();
        assert!(matches!(err, ImageError::Parse { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_derive_bad_layout_fails_before_reading() {
        let tmp = TempDir::new().unwrap();
        // File does not exist: a layout error must win over the read error.
        let err = ImageDescriptor::derive(&tmp.path().join("db/1/Dockerfile"), &default_substitution())
            .unwrap_err();
        assert!(matches!(err, ImageError::Parse { .. }));
    }

    #[test]
    fn test_derive_qualified_base_image_is_refused() {
        let tmp = TempDir::new().unwrap();
        let path = fixture(
            tmp.path(),
            "resources/acme/db2/11/Dockerfile",
            "ARG BASE_IMAGE=\"icr.io/db2_community/db2:11.5\"\n",
        );
        let err = ImageDescriptor::derive(&path, &default_substitution()).unwrap_err();
        assert!(matches!(err, ImageError::Config(_)));
    }

    #[test]
    fn test_ordering_by_image_name() {
        let tmp = TempDir::new().unwrap();
        let mut all = vec![
            derive(tmp.path(), "zookeeper", "3.9"),
            derive(tmp.path(), "kafka", "3.7"),
            derive(tmp.path(), "kafka", "3.6"),
            derive(tmp.path(), "acme/db", "1"),
        ];
        all.sort();
        let names: Vec<String> = all.iter().map(|d| d.local_name().unqualified()).collect();
        assert_eq!(names, vec!["acme/db:1", "kafka:3.6", "kafka:3.7", "zookeeper:3.9"]);
    }

    #[test]
    fn test_ordering_is_total() {
        let tmp = TempDir::new().unwrap();
        let a = derive(tmp.path(), "a", "1");
        let b = derive(tmp.path(), "b", "1");
        let c = derive(tmp.path(), "c", "1");

        assert_eq!(a.cmp(&a), Ordering::Equal);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        assert!(a < b && b < c && a < c);
    }

    #[test]
    fn test_sort_is_stable() {
        let tmp = TempDir::new().unwrap();
        let first = derive(tmp.path(), "same", "1");
        let other = fixture(
            tmp.path(),
            "elsewhere/resources/same/1/Dockerfile",
            "ARG BASE_IMAGE=\"busybox:1\"\n",
        );
        let second = ImageDescriptor::derive(&other, &default_substitution()).unwrap();
        let before = derive(tmp.path(), "aaa", "1");

        let mut all = vec![first.clone(), second.clone(), before];
        all.sort();
        assert_eq!(all[1].location(), first.location());
        assert_eq!(all[2].location(), second.location());
    }

    #[test]
    fn test_try_compare_absent_fails() {
        let tmp = TempDir::new().unwrap();
        let a = derive(tmp.path(), "a", "1");
        let b = derive(tmp.path(), "b", "1");
        assert_eq!(a.try_compare(Some(&b)).unwrap(), Ordering::Less);
        assert!(matches!(a.try_compare(None), Err(ImageError::Config(_))));
    }

    #[test]
    fn test_serializes_names_as_strings() {
        let tmp = TempDir::new().unwrap();
        let d = derive(tmp.path(), "acme/db", "1");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["image_name"], "localhost/openliberty/testcontainers/acme/db:1");
        assert_eq!(json["base_image_name"], "alpine:3.20");
    }
}
