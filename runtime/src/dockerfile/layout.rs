//! Image names derived from where a Dockerfile sits.
//!
//! Grammar, over `/`-separated path segments:
//!
//! ```text
//! path       := prefix* "resources" repository version file
//! repository := segment+
//! file       := <name ending in "Dockerfile">
//! ```
//!
//! `.../resources/openliberty/testcontainers/postgres-init/17-alpine/Dockerfile`
//! yields repository `openliberty/testcontainers/postgres-init` and version
//! `17-alpine`. Anything that does not match is rejected; no best-effort
//! guessing.

use std::path::{Path, PathBuf};

use imagesmith_core::error::{ImageError, Result};

use super::walk::DOCKERFILE_SUFFIX;
use crate::oci::ImageReference;

/// Segment that marks the start of the repository path.
pub const RESOURCES_MARKER: &str = "resources";

/// Repository and version parsed from a Dockerfile path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileLayout {
    location: PathBuf,
    repository: String,
    version: String,
}

impl DockerfileLayout {
    /// Parse `path` against the resources layout.
    pub fn parse(path: &Path) -> Result<Self> {
        let normalized = path.to_string_lossy().replace('\\', "/");
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let fail = |message: String| ImageError::parse(path.display(), message);

        let (file, dirs) = segments
            .split_last()
            .ok_or_else(|| fail("empty path".to_string()))?;
        if !file.ends_with(DOCKERFILE_SUFFIX) {
            return Err(fail(format!(
                "file name '{}' does not end with '{}'",
                file, DOCKERFILE_SUFFIX
            )));
        }

        let markers: Vec<usize> = dirs
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == RESOURCES_MARKER)
            .map(|(i, _)| i)
            .collect();
        let marker = match markers.as_slice() {
            [] => {
                return Err(fail(format!(
                    "no '{}/' directory in path",
                    RESOURCES_MARKER
                )))
            }
            [single] => *single,
            _ => {
                return Err(fail(format!(
                    "'{}/' appears {} times in path; expected exactly once",
                    RESOURCES_MARKER,
                    markers.len()
                )))
            }
        };

        // Everything after the marker: repository segments, then the version.
        let after_marker = &dirs[marker + 1..];
        let (version, repository_segments) = match after_marker.split_last() {
            Some((version, repo)) if !repo.is_empty() => (*version, repo),
            _ => {
                return Err(fail(format!(
                    "expected '{}/<repository>/<version>/{}', found {} segment(s) after '{}/'",
                    RESOURCES_MARKER,
                    file,
                    after_marker.len(),
                    RESOURCES_MARKER
                )))
            }
        };
        let repository = repository_segments.join("/");

        // Reject names the container tooling would refuse later.
        ImageReference::new(&repository, version)
            .map_err(|e| fail(format!("not a valid image name: {}", e)))?;

        tracing::debug!(
            path = %path.display(),
            repository = %repository,
            version = %version,
            "Parsed Dockerfile layout"
        );

        Ok(Self {
            location: path.to_path_buf(),
            repository,
            version: version.to_string(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Bare `repository:version` reference.
    pub fn reference(&self) -> Result<ImageReference> {
        ImageReference::new(&self.repository, &self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str) -> Result<DockerfileLayout> {
        DockerfileLayout::parse(Path::new(path))
    }

    #[test]
    fn test_parse_conventional_path() {
        let layout = parse(
            "dev/io.openliberty.org.testcontainers/resources/openliberty/testcontainers/postgres-init/17-alpine/Dockerfile",
        )
        .unwrap();
        assert_eq!(layout.repository(), "openliberty/testcontainers/postgres-init");
        assert_eq!(layout.version(), "17-alpine");
        assert_eq!(
            layout.reference().unwrap().canonical_name(),
            "openliberty/testcontainers/postgres-init:17-alpine"
        );
    }

    #[test]
    fn test_parse_single_segment_repository() {
        let layout = parse("/abs/resources/kafka/3.7/Dockerfile").unwrap();
        assert_eq!(layout.repository(), "kafka");
        assert_eq!(layout.version(), "3.7");
    }

    #[test]
    fn test_parse_windows_separators() {
        let layout = parse("C:\\work\\resources\\acme\\redis\\7\\Dockerfile").unwrap();
        assert_eq!(layout.repository(), "acme/redis");
        assert_eq!(layout.version(), "7");
    }

    #[test]
    fn test_parse_prefixed_file_name() {
        let layout = parse("resources/acme/db/2/base.Dockerfile").unwrap();
        assert_eq!(layout.repository(), "acme/db");
    }

    #[test]
    fn test_parse_ignores_duplicate_separators() {
        let layout = parse("resources//acme/./db/2/Dockerfile").unwrap();
        assert_eq!(layout.repository(), "acme/db");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let path = "x/resources/a/b/1.0/Dockerfile";
        assert_eq!(parse(path).unwrap(), parse(path).unwrap());
    }

    #[test]
    fn test_rejects_missing_marker() {
        let err = parse("src/openliberty/postgres/17/Dockerfile").unwrap_err();
        assert!(matches!(err, ImageError::Parse { .. }));
        assert!(err.to_string().contains("src/openliberty/postgres/17/Dockerfile"));
    }

    #[test]
    fn test_rejects_marker_as_substring() {
        assert!(parse("myresources/acme/db/1/Dockerfile").is_err());
    }

    #[test]
    fn test_rejects_repeated_marker() {
        let err = parse("resources/a/resources/b/1/Dockerfile").unwrap_err();
        assert!(err.to_string().contains("2 times"));
    }

    #[test]
    fn test_rejects_missing_repository() {
        assert!(parse("resources/17-alpine/Dockerfile").is_err());
    }

    #[test]
    fn test_rejects_missing_version() {
        assert!(parse("resources/Dockerfile").is_err());
    }

    #[test]
    fn test_rejects_bare_file_name() {
        assert!(parse("Dockerfile").is_err());
    }

    #[test]
    fn test_rejects_non_dockerfile() {
        assert!(parse("resources/acme/db/1/Dockerfile.bak").is_err());
    }

    #[test]
    fn test_rejects_invalid_repository_characters() {
        let err = parse("resources/Acme/db/1/Dockerfile").unwrap_err();
        assert!(err.to_string().contains("not a valid image name"));
    }

    #[test]
    fn test_rejects_invalid_version() {
        assert!(parse("resources/acme/db/-1/Dockerfile").is_err());
    }
}
