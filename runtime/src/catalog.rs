//! Catalog of every fixture image under a resources tree.

use std::path::{Path, PathBuf};

use imagesmith_core::error::{ImageError, Result};
use tokio::task::JoinSet;

use crate::descriptor::ImageDescriptor;
use crate::dockerfile::discover;
use crate::oci::{ImageReference, Substitution};

/// Sorted descriptors for one tree, plus the Dockerfiles that could not be
/// derived. Skipping failures or aborting on them is the caller's choice.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    substitution: Substitution,
    descriptors: Vec<ImageDescriptor>,
    failures: Vec<(PathBuf, ImageError)>,
}

impl Catalog {
    /// Discover and derive every Dockerfile under `root`.
    ///
    /// A failed walk is an error. Per-file derive failures are collected in
    /// [`Catalog::failures`]. Descriptors come back sorted by image name and
    /// failures by path, regardless of discovery order.
    pub async fn scan(root: &Path, substitution: &Substitution) -> Result<Self> {
        let walk_root = root.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || discover(&walk_root))
            .await
            .map_err(join_error)??;

        let mut tasks = JoinSet::new();
        for path in paths {
            let substitution = substitution.clone();
            tasks.spawn_blocking(move || {
                let result = ImageDescriptor::derive(&path, &substitution);
                (path, result)
            });
        }

        let mut descriptors = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (path, result) = joined.map_err(join_error)?;
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping Dockerfile");
                    failures.push((path, e));
                }
            }
        }

        descriptors.sort();
        failures.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::info!(
            root = %root.display(),
            images = descriptors.len(),
            failures = failures.len(),
            "Scanned Dockerfile tree"
        );

        Ok(Self {
            root: root.to_path_buf(),
            substitution: substitution.clone(),
            descriptors,
            failures,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptors sorted by image name.
    pub fn descriptors(&self) -> &[ImageDescriptor] {
        &self.descriptors
    }

    /// Dockerfiles that could not be derived, sorted by path.
    pub fn failures(&self) -> &[(PathBuf, ImageError)] {
        &self.failures
    }

    /// Look up a descriptor by name.
    ///
    /// Accepts the full image name (`localhost/openliberty/testcontainers/postgres-init:17-alpine`)
    /// or a bare name that the active substitution turns into one
    /// (`postgres-init:17-alpine`).
    pub fn find(&self, name: &str) -> Result<Option<&ImageDescriptor>> {
        let name = name.trim();
        if let Some(found) = self
            .descriptors
            .iter()
            .find(|d| d.image_name().canonical_name() == name)
        {
            return Ok(Some(found));
        }

        let reference = ImageReference::parse(name)?;
        if reference.registry().is_some() {
            return Ok(None);
        }
        let wanted = self.substitution.apply(&reference)?;
        Ok(self.descriptors.iter().find(|d| *d.image_name() == wanted))
    }

    pub fn into_descriptors(self) -> Vec<ImageDescriptor> {
        self.descriptors
    }
}

fn join_error(e: tokio::task::JoinError) -> ImageError {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    ImageError::Config(format!("Dockerfile task did not complete: {}", e))
}
