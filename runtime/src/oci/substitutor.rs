//! Image name substitution.
//!
//! A substitutor rewrites a bare `repository:tag` reference so that pulls
//! and cache lookups go to an internal registry instead of a public one.
//! Exactly one rule is active per process. Call sites receive it as a
//! [`Substitution`] handle; [`install`] and [`global`] expose the same
//! handle process-wide for callers that cannot thread it through.

use std::sync::{Arc, OnceLock};

use imagesmith_core::config::{ImagesmithConfig, SubstitutionConfig};
use imagesmith_core::error::{ImageError, Result};

use super::reference::ImageReference;

/// A rule that rewrites image references.
pub trait ImageNameSubstitutor: Send + Sync {
    /// Rewrite `original`.
    fn apply(&self, original: &ImageReference) -> Result<ImageReference>;

    /// Human-readable description used in logs.
    fn description(&self) -> String;
}

/// Redirects bare references to an internal registry under a fixed
/// repository namespace.
///
/// `postgres:17` becomes `<registry>/<prefix>postgres:17`. References whose
/// repository already starts with the prefix only gain the registry.
/// References that already name a registry are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalRegistrySubstitutor {
    registry: String,
    repository_prefix: String,
}

impl InternalRegistrySubstitutor {
    pub fn new(config: &SubstitutionConfig) -> Self {
        Self {
            registry: config.registry.clone(),
            repository_prefix: config.repository_prefix.clone(),
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository_prefix(&self) -> &str {
        &self.repository_prefix
    }
}

impl ImageNameSubstitutor for InternalRegistrySubstitutor {
    fn apply(&self, original: &ImageReference) -> Result<ImageReference> {
        if let Some(registry) = original.registry().filter(|r| !r.is_empty()) {
            return Err(ImageError::Config(format!(
                "image {} with the registry {} cannot be substituted with registry {}",
                original, registry, self.registry
            )));
        }

        let substituted = if original.repository().starts_with(&self.repository_prefix) {
            original.with_registry(&self.registry)
        } else {
            original
                .with_repository(&format!("{}{}", self.repository_prefix, original.repository()))?
                .with_registry(&self.registry)
        };

        tracing::debug!(
            original = %original,
            substituted = %substituted,
            "Substituted image name"
        );
        Ok(substituted)
    }

    fn description(&self) -> String {
        format!("internal-registry substitutor with registry {}", self.registry)
    }
}

/// Leaves every reference unchanged. For harnesses without a mirror.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSubstitutor;

impl ImageNameSubstitutor for NoopSubstitutor {
    fn apply(&self, original: &ImageReference) -> Result<ImageReference> {
        Ok(original.clone())
    }

    fn description(&self) -> String {
        "no-op substitutor".to_string()
    }
}

/// Shared handle to the active substitution rule.
#[derive(Clone)]
pub struct Substitution {
    inner: Arc<dyn ImageNameSubstitutor>,
}

impl Substitution {
    pub fn new<S: ImageNameSubstitutor + 'static>(substitutor: S) -> Self {
        Self {
            inner: Arc::new(substitutor),
        }
    }

    /// The internal-registry rule configured from `config`.
    pub fn from_config(config: &SubstitutionConfig) -> Self {
        Self::new(InternalRegistrySubstitutor::new(config))
    }

    pub fn apply(&self, original: &ImageReference) -> Result<ImageReference> {
        self.inner.apply(original)
    }

    pub fn description(&self) -> String {
        self.inner.description()
    }

    /// Whether two handles share the same rule instance.
    pub fn same_instance(&self, other: &Substitution) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Substitution")
            .field("rule", &self.inner.description())
            .finish()
    }
}

static GLOBAL: OnceLock<Substitution> = OnceLock::new();

/// Install the process-wide rule.
///
/// The first install wins. Installing again with the same handle is a
/// no-op; installing a different rule afterwards is a configuration error.
pub fn install(substitution: Substitution) -> Result<Substitution> {
    let mut first = false;
    let active = GLOBAL.get_or_init(|| {
        first = true;
        substitution.clone()
    });
    if !active.same_instance(&substitution) {
        return Err(ImageError::Config(format!(
            "an image name substitutor is already active ({}); cannot install {}",
            active.description(),
            substitution.description()
        )));
    }
    if first {
        tracing::info!(rule = %active.description(), "Installed image name substitutor");
    } else {
        tracing::debug!(rule = %active.description(), "Image name substitutor already installed");
    }
    Ok(active.clone())
}

/// The process-wide rule.
///
/// If nothing was installed, the internal-registry rule is built from the
/// environment on first use. Racing first callers all observe one instance.
pub fn global() -> Substitution {
    GLOBAL
        .get_or_init(|| rule_from_env(|key| std::env::var(key).ok()))
        .clone()
}

/// Internal-registry rule from environment overrides. Overrides that fail
/// validation are ignored in favour of the defaults.
fn rule_from_env<F>(lookup: F) -> Substitution
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ImagesmithConfig::default();
    config.apply_env(lookup);
    match config.validate() {
        Ok(()) => Substitution::from_config(&config.substitution),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring invalid substitution overrides from the environment");
            Substitution::from_config(&SubstitutionConfig::default())
        }
    }
}
