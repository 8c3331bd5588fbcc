//! Local image presence.
//!
//! The harness builds a fixture image only when it is not already around.
//! [`CacheOracle`] answers that question through a [`PresenceProbe`]. The
//! answer is a hint: probes never pull or build, and any probe failure is
//! reported as "not cached" instead of an error.

mod docker;
mod index;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imagesmith_core::config::{ProbeConfig, ProbeKind};
use imagesmith_core::error::Result;

use crate::descriptor::ImageDescriptor;
use crate::oci::ImageReference;

pub use docker::DockerCliProbe;
pub use index::{IndexedImage, LocalIndexProbe};

/// Read-only check for a locally available image.
#[async_trait]
pub trait PresenceProbe: Send + Sync {
    /// Whether `reference` can be used without pulling or building.
    async fn is_present(&self, reference: &ImageReference) -> Result<bool>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Probe that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCached;

#[async_trait]
impl PresenceProbe for NeverCached {
    async fn is_present(&self, _reference: &ImageReference) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Build-vs-pull hint for descriptors.
#[derive(Clone)]
pub struct CacheOracle {
    probe: Arc<dyn PresenceProbe>,
    timeout: Option<Duration>,
}

impl CacheOracle {
    pub fn new<P: PresenceProbe + 'static>(probe: P) -> Self {
        Self {
            probe: Arc::new(probe),
            timeout: None,
        }
    }

    /// Oracle for the configured probe, bounded by its timeout.
    pub fn from_config(config: &ProbeConfig) -> Self {
        let oracle = match config.kind {
            ProbeKind::Docker => Self::new(DockerCliProbe::new(&config.docker_bin)),
            ProbeKind::Index => match &config.index_dir {
                Some(dir) => Self::new(LocalIndexProbe::new(dir)),
                None => {
                    tracing::warn!("Index probe selected without an index directory; nothing will be reported as cached");
                    Self::new(NeverCached)
                }
            },
            ProbeKind::None => Self::new(NeverCached),
        };
        oracle.with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Give up on a probe call after `timeout` and report "not cached".
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the descriptor's image is already available locally.
    pub async fn is_cached(&self, descriptor: &ImageDescriptor) -> bool {
        self.is_reference_cached(descriptor.image_name()).await
    }

    /// Whether `reference` is already available locally.
    pub async fn is_reference_cached(&self, reference: &ImageReference) -> bool {
        let probe = self.probe.is_present(reference);
        let outcome = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, probe).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        reference = %reference,
                        probe = self.probe.name(),
                        timeout = ?timeout,
                        "Presence probe timed out"
                    );
                    return false;
                }
            },
            None => probe.await,
        };

        match outcome {
            Ok(true) => {
                tracing::info!(reference = %reference, probe = self.probe.name(), "Found image locally");
                true
            }
            Ok(false) => {
                tracing::info!(reference = %reference, probe = self.probe.name(), "Did not find image locally");
                false
            }
            Err(e) => {
                tracing::warn!(
                    reference = %reference,
                    probe = self.probe.name(),
                    error = %e,
                    "Presence probe failed, assuming image is not cached"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for CacheOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOracle")
            .field("probe", &self.probe.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagesmith_core::error::ImageError;
    use std::collections::HashSet;

    struct FixedProbe(HashSet<String>);

    #[async_trait]
    impl PresenceProbe for FixedProbe {
        async fn is_present(&self, reference: &ImageReference) -> Result<bool> {
            Ok(self.0.contains(&reference.canonical_name()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl PresenceProbe for FailingProbe {
        async fn is_present(&self, _reference: &ImageReference) -> Result<bool> {
            Err(ImageError::Probe("daemon unreachable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowProbe;

    #[async_trait]
    impl PresenceProbe for SlowProbe {
        async fn is_present(&self, _reference: &ImageReference) -> Result<bool> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(true)
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn reference(s: &str) -> ImageReference {
        ImageReference::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_reports_present_image() {
        let oracle = CacheOracle::new(FixedProbe(HashSet::from(["localhost/a:1".to_string()])));
        assert!(oracle.is_reference_cached(&reference("localhost/a:1")).await);
        assert!(!oracle.is_reference_cached(&reference("localhost/b:1")).await);
    }

    #[tokio::test]
    async fn test_probe_error_is_not_fatal() {
        let oracle = CacheOracle::new(FailingProbe);
        assert!(!oracle.is_reference_cached(&reference("a:1")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_not_cached() {
        let oracle = CacheOracle::new(SlowProbe).with_timeout(Duration::from_millis(50));
        assert!(!oracle.is_reference_cached(&reference("a:1")).await);
    }

    #[tokio::test]
    async fn test_never_cached() {
        let oracle = CacheOracle::from_config(&ProbeConfig {
            kind: ProbeKind::None,
            ..ProbeConfig::default()
        });
        assert!(!oracle.is_reference_cached(&reference("a:1")).await);
    }

    #[tokio::test]
    async fn test_index_without_directory_falls_back() {
        let oracle = CacheOracle::from_config(&ProbeConfig {
            kind: ProbeKind::Index,
            index_dir: None,
            ..ProbeConfig::default()
        });
        assert!(format!("{:?}", oracle).contains("none"));
    }
}
