//! Presence probe backed by the container CLI.

use std::process::Stdio;

use async_trait::async_trait;
use imagesmith_core::error::{ImageError, Result};
use tokio::process::Command;

use super::PresenceProbe;
use crate::oci::ImageReference;

/// Asks the local daemon through `docker image inspect`.
///
/// Any daemon-compatible CLI works (`podman` for instance). The command
/// only inspects local images and never pulls.
#[derive(Debug, Clone)]
pub struct DockerCliProbe {
    binary: String,
}

impl DockerCliProbe {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for DockerCliProbe {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl PresenceProbe for DockerCliProbe {
    async fn is_present(&self, reference: &ImageReference) -> Result<bool> {
        let output = Command::new(&self.binary)
            .arg("image")
            .arg("inspect")
            .arg("--format")
            .arg("{{.Id}}")
            .arg(reference.canonical_name())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out probe must not leave the CLI running.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ImageError::Probe(format!(
                    "failed to run {}: {} (is it installed?)",
                    self.binary, e
                ))
            })?;

        if output.status.success() {
            tracing::debug!(
                reference = %reference,
                id = %String::from_utf8_lossy(&output.stdout).trim(),
                "Image inspect succeeded"
            );
            return Ok(true);
        }

        tracing::debug!(
            reference = %reference,
            status = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Image inspect failed"
        );
        Ok(false)
    }

    fn name(&self) -> &str {
        &self.binary
    }
}
