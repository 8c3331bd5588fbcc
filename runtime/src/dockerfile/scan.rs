//! Base image declaration scanner.
//!
//! Fixture Dockerfiles declare their upstream image as a build argument so
//! the harness can pull it through the internal registry before building:
//!
//! ```dockerfile
//! ARG BASE_IMAGE="postgres:17-alpine"
//! FROM ${BASE_IMAGE}
//! ```

use std::path::Path;

use imagesmith_core::error::{ImageError, Result};

use crate::oci::ImageReference;

/// Exact line prefix of the base image declaration.
pub const BASE_IMAGE_PREFIX: &str = "ARG BASE_IMAGE=\"";

/// Read `path` and return its declared base image.
pub fn scan_base_image(path: &Path) -> Result<ImageReference> {
    let content = std::fs::read_to_string(path).map_err(|e| ImageError::io(path, e))?;
    find_base_image(&content).map_err(|e| match e {
        ImageError::Parse { message, .. } => ImageError::parse(path.display(), message),
        other => other,
    })
}

/// Find the first `ARG BASE_IMAGE="..."` line in `content` and parse its value.
pub fn find_base_image(content: &str) -> Result<ImageReference> {
    let line = content
        .lines()
        .find(|line| line.starts_with(BASE_IMAGE_PREFIX))
        .ok_or_else(|| {
            ImageError::parse(
                "Dockerfile",
                "missing BASE_IMAGE argument: the Dockerfile must declare \
                 ARG BASE_IMAGE=\"<image>\" so the base image can be substituted",
            )
        })?;

    let rest = &line[BASE_IMAGE_PREFIX.len()..];
    let closing = rest.rfind('"').ok_or_else(|| {
        ImageError::parse(
            "Dockerfile",
            format!("unterminated BASE_IMAGE argument: {}", line),
        )
    })?;

    let value = &rest[..closing];
    ImageReference::parse(value).map_err(|e| {
        ImageError::parse("Dockerfile", format!("invalid BASE_IMAGE value '{}': {}", value, e))
    })
}
