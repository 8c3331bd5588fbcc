//! Image reference parsing.
//!
//! Parses references like `localhost/openliberty/testcontainers/postgres:17-alpine`
//! into structured components. Unlike a registry client, no registry is
//! invented when the reference does not name one: `postgres:17` stays bare.

use std::cmp::Ordering;

use imagesmith_core::config::validate_registry;
use imagesmith_core::error::{ImageError, Result};

/// Default tag when none is specified.
pub const DEFAULT_TAG: &str = "latest";

/// Longest tag accepted by registries.
const MAX_TAG_LEN: usize = 128;

/// Parsed image reference: `[registry/]repository:tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry hostname (e.g., "localhost", "mirror.example.com:5000")
    registry: Option<String>,
    /// Repository path (e.g., "postgres", "openliberty/testcontainers/postgres-init")
    repository: String,
    /// Tag (e.g., "17-alpine")
    tag: String,
}

impl ImageReference {
    /// Build a bare reference from already-split components.
    pub fn new(repository: &str, tag: &str) -> Result<Self> {
        validate_repository(repository)?;
        validate_tag(repository, tag)?;
        Ok(Self {
            registry: None,
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Parse an image reference string.
    ///
    /// Supports formats:
    /// - `postgres` → postgres:latest
    /// - `postgres:17-alpine` → postgres:17-alpine
    /// - `org/image:tag` → org/image:tag
    /// - `localhost/org/image:tag` → registry `localhost`
    /// - `mirror.io:5000/image:tag` → registry `mirror.io:5000`
    ///
    /// Digest references (`@sha256:...`) are rejected.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImageError::parse(reference, "empty image reference"));
        }
        if reference.contains('@') {
            return Err(ImageError::parse(
                reference,
                "digest references are not supported, use a tag",
            ));
        }

        // Split tag on the last colon after the last slash so that a
        // registry port is never mistaken for a tag.
        let last_segment_start = reference.rfind('/').map(|pos| pos + 1).unwrap_or(0);
        let (name, tag) = match reference[last_segment_start..].rfind(':') {
            Some(colon_pos) => {
                let split = last_segment_start + colon_pos;
                (&reference[..split], &reference[split + 1..])
            }
            None => (reference, DEFAULT_TAG),
        };

        let (registry, repository) = split_registry_repository(name);
        if let Some(registry) = registry {
            validate_registry(registry).map_err(|message| ImageError::parse(reference, message))?;
        }
        validate_repository(repository)
            .map_err(|_| ImageError::parse(reference, format!("invalid repository '{}'", repository)))?;
        validate_tag(reference, tag)?;

        Ok(ImageReference {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Registry host, if the reference names one.
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Repository path.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Copy of this reference qualified with `registry`.
    pub fn with_registry(&self, registry: &str) -> Self {
        Self {
            registry: Some(registry.to_string()),
            ..self.clone()
        }
    }

    /// Copy of this reference with a different repository.
    pub fn with_repository(&self, repository: &str) -> Result<Self> {
        validate_repository(repository)?;
        Ok(Self {
            repository: repository.to_string(),
            ..self.clone()
        })
    }

    /// `repository:tag` without the registry.
    pub fn unqualified(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Canonical `[registry/]repository:tag` string.
    pub fn canonical_name(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}:{}", registry, self.repository, self.tag),
            None => self.unqualified(),
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl std::str::FromStr for ImageReference {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for ImageReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical_name())
    }
}

impl PartialOrd for ImageReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_name().cmp(&other.canonical_name())
    }
}

/// Split a name into registry and repository components.
///
/// The first component is a registry only when it looks like a hostname
/// (contains a dot or colon, or is "localhost").
fn split_registry_repository(name: &str) -> (Option<&str>, &str) {
    if let Some(slash_pos) = name.find('/') {
        let first = &name[..slash_pos];
        if first.contains('.') || first.contains(':') || first == "localhost" {
            return (Some(first), &name[slash_pos + 1..]);
        }
    }
    (None, name)
}

fn validate_repository(repository: &str) -> Result<()> {
    if repository.is_empty() {
        return Err(ImageError::parse(repository, "empty repository"));
    }
    for segment in repository.split('/') {
        if segment.is_empty() {
            return Err(ImageError::parse(repository, "empty repository segment"));
        }
        let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        let valid = segment
            .chars()
            .all(|c| is_alnum(c) || matches!(c, '.' | '_' | '-'))
            && segment.starts_with(is_alnum)
            && segment.ends_with(is_alnum);
        if !valid {
            return Err(ImageError::parse(
                repository,
                format!(
                    "repository segment '{}' must be lowercase alphanumerics separated by '.', '_' or '-'",
                    segment
                ),
            ));
        }
    }
    Ok(())
}

fn validate_tag(subject: &str, tag: &str) -> Result<()> {
    if tag.is_empty() || tag.len() > MAX_TAG_LEN {
        return Err(ImageError::parse(
            subject,
            format!("tag must be 1 to {} characters", MAX_TAG_LEN),
        ));
    }
    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(ImageError::parse(subject, format!("tag '{}' must not start with '.' or '-'", tag)));
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ImageError::parse(subject, format!("invalid tag '{}'", tag)));
    }
    Ok(())
}
