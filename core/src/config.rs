use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ImageError, Result};

/// Environment variable naming the internal registry that substituted
/// images are redirected to.
pub const REGISTRY_ENV: &str = "DOCKER_REGISTRY_SERVER";

/// Environment variable overriding the repository namespace prefix.
pub const REPOSITORY_PREFIX_ENV: &str = "IMAGESMITH_REPOSITORY_PREFIX";

/// Registry used when `DOCKER_REGISTRY_SERVER` is unset. Keeps lookups
/// on the local daemon.
pub const DEFAULT_REGISTRY: &str = "localhost";

/// Namespace every substituted repository lives under.
pub const DEFAULT_REPOSITORY_PREFIX: &str = "openliberty/testcontainers/";

/// Process configuration, resolved once at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesmithConfig {
    /// Registry substitution rule
    pub substitution: SubstitutionConfig,

    /// Local presence probe
    pub probe: ProbeConfig,

    /// Log level
    pub log_level: LogLevel,
}

impl ImagesmithConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load a YAML config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| ImageError::io(path, e))?;
        let mut config: Self = serde_yaml::from_str(&data).map_err(|e| {
            ImageError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(registry) = lookup(REGISTRY_ENV).filter(|v| !v.trim().is_empty()) {
            self.substitution.registry = registry.trim().to_string();
        }
        if let Some(prefix) = lookup(REPOSITORY_PREFIX_ENV).filter(|v| !v.trim().is_empty()) {
            self.substitution.repository_prefix = prefix.trim().to_string();
        }
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let Err(message) = validate_registry(&self.substitution.registry) {
            return Err(ImageError::Config(format!(
                "substitution.registry '{}': {}",
                self.substitution.registry, message
            )));
        }
        if let Err(message) = validate_repository_prefix(&self.substitution.repository_prefix) {
            return Err(ImageError::Config(format!(
                "substitution.repository_prefix '{}' {}",
                self.substitution.repository_prefix, message
            )));
        }
        if self.probe.timeout_secs == 0 {
            return Err(ImageError::Config(
                "probe.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Registry substitution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionConfig {
    /// Registry host attached to every substituted reference
    pub registry: String,

    /// Repository namespace prefix, including the trailing `/`
    pub repository_prefix: String,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            repository_prefix: DEFAULT_REPOSITORY_PREFIX.to_string(),
        }
    }
}

/// Presence probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Which probe answers "is this image local?"
    pub kind: ProbeKind,

    /// Container CLI used by the docker probe
    pub docker_bin: String,

    /// Image index directory used by the index probe
    pub index_dir: Option<PathBuf>,

    /// Upper bound for a single probe call in seconds
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::Docker,
            docker_bin: "docker".to_string(),
            index_dir: None,
            timeout_secs: 30,
        }
    }
}

/// Presence probe backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    /// Ask the local container daemon via its CLI.
    #[default]
    Docker,
    /// Read an on-disk image index.
    Index,
    /// Never report anything as cached.
    None,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Index => write!(f, "index"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "docker" => Ok(Self::Docker),
            "index" => Ok(Self::Index),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "unknown probe: '{}' (supported: docker, index, none)",
                s
            )),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a registry component: a hostname or IPv4 address with an
/// optional `:port`.
pub fn validate_registry(registry: &str) -> std::result::Result<(), String> {
    if registry.is_empty() {
        return Err("registry must not be empty".to_string());
    }
    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };
    if let Some(port) = port {
        if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) || port.parse::<u16>().is_err() {
            return Err(format!("invalid port '{}'", port));
        }
    }
    if host.is_empty() {
        return Err("registry host must not be empty".to_string());
    }
    for label in host.split('.') {
        let valid = !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !valid {
            return Err(format!("'{}' is not a valid hostname", host));
        }
    }
    Ok(())
}

/// Check a repository namespace prefix: empty, or lowercase path segments
/// each followed by `/`.
fn validate_repository_prefix(prefix: &str) -> std::result::Result<(), String> {
    if prefix.is_empty() {
        return Ok(());
    }
    let Some(path) = prefix.strip_suffix('/') else {
        return Err("must end with '/'".to_string());
    };
    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    for segment in path.split('/') {
        let valid = !segment.is_empty()
            && segment.chars().all(|c| is_alnum(c) || matches!(c, '.' | '_' | '-'))
            && segment.starts_with(is_alnum)
            && segment.ends_with(is_alnum);
        if !valid {
            return Err(format!(
                "segment '{}' must be lowercase alphanumerics separated by '.', '_' or '-'",
                segment
            ));
        }
    }
    Ok(())
}
