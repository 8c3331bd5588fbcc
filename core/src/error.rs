use std::path::PathBuf;

use thiserror::Error;

/// Imagesmith error types
#[derive(Error, Debug)]
pub enum ImageError {
    /// A file or directory could not be read
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input does not follow the expected structure (path layout,
    /// Dockerfile content, image reference syntax)
    #[error("Parse error in '{subject}': {message}")]
    Parse { subject: String, message: String },

    /// Configuration or invariant violation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A presence probe could not answer
    #[error("Probe error: {0}")]
    Probe(String),
}

impl ImageError {
    /// Build an `Io` error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a `Parse` error for `subject`.
    pub fn parse(subject: impl std::fmt::Display, message: impl Into<String>) -> Self {
        ImageError::Parse {
            subject: subject.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for imagesmith operations
pub type Result<T> = std::result::Result<T, ImageError>;
