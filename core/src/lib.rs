//! Imagesmith Core - Foundational Types
//!
//! Error taxonomy and process configuration shared by the engine
//! (`imagesmith-runtime`) and the `imagesmith` command line.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{ImagesmithConfig, LogLevel, ProbeConfig, ProbeKind, SubstitutionConfig};
pub use error::{ImageError, Result};

/// Imagesmith version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
