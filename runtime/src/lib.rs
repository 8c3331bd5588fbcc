//! Imagesmith Runtime - fixture image derivation engine.
//!
//! Turns a tree of convention-laid-out Dockerfiles into image descriptors
//! before any container is started:
//!
//! ```text
//! discover(root) ──► DockerfileLayout::parse ──► repository:version ──┐
//!        │                                                            ├─► Substitution ─► ImageDescriptor
//!        └────────► scan_base_image ──────► ARG BASE_IMAGE="..." ─────┘                        │
//!                                                                                               ▼
//!                                                                     CacheOracle::is_cached, sort
//! ```
//!
//! Nothing here builds, pulls or runs images. The engine decides which
//! reference to use and whether it already looks available locally.

pub mod cache;
pub mod catalog;
pub mod descriptor;
pub mod dockerfile;
pub mod oci;

// Re-export common types
pub use cache::{CacheOracle, DockerCliProbe, LocalIndexProbe, NeverCached, PresenceProbe};
pub use catalog::Catalog;
pub use descriptor::ImageDescriptor;
pub use dockerfile::{discover, find_base_image, scan_base_image, DockerfileLayout};
pub use oci::{
    ImageNameSubstitutor, ImageReference, InternalRegistrySubstitutor, NoopSubstitutor,
    Substitution,
};

/// Imagesmith Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
