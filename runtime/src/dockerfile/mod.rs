//! Convention-laid-out Dockerfiles.
//!
//! Fixture images live in a tree shaped like
//!
//! ```text
//! resources/
//! └── openliberty/testcontainers/   (repository segments)
//!     └── postgres-init/
//!         └── 17-alpine/            (version, becomes the tag)
//!             └── Dockerfile        (declares ARG BASE_IMAGE="...")
//! ```
//!
//! - [`walk`] finds the Dockerfiles under a root
//! - [`layout`] turns a Dockerfile path into `repository:version`
//! - [`scan`] reads the declared base image out of the file

pub mod layout;
pub mod scan;
pub mod walk;

pub use layout::DockerfileLayout;
pub use scan::{find_base_image, scan_base_image, BASE_IMAGE_PREFIX};
pub use walk::{discover, DOCKERFILE_SUFFIX};
