//! Imagesmith CLI - inspect fixture Dockerfiles and the images they map to.

pub mod commands;
pub mod output;
