//! Image references and registry substitution.
//!
//! - [`reference`]: the `[registry/]repository:tag` value type
//! - [`substitutor`]: rules that redirect bare references to an internal registry

pub mod reference;
pub mod substitutor;

pub use reference::{ImageReference, DEFAULT_TAG};
pub use substitutor::{
    global, install, ImageNameSubstitutor, InternalRegistrySubstitutor, NoopSubstitutor,
    Substitution,
};
