//! beacon-core — capability data model, canonical hashing, and configuration.
//! All other beacon crates depend on this one.

pub mod config;
pub mod hash;
pub mod info;

pub use hash::HashAlgorithm;
pub use info::{Feature, Field, Form, Identity, Info};
