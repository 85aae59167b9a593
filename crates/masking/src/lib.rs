#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", "README.md"))]

mod abs;
mod secret;
mod serde;
mod strategy;

pub use crate::{
    abs::{ExposeInterface, ExposeOptionInterface, PeekInterface},
    secret::Secret,
    serde::{Deserialize, SerializableSecret, Serialize},
    strategy::{Strategy, WithType, WithoutType},
};

/// Interface traits, importable in one line.
///
/// `use masking::prelude::*;`
pub mod prelude {
    pub use super::{ExposeInterface, ExposeOptionInterface, PeekInterface};
}
