#![warn(missing_docs, missing_debug_implementations)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", "README.md"))]

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod transformers;
pub mod types;
pub mod webhooks;
