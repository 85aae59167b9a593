#![warn(missing_docs, missing_debug_implementations)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", "README.md"))]

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod validator;

pub use self::{
    client::OpayoClient,
    config::{Environment, OpayoSettings},
};
