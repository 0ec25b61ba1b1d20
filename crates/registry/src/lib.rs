#![forbid(unsafe_code)]

pub mod config;
pub mod content;
pub mod error;
pub mod fingerprint;
pub mod models;
mod registry;

pub use config::Config;
pub use content::{ContentBackend, LocalContentBackend};
pub use error::RegistryError;
pub use models::*;
pub use registry::Registry;
