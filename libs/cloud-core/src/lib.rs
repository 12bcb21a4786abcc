//! # Cloud Core
//!
//! Building blocks shared by the secret and object storage providers:
//!
//! - [`Environment`]: where providers read their configuration from
//! - [`Registry`]: string-keyed factory registry used to pick a backend by id
//! - [`gcp`]: credentials, access tokens and error envelopes for Google APIs

mod environment;
mod error;
mod registry;

pub mod gcp;

pub use environment::{normalize_env_name, Environment};
pub use error::{AuthError, ConfigError, RegistryError};
pub use registry::Registry;
