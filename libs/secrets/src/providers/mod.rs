//! Secrets provider implementations

mod env;
mod gcp_secret_manager;

pub use env::EnvProvider;
pub use gcp_secret_manager::{sanitize_secret_id, GcpSecretManager};
