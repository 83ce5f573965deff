//! # Configuration
//!
//! - `controller`: Controller settings file, defaults and validation
//! - `vault`: Vault connection and authentication settings

pub mod controller;
pub mod vault;

pub use controller::{ConfigError, ControllerConfig};
pub use vault::{AuthMethod, VaultAuthConfig, VaultConfig};
