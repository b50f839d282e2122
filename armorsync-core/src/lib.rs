//! armorsync core library: configuration, preflight checks, profile discovery.
//!
//! Public API surface:
//! - [`config`]: [`Config`], environment / YAML loading, [`preflight`]
//! - [`profiles`]: discovery of readable profile files in a directory
//! - [`types`]: newtypes shared by the other crates
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod profiles;
pub mod types;

pub use config::{preflight, Config, LinkStrategy, Preflight};
pub use error::ConfigError;
pub use profiles::list_profiles;
pub use types::ProfileName;
