//! Configuration file loading and validation

#[expect(clippy::module_inception, reason = "the module and its main type share a name")]
mod config;

pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
