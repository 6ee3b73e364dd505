//! MPRKit Settings Crate
//!
//! Handles post-processor options: defaults, the argument string accepted
//! from hosts, validation and TOML/JSON configuration files.

pub mod config;
pub mod error;

pub use config::{default_config_path, AxisSigns, PostOptions, DEFAULT_TOOL};
pub use error::{ConfigError, SettingsError, SettingsResult};
