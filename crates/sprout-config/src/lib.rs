//! Configuration parsing for Sprout
//!
//! This crate handles parsing and validation of sprout.toml, the built-in
//! release server configuration, and the environment and command line
//! overrides layered on top of either.

pub mod defaults;
pub mod file;
pub mod merge;

// Re-export main types
pub use defaults::builtin_config;
pub use file::{load_from_file, parse_sprout_toml, validate_config, PermissionsSection, SproutToml, TransportSection};
pub use merge::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource};

use sprout_core::error::SproutError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SproutError>;
