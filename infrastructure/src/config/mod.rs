//! Configuration file loading for tutormesh
//!
//! This module handles file I/O and merging of configuration from multiple
//! sources. The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./tutormesh.toml` or `./.tutormesh.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/tutormesh/config.toml`
//! 4. Fallback: `~/.config/tutormesh/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileAuditConfig, FileConfig, FileModelConfig,
    FileProviderConfig, FileRoutingConfig,
};
pub use loader::ConfigLoader;
