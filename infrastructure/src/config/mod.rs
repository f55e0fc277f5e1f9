//! Configuration file loading for shellpilot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SHELLPILOT_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./shellpilot.toml` or `./.shellpilot.toml`
//! 4. Global: `<config dir>/shellpilot/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileConfig, FileLoggingConfig, FileLspConfig,
    FileModelConfig, FileSafetyConfig, FileSessionConfig, FileToolsConfig,
};
pub use loader::ConfigLoader;
