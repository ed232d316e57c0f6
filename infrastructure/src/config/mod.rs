//! Configuration file loading for finqa
//!
//! Handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `FINQA_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./finqa.toml` or `./.finqa.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/finqa/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileConfig, FileLlmConfig, FileVectorConfig,
};
pub use loader::ConfigLoader;
