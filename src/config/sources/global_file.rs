//! Global config file source: ~/.config/cockroachdb-mcp-client/config.yaml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{File, FileFormat};
use std::path::{Path, PathBuf};

/// Directory name under `~/.config`.
pub const CONFIG_DIR_NAME: &str = "cockroachdb-mcp-client";

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.yaml")
    })
}

/// Add a YAML config file source to the builder. A missing file adds nothing.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    config_path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        File::from(config_path.to_path_buf())
            .format(FileFormat::Yaml)
            .required(false),
    ))
}
