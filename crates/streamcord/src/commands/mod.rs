//! Command handlers.

pub mod config_cmd;
pub mod preview;
pub mod run;

use std::path::{Path, PathBuf};

use streamcord_config::{Config, config_path, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config`, `STREAMCORD_CONFIG`, or the
/// platform default.
pub fn effective_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the layered configuration, naming the file on failure.
pub fn load(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = effective_path(global);
    let config = load_config(global.config.as_deref()).map_err(|e| CliError::config(e, &path))?;
    Ok((config, path))
}

pub(crate) fn config_err(path: &Path) -> impl Fn(streamcord_config::ConfigError) -> CliError + '_ {
    move |e| CliError::config(e, path)
}
