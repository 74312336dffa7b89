// src/core/config_loader.rs

use crate::{
    constants::ENV_PREFIX,
    core::paths::{self, PathError},
    state::OutputModes,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// The deserialized structure of `ascend.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub options: OptionsConfig,
}

/// One layer of runtime options. `None` means "not set at this layer".
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsConfig {
    pub backend: Option<bool>,
    pub quiet: Option<bool>,
    pub pipe: Option<bool>,
    pub root: Option<String>,
    pub site: Option<String>,
    pub user: Option<String>,
}

impl OptionsConfig {
    /// Overlays `higher` on top of `self`; values set in `higher` win.
    pub fn merge(self, higher: Self) -> Self {
        Self {
            backend: higher.backend.or(self.backend),
            quiet: higher.quiet.or(self.quiet),
            pipe: higher.pipe.or(self.pipe),
            root: higher.root.or(self.root),
            site: higher.site.or(self.site),
            user: higher.user.or(self.user),
        }
    }
}

/// The fully layered configuration a run starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub modes: OutputModes,
    pub root: Option<PathBuf>,
    pub site: Option<String>,
    pub user: Option<String>,
}

impl From<OptionsConfig> for RuntimeConfig {
    fn from(options: OptionsConfig) -> Self {
        Self {
            modes: OutputModes {
                backend: options.backend.unwrap_or(false),
                quiet: options.quiet.unwrap_or(false),
                pipe: options.pipe.unwrap_or(false),
            },
            root: options
                .root
                .map(|root| PathBuf::from(shellexpand::tilde(&root).into_owned())),
            site: options.site,
            user: options.user,
        }
    }
}

/// Reads a config file. A missing file is an empty configuration.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No config file at '{}'.", path.display());
            return Ok(ConfigFile::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Builds the environment layer from `ASCEND_*` variables.
pub fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> OptionsConfig {
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());
    let flag = |name: &str| var(name).map(|v| parse_flag(&v));

    OptionsConfig {
        backend: flag("BACKEND"),
        quiet: flag("QUIET"),
        pipe: flag("PIPE"),
        root: var("ROOT"),
        site: var("SITE"),
        user: var("USER"),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Layers defaults, the config file, the environment and the command line.
pub fn resolve_layers(file: ConfigFile, env: OptionsConfig, cli: OptionsConfig) -> RuntimeConfig {
    file.options.merge(env).merge(cli).into()
}

/// Loads the runtime configuration from the standard config file location and
/// the process environment, with `cli` on top.
pub fn load_runtime_config(cli: OptionsConfig) -> Result<RuntimeConfig, ConfigError> {
    let file = match paths::get_runtime_config_path() {
        Ok(path) => load_config_file(&path)?,
        Err(e) => {
            log::debug!("{}; using defaults.", e);
            ConfigFile::default()
        }
    };
    Ok(resolve_layers(
        file,
        env_layer(|name| std::env::var(name).ok()),
        cli,
    ))
}
