//! Configuration file discovery and TOML loading
//!
//! Every ambience crate reads its settings from a single optional TOML file.
//! A missing or unreadable file is never fatal: callers fall back to built-in
//! defaults and a warning is logged.
//!
//! Resolution priority:
//! 1. Explicit path (command-line argument)
//! 2. Environment variable (`AMBIENCE_CONFIG` unless overridden)
//! 3. User config directory (`<config_dir>/ambience/config.toml`)
//! 4. None (built-in defaults)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "AMBIENCE_CONFIG";

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "ambience";

/// File name inside the config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Locates the TOML config file for a module
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    module_name: String,
    env_var: String,
}

impl ConfigResolver {
    /// Create a resolver for the named module using `AMBIENCE_CONFIG`
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            env_var: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Use a different environment variable for priority 2
    pub fn with_env_var(mut self, env_var: &str) -> Self {
        self.env_var = env_var.to_string();
        self
    }

    /// Resolve the config file path, or `None` when only defaults apply
    ///
    /// Explicit and environment paths are returned even if they do not exist,
    /// so the caller can report the missing file. The user config directory
    /// is only returned when the file is present.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            debug!(module = %self.module_name, path = %path.display(), "Config from command line");
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.trim().is_empty() {
                debug!(module = %self.module_name, env = %self.env_var, "Config from environment");
                return Some(PathBuf::from(path));
            }
        }

        let user_config = default_config_path()?;
        if user_config.exists() {
            debug!(module = %self.module_name, path = %user_config.display(), "Config from user config dir");
            Some(user_config)
        } else {
            None
        }
    }
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Load a TOML file if a path is given, falling back to `T::default()`
///
/// Missing files and parse failures are logged at WARN and never abort startup.
pub fn load_or_default<T>(path: Option<&Path>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return T::default();
    };

    match load_toml(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Using built-in defaults, config not loaded: {}", e);
            T::default()
        }
    }
}
