//! Collector settings
//!
//! Read from the `[collector]` table of the shared ambience TOML file.
//! Command-line flags (and their environment fallbacks) override the file.

use ambience_common::config::{load_or_default, ConfigResolver};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    collector: CollectorConfig,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl CollectorConfig {
    /// Resolve the config file and read the `[collector]` table
    pub fn load(explicit_path: Option<&Path>) -> Self {
        let path = ConfigResolver::new("collector").resolve(explicit_path);
        load_or_default::<ConfigFile>(path.as_deref()).collector
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, bind: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
