//! Configuration for the playback controller
//!
//! Loaded from the `[player]`, `[timing]`, `[recovery]`, `[telemetry]` and
//! `[defaults]` tables of the ambience TOML file. Every field has a built-in
//! default so a missing or partial file is never fatal.
//!
//! # Settings Sources Priority
//!
//! 1. Explicit path passed by the host application
//! 2. `AMBIENCE_CONFIG` environment variable
//! 3. User config directory
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use ambience_common::config::{load_or_default, ConfigResolver};
use ambience_common::FadeCurve;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Complete controller configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub player: PlayerSettings,

    #[serde(default)]
    pub timing: TimingSettings,

    #[serde(default)]
    pub recovery: RecoverySettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,

    #[serde(default)]
    pub defaults: PlaybackDefaults,
}

/// Options used whenever the external player is created
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSettings {
    /// Host container the player is mounted into
    #[serde(default = "default_container")]
    pub container: String,

    /// Origin of the hosting page, sent as a hint only for `https://` pages
    #[serde(default)]
    pub page_origin: Option<String>,
}

/// Delays and durations, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSettings {
    /// Delay before any recovery action runs
    #[serde(default = "default_recovery_delay_ms")]
    pub recovery_delay_ms: u64,

    /// Delay of the second, gated play attempt after a load
    #[serde(default = "default_second_play_delay_ms")]
    pub second_play_delay_ms: u64,

    /// Volume ramp re-evaluation interval
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Lower bound for a fade-out before swapping content
    #[serde(default = "default_fade_out_min_ms")]
    pub fade_out_min_ms: u64,

    /// Lower bound for a fade-in after swapping content
    #[serde(default = "default_fade_in_min_ms")]
    pub fade_in_min_ms: u64,

    /// Optional stall watchdog on the player's ready signal (unset = wait forever)
    #[serde(default)]
    pub readiness_timeout_ms: Option<u64>,
}

/// Error budgets for the recovery policy
#[derive(Debug, Clone, Deserialize)]
pub struct RecoverySettings {
    /// Highest consecutive error count at which the request is re-issued
    #[serde(default = "default_retry_error_budget")]
    pub retry_error_budget: u32,

    /// Highest consecutive error count at which the controller skips ahead
    #[serde(default = "default_skip_error_budget")]
    pub skip_error_budget: u32,
}

/// Outbound failure reporting
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Collector endpoint receiving player error reports
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Identical reports inside this window are dropped
    #[serde(default = "default_dedupe_window_ms")]
    pub dedupe_window_ms: u64,

    /// Timeout for the fallback blocking request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Fallback values when scene metadata omits them
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackDefaults {
    #[serde(default = "default_volume")]
    pub volume: u8,

    #[serde(default = "default_crossfade_seconds")]
    pub crossfade_seconds: f64,

    #[serde(default)]
    pub fade_curve: FadeCurve,
}

fn default_container() -> String {
    "player".to_string()
}

fn default_recovery_delay_ms() -> u64 {
    400
}

fn default_second_play_delay_ms() -> u64 {
    600
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_fade_out_min_ms() -> u64 {
    150
}

fn default_fade_in_min_ms() -> u64 {
    200
}

fn default_retry_error_budget() -> u32 {
    4
}

fn default_skip_error_budget() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    format!(
        "http://127.0.0.1:8000{}",
        ambience_common::player_errors::PLAYER_ERRORS_PATH
    )
}

fn default_dedupe_window_ms() -> u64 {
    8_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_volume() -> u8 {
    70
}

fn default_crossfade_seconds() -> f64 {
    3.0
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            container: default_container(),
            page_origin: None,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            recovery_delay_ms: default_recovery_delay_ms(),
            second_play_delay_ms: default_second_play_delay_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            fade_out_min_ms: default_fade_out_min_ms(),
            fade_in_min_ms: default_fade_in_min_ms(),
            readiness_timeout_ms: None,
        }
    }
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            retry_error_budget: default_retry_error_budget(),
            skip_error_budget: default_skip_error_budget(),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            dedupe_window_ms: default_dedupe_window_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            crossfade_seconds: default_crossfade_seconds(),
            fade_curve: FadeCurve::default(),
        }
    }
}

impl ControllerConfig {
    /// Resolve and load the config file, falling back to defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = ConfigResolver::new("player").resolve(explicit_path);
        if let Some(path) = &path {
            info!("Loading controller config from {}", path.display());
        }
        let config: ControllerConfig = load_or_default(path.as_deref());
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ControllerConfig =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the controller cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.defaults.volume > 100 {
            return Err(Error::Config(format!(
                "defaults.volume must be 0-100, got {}",
                self.defaults.volume
            )));
        }
        if !self.defaults.crossfade_seconds.is_finite() || self.defaults.crossfade_seconds < 0.0 {
            return Err(Error::Config(
                "defaults.crossfade_seconds must be a non-negative number".to_string(),
            ));
        }
        if self.timing.frame_interval_ms == 0 {
            return Err(Error::Config("timing.frame_interval_ms must be > 0".to_string()));
        }
        if self.recovery.retry_error_budget > self.recovery.skip_error_budget {
            return Err(Error::Config(
                "recovery.retry_error_budget must not exceed skip_error_budget".to_string(),
            ));
        }
        Ok(())
    }

    /// Origin hint for the player, only when the page is served securely
    pub fn secure_origin(&self) -> Option<&str> {
        self.player
            .page_origin
            .as_deref()
            .filter(|origin| origin.starts_with("https://"))
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.timing.recovery_delay_ms)
    }

    pub fn second_play_delay(&self) -> Duration {
        Duration::from_millis(self.timing.second_play_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.timing.frame_interval_ms)
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.timing.readiness_timeout_ms.map(Duration::from_millis)
    }
}
