//! # Ambience Playback Controller Library (ambience-player)
//!
//! Drives an embedded third-party music player for tabletop ambience.
//!
//! **Purpose:** Turn scene recommendations into playback on a player the
//! controller does not own: pick one source from a fallback ladder, recover
//! from the player's unpredictable errors, crossfade between scenes, respect
//! platform autoplay rules, and report failures to a collector.
//!
//! **Architecture:** A synchronous state machine ([`PlaybackController`])
//! fed by messages and a timer queue, plus a tokio driver that owns it.
//! The external player is reached only through the traits in [`player`].

pub mod config;
pub mod controller;
pub mod crossfade;
pub mod driver;
pub mod error;
pub mod events;
pub mod gesture;
pub mod ladder;
pub mod player;
pub mod recovery;
pub mod request;
pub mod session;
pub mod telemetry;
pub mod timer;

pub use config::ControllerConfig;
pub use controller::{ControllerMessage, HostCommand, PlaybackController};
pub use driver::{spawn_controller, spawn_with_http_telemetry, ControllerHandle, TransportControls};
pub use error::{Error, Result};
pub use events::{ControllerEvent, ControllerState};
pub use player::{
    DeliveryHost, PlayerCallbacks, PlayerError, PlayerErrorCode, PlayerFactory, PlayerHandle,
    PlayerOptions, PlayerState,
};
pub use request::PlaybackRequest;
pub use telemetry::{HttpReportTransport, ReportTransport};
