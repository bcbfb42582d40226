//! Test helper modules for ambience-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockFactory / MockPlayer: scripted external player with a command log
//! - RecordingTransport: captures telemetry bodies
//! - Harness: drives a controller synchronously on a virtual clock

#![allow(dead_code)]

pub mod harness;
pub mod mock_player;
pub mod recording_transport;

pub use harness::{search, with_volume, Harness};
pub use mock_player::{Command, MockFactory, MockPlayerState};
pub use recording_transport::RecordingTransport;
