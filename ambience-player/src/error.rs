//! Error types for ambience-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Errors raised by the external player surface are absorbed by the controller
//! and only reach callers from construction-time operations.

use crate::player::PlayerError;
use thiserror::Error;

/// Main error type for ambience-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// External player errors
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Telemetry delivery errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Recommendation carried nothing that can be played
    #[error("Empty request: no video ids, playlist id or query")]
    EmptyRequest,

    /// Errors from shared helpers
    #[error(transparent)]
    Common(#[from] ambience_common::Error),
}

/// Convenience Result type using ambience-player Error
pub type Result<T> = std::result::Result<T, Error>;
