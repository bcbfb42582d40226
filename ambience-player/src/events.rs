//! Controller status events
//!
//! Broadcast to any number of subscribers (UI status line, diagnostics,
//! tests). `PlaybackFailed` is the only user-facing failure signal.

use crate::ladder::LoadAttempt;
use crate::player::DeliveryHost;
use crate::recovery::RecoveryAction;
use serde::Serialize;

/// Buffer size of the event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Coarse controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Nothing pending; the player (if any) runs on its own
    #[default]
    Idle,
    /// A request is queued until the player signals readiness
    AwaitingSession,
    /// Load issued, waiting for audible playback
    Loading,
    /// Fading out before a content change
    Fading,
    /// Recovery gave up on the current request
    Error,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::AwaitingSession => "awaiting_session",
            ControllerState::Loading => "loading",
            ControllerState::Fading => "fading",
            ControllerState::Error => "error",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    StateChanged {
        old: ControllerState,
        new: ControllerState,
    },
    LoadIssued(LoadAttempt),
    RecoveryScheduled(RecoveryAction),
    SessionRebuilt {
        host: DeliveryHost,
    },
    /// The player never signalled readiness within the configured timeout
    SessionStalled,
    PlaybackFailed {
        message: String,
    },
}
