//! Playback controller
//!
//! **Module Structure:**
//! - `core.rs`: Construction, clock, message dispatch, player lifecycle signals
//! - `loading.rs`: Request dispatch, fallback ladder execution, crossfades
//! - `errors.rs`: Error classification, scheduled recovery, telemetry
//! - `diagnostics.rs`: Status accessors and event subscription
//!
//! The controller is a synchronous state machine. It never blocks and never
//! sleeps: host commands and player signals arrive as [`ControllerMessage`]s,
//! and delayed work is queued on an internal timer queue that the owner
//! drains with [`PlaybackController::advance_to`]. The tokio driver in
//! [`crate::driver`] is one such owner; tests drive it by hand.

mod core;
mod diagnostics;
mod errors;
mod loading;

pub use self::core::PlaybackController;

use crate::player::{PlayerEvent, SessionId};
use crate::recovery::RecoveryAction;
use ambience_common::{RecommendationResult, SceneMeta};

/// Everything that reaches the controller from outside
#[derive(Debug)]
pub enum ControllerMessage {
    Command(HostCommand),
    /// Signal from the external player handle identified by `session`
    Player {
        session: SessionId,
        event: PlayerEvent,
    },
}

/// Commands issued by the host application
#[derive(Debug)]
pub enum HostCommand {
    PlayResult {
        result: Box<RecommendationResult>,
        meta: SceneMeta,
    },
    /// Play button; counts as a user gesture
    PressPlay,
    PressPause,
    SetVolume(u8),
    Shutdown,
}

/// Delayed work; each task re-checks that it is still current when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScheduledTask {
    /// Second play attempt after a load
    DelayedPlay { session: SessionId, generation: u64 },
    Recovery {
        id: u64,
        session: SessionId,
        generation: u64,
        action: RecoveryAction,
    },
    RampTick { ramp: u64 },
    ReadinessWatchdog { session: SessionId },
}
