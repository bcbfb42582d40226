//! Gesture gate
//!
//! Browsers refuse unmuted playback until the user has interacted with the
//! page. The gate records the first qualifying interaction and never locks
//! again for the lifetime of the controller.

use tracing::info;

#[derive(Debug, Default)]
pub struct GestureGate {
    unlocked: bool,
}

impl GestureGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Record a user activation; returns true only for the first one
    pub fn unlock(&mut self) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        info!("User gesture received, unmuted playback allowed");
        true
    }

    /// Whether a deferred play attempt may proceed
    ///
    /// Muted playback is always permitted by the platform.
    pub fn allows_play(&self, player_muted: bool) -> bool {
        self.unlocked || player_muted
    }
}
