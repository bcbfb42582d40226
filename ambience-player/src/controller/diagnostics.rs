//! Status accessors and event subscription

use super::PlaybackController;
use crate::events::{ControllerEvent, ControllerState};
use crate::ladder::LoadHistory;
use crate::player::DeliveryHost;
use crate::request::PlaybackRequest;
use tokio::sync::broadcast;

impl PlaybackController {
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Subscribe to status events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ControllerEvent> {
        self.event_tx.clone()
    }

    pub fn is_fading(&self) -> bool {
        self.crossfade.is_fading()
    }

    pub fn gesture_unlocked(&self) -> bool {
        self.gesture.is_unlocked()
    }

    pub fn is_session_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn delivery_host(&self) -> DeliveryHost {
        self.session.host()
    }

    pub fn queued_request(&self) -> Option<&PlaybackRequest> {
        self.queued_request.as_ref()
    }

    /// Retry context the error classifier works from
    pub fn last_attempted(&self) -> Option<&PlaybackRequest> {
        self.last_attempted.as_ref()
    }

    pub fn load_history(&self) -> &LoadHistory {
        &self.history
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.session.consecutive_errors()
    }

    /// Volume most recently pushed to the player
    pub fn current_volume(&self) -> u8 {
        self.session.current_volume()
    }

    pub fn target_volume(&self) -> u8 {
        self.session.target_volume()
    }

    /// Number of scheduled tasks, including ones that will turn out stale
    pub fn pending_tasks(&self) -> usize {
        self.timers.len()
    }
}
