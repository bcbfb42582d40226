//! External player port
//!
//! The controller drives a third-party embedded player it does not control.
//! This module describes that surface as traits so the host environment can
//! plug in the real player (or a scripted one in tests):
//!
//! - [`PlayerFactory`] creates a handle from [`PlayerOptions`]
//! - [`PlayerHandle`] exposes load/transport/volume commands and state queries
//! - [`PlayerCallbacks`] is handed to the factory and must be used to deliver
//!   the ready, state-change and error signals back to the controller
//!
//! Every handle is tagged with a [`SessionId`]. Signals from a destroyed
//! handle carry its old id and are dropped by the controller.

use crate::controller::ControllerMessage;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by the external player surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Platform refused to start audible playback without a user gesture
    #[error("autoplay blocked by platform policy")]
    AutoplayBlocked,

    /// Command issued before the player signalled readiness
    #[error("player not ready")]
    NotReady,

    /// Player rejected the command
    #[error("command rejected: {0}")]
    Rejected(String),

    /// Player could not be created
    #[error("player creation failed: {0}")]
    Creation(String),
}

/// Player states reported through the state-change callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    /// Map the platform's numeric state codes
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }

    /// Whether sound is (or is about to be) coming out of the player
    pub fn is_audible(&self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlayerState::Unstarted => "unstarted",
            PlayerState::Ended => "ended",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Cued => "cued",
        };
        write!(f, "{}", name)
    }
}

/// Numeric error code from the player's error callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlayerErrorCode(pub i32);

impl PlayerErrorCode {
    /// Request contained an invalid parameter (rejected load parameters)
    pub const INVALID_PARAMETER: PlayerErrorCode = PlayerErrorCode(2);
    /// Content cannot be played in the HTML5 player
    pub const HTML5_ERROR: PlayerErrorCode = PlayerErrorCode(5);
    /// Item removed or marked private
    pub const NOT_FOUND: PlayerErrorCode = PlayerErrorCode(100);
    /// Owner does not allow embedded playback
    pub const EMBED_FORBIDDEN: PlayerErrorCode = PlayerErrorCode(101);
    /// Same as `EMBED_FORBIDDEN`, reported under a different code
    pub const EMBED_FORBIDDEN_ALT: PlayerErrorCode = PlayerErrorCode(150);

    pub fn is_invalid_parameter(&self) -> bool {
        *self == Self::INVALID_PARAMETER
    }
}

impl std::fmt::Display for PlayerErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host the embedded player is delivered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryHost {
    Standard,
    PrivacyRestricted,
}

impl std::fmt::Display for DeliveryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryHost::Standard => write!(f, "standard"),
            DeliveryHost::PrivacyRestricted => write!(f, "privacy-restricted"),
        }
    }
}

/// Content a freshly created player starts loading on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialContent {
    List(Vec<String>),
    Playlist(String),
    Search(String),
}

/// Fixed creation parameters for the external player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    /// Host container the player mounts into
    pub container: String,
    pub host: DeliveryHost,
    /// Page origin hint; `None` when the page is not served securely
    pub origin: Option<String>,
    pub inline_playback: bool,
    pub show_controls: bool,
    pub js_bridge: bool,
    /// Seeded content after a rebuild
    pub initial_content: Option<InitialContent>,
}

impl PlayerOptions {
    pub fn new(container: &str, host: DeliveryHost, origin: Option<&str>) -> Self {
        Self {
            container: container.to_string(),
            host,
            origin: origin.map(str::to_string),
            inline_playback: true,
            show_controls: false,
            js_bridge: true,
            initial_content: None,
        }
    }

    pub fn with_initial_content(mut self, content: Option<InitialContent>) -> Self {
        self.initial_content = content;
        self
    }
}

/// Identity of one created player handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Signals the external player delivers to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready,
    StateChange(PlayerState),
    Error(PlayerErrorCode),
}

/// Callback bundle bound to one player handle
///
/// Sends never block; if the controller has stopped the signal is dropped.
#[derive(Debug, Clone)]
pub struct PlayerCallbacks {
    session: SessionId,
    tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl PlayerCallbacks {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<ControllerMessage>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn ready(&self) {
        self.emit(PlayerEvent::Ready);
    }

    pub fn state_changed(&self, state: PlayerState) {
        self.emit(PlayerEvent::StateChange(state));
    }

    pub fn error(&self, code: PlayerErrorCode) {
        self.emit(PlayerEvent::Error(code));
    }

    fn emit(&self, event: PlayerEvent) {
        // Ignore send errors (controller stopped is OK)
        let _ = self.tx.send(ControllerMessage::Player {
            session: self.session,
            event,
        });
    }
}

/// Commands and queries on one external player instance
///
/// Load commands start at the given index. `play` may fail under autoplay
/// restrictions; callers treat that as expected.
pub trait PlayerHandle: Send {
    fn load_explicit_list(&mut self, ids: &[String], start_index: usize) -> Result<(), PlayerError>;
    fn load_named_playlist(&mut self, playlist_id: &str, start_index: usize) -> Result<(), PlayerError>;
    fn load_search(&mut self, query: &str, start_index: usize) -> Result<(), PlayerError>;

    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);
    /// Advance to the next playlist position
    fn next(&mut self);

    fn mute(&mut self);
    fn unmute(&mut self);
    fn is_muted(&self) -> bool;
    fn set_volume(&mut self, volume: u8);

    fn state(&self) -> PlayerState;
    fn playlist(&self) -> Vec<String>;
    fn playlist_index(&self) -> Option<usize>;
    fn current_item(&self) -> Option<String>;

    fn destroy(&mut self);
}

/// Creates external player handles
pub trait PlayerFactory: Send {
    /// Create a player; the implementation registers `callbacks` exactly once
    fn create(
        &mut self,
        options: PlayerOptions,
        callbacks: PlayerCallbacks,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError>;
}
