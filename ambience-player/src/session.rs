//! Player session
//!
//! Owns the single external player handle. The handle is created lazily on
//! the first load attempt and rebuilt only when error recovery asks for it;
//! nothing else in the crate creates or destroys players.

use crate::controller::ControllerMessage;
use crate::player::{
    DeliveryHost, InitialContent, PlayerCallbacks, PlayerError, PlayerFactory, PlayerHandle,
    PlayerOptions, SessionId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Fixed creation parameters shared by every handle of a session
#[derive(Debug, Clone)]
pub struct SessionTemplate {
    pub container: String,
    pub origin: Option<String>,
}

pub struct PlayerSession {
    handle: Option<Box<dyn PlayerHandle>>,
    id: SessionId,
    next_id: u64,
    ready: bool,
    seeded: bool,
    host: DeliveryHost,
    current_volume: u8,
    target_volume: u8,
    consecutive_errors: u32,
    template: SessionTemplate,
}

impl PlayerSession {
    pub fn new(template: SessionTemplate, initial_volume: u8) -> Self {
        Self {
            handle: None,
            id: SessionId(0),
            next_id: 1,
            ready: false,
            seeded: false,
            host: DeliveryHost::Standard,
            current_volume: initial_volume,
            target_volume: initial_volume,
            consecutive_errors: 0,
            template,
        }
    }

    /// Create the player handle unless one exists
    ///
    /// Returns `Ok(true)` when a new handle was created.
    pub fn ensure(
        &mut self,
        factory: &mut dyn PlayerFactory,
        tx: &mpsc::UnboundedSender<ControllerMessage>,
    ) -> Result<bool, PlayerError> {
        if self.handle.is_some() {
            return Ok(false);
        }
        self.create(factory, tx, None)?;
        Ok(true)
    }

    /// Destroy the current handle and create a new one
    ///
    /// Switching to the privacy-restricted host is permanent; passing
    /// `switch_host = false` keeps whichever host is active.
    pub fn rebuild(
        &mut self,
        factory: &mut dyn PlayerFactory,
        tx: &mpsc::UnboundedSender<ControllerMessage>,
        seed: Option<InitialContent>,
        switch_host: bool,
    ) -> Result<(), PlayerError> {
        self.destroy();
        if switch_host && self.host != DeliveryHost::PrivacyRestricted {
            warn!(
                from = %self.host,
                to = %DeliveryHost::PrivacyRestricted,
                "Switching player delivery host"
            );
            self.host = DeliveryHost::PrivacyRestricted;
        }
        self.create(factory, tx, seed)
    }

    fn create(
        &mut self,
        factory: &mut dyn PlayerFactory,
        tx: &mpsc::UnboundedSender<ControllerMessage>,
        seed: Option<InitialContent>,
    ) -> Result<(), PlayerError> {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let options = PlayerOptions::new(
            &self.template.container,
            self.host,
            self.template.origin.as_deref(),
        )
        .with_initial_content(seed);
        let seeded = options.initial_content.is_some();

        let callbacks = PlayerCallbacks::new(id, tx.clone());
        let handle = factory.create(options, callbacks)?;

        info!(session = %id, host = %self.host, seeded, "Player created");
        self.handle = Some(handle);
        self.id = id;
        self.ready = false;
        self.seeded = seeded;
        Ok(())
    }

    /// Tear down the handle; readiness is discarded
    pub fn destroy(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            debug!(session = %self.id, "Destroying player");
            handle.destroy();
        }
        self.ready = false;
        self.seeded = false;
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready && self.handle.is_some()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the handle was created with seeded content; cleared on read
    pub fn take_seeded(&mut self) -> bool {
        std::mem::take(&mut self.seeded)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.handle.is_some() && self.id == id
    }

    pub fn host(&self) -> DeliveryHost {
        self.host
    }

    pub fn player(&mut self) -> Option<&mut (dyn PlayerHandle + 'static)> {
        self.handle.as_deref_mut()
    }

    /// Player handle only once it has signalled readiness
    pub fn ready_player(&mut self) -> Option<&mut (dyn PlayerHandle + 'static)> {
        if self.ready {
            self.handle.as_deref_mut()
        } else {
            None
        }
    }

    pub fn current_volume(&self) -> u8 {
        self.current_volume
    }

    pub fn target_volume(&self) -> u8 {
        self.target_volume
    }

    pub fn set_target_volume(&mut self, volume: u8) {
        self.target_volume = volume.min(100);
    }

    /// Push a volume to the player and track it
    pub fn apply_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        if let Some(player) = self.handle.as_deref_mut() {
            player.set_volume(volume);
        }
        self.current_volume = volume;
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Count an error callback; returns the new count
    pub fn record_error(&mut self) -> u32 {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.consecutive_errors
    }

    pub fn reset_errors(&mut self) {
        if self.consecutive_errors > 0 {
            debug!(previous = self.consecutive_errors, "Resetting consecutive error count");
        }
        self.consecutive_errors = 0;
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
