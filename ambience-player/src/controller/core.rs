//! Controller lifecycle and signal dispatch

use super::{ControllerMessage, HostCommand, ScheduledTask};
use crate::config::ControllerConfig;
use crate::crossfade::CrossfadeScheduler;
use crate::events::{ControllerEvent, ControllerState, EVENT_CHANNEL_CAPACITY};
use crate::gesture::GestureGate;
use crate::ladder::{LoadAttempt, LoadHistory};
use crate::player::{PlayerEvent, PlayerFactory, PlayerState, SessionId};
use crate::recovery::RecoveryPolicy;
use crate::request::PlaybackRequest;
use crate::session::{PlayerSession, SessionTemplate};
use crate::telemetry::{ReportTransport, TelemetryReporter};
use crate::timer::TimerQueue;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Adaptive playback controller
///
/// Owns the player session and every piece of playback state. All methods
/// take `&mut self`; callers serialize access (see [`crate::driver`]).
pub struct PlaybackController {
    pub(super) config: ControllerConfig,
    pub(super) factory: Box<dyn PlayerFactory>,
    pub(super) session: PlayerSession,
    pub(super) gesture: GestureGate,
    pub(super) crossfade: CrossfadeScheduler,
    pub(super) telemetry: TelemetryReporter,
    pub(super) policy: RecoveryPolicy,
    pub(super) timers: TimerQueue<ScheduledTask>,

    /// Cloned into every player's callbacks
    pub(super) message_tx: mpsc::UnboundedSender<ControllerMessage>,
    pub(super) event_tx: broadcast::Sender<ControllerEvent>,

    pub(super) state: ControllerState,
    /// Controller clock; only moves forward
    pub(super) now: Duration,
    /// Bumped by every accepted `play_result`
    pub(super) generation: u64,

    /// Single slot for the newest request waiting on player readiness
    pub(super) queued_request: Option<PlaybackRequest>,
    /// Retry context for the error classifier
    pub(super) last_attempted: Option<PlaybackRequest>,
    /// Newest request as normalized, before any list trimming
    pub(super) last_result: Option<PlaybackRequest>,
    /// Request loaded once the running fade-out reaches zero
    pub(super) pending_load: Option<PlaybackRequest>,

    /// Id of the one recovery allowed to run; later errors wait for it
    pub(super) pending_recovery: Option<u64>,
    pub(super) next_recovery_id: u64,

    pub(super) history: LoadHistory,
    pub(super) hard_rebuild_used: bool,
    pub(super) gave_up: bool,
    pub(super) stall_recovered: bool,
}

impl PlaybackController {
    /// Create a controller and the receiving end of its message channel
    ///
    /// No player is created until the first request arrives.
    pub fn new(
        config: ControllerConfig,
        factory: Box<dyn PlayerFactory>,
        transport: Box<dyn ReportTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerMessage>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        debug!(
            curve = %config.defaults.fade_curve,
            volume = config.defaults.volume,
            "Creating playback controller"
        );

        let template = SessionTemplate {
            container: config.player.container.clone(),
            origin: config.secure_origin().map(str::to_string),
        };

        let controller = Self {
            session: PlayerSession::new(template, config.defaults.volume),
            crossfade: CrossfadeScheduler::new(config.defaults.fade_curve),
            telemetry: TelemetryReporter::new(&config.telemetry, transport),
            policy: RecoveryPolicy::from(&config.recovery),
            config,
            factory,
            gesture: GestureGate::new(),
            timers: TimerQueue::new(),
            message_tx,
            event_tx,
            state: ControllerState::Idle,
            now: Duration::ZERO,
            generation: 0,
            queued_request: None,
            last_attempted: None,
            last_result: None,
            pending_load: None,
            pending_recovery: None,
            next_recovery_id: 1,
            history: LoadHistory::default(),
            hard_rebuild_used: false,
            gave_up: false,
            stall_recovered: false,
        };
        (controller, message_rx)
    }

    /// Sender accepted by [`handle`](Self::handle)'s message loop
    pub fn sender(&self) -> mpsc::UnboundedSender<ControllerMessage> {
        self.message_tx.clone()
    }

    /// Process one message
    pub fn handle(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Command(command) => self.handle_command(command),
            ControllerMessage::Player { session, event } => self.on_player_event(session, event),
        }
    }

    fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::PlayResult { result, meta } => {
                if let Err(e) = self.play_result(&result, &meta) {
                    warn!(scene = %result.scene, "Ignoring recommendation: {}", e);
                }
            }
            HostCommand::PressPlay => self.press_play(),
            HostCommand::PressPause => self.press_pause(),
            HostCommand::SetVolume(volume) => self.set_volume(volume),
            HostCommand::Shutdown => self.shutdown(),
        }
    }

    /// Move the clock to `now` and run every task due by then, in order
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((due, task)) = self.timers.pop_due(now) {
            if due > self.now {
                self.now = due;
            }
            self.run_task(task);
        }
        if now > self.now {
            self.now = now;
        }
    }

    /// Earliest pending task, on the controller clock
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Current controller clock
    pub fn now(&self) -> Duration {
        self.now
    }

    fn run_task(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::DelayedPlay { session, generation } => {
                self.delayed_play(session, generation)
            }
            ScheduledTask::Recovery {
                id,
                session,
                generation,
                action,
            } => self.run_recovery(id, session, generation, action),
            ScheduledTask::RampTick { ramp } => self.ramp_tick(ramp),
            ScheduledTask::ReadinessWatchdog { session } => self.readiness_watchdog(session),
        }
    }

    /// Play button: unlock the gesture gate and start or resume playback
    ///
    /// With an empty player playlist the queued request is resumed, or else
    /// the newest result is replayed.
    pub fn press_play(&mut self) {
        self.gesture.unlock();

        if !self.session.has_handle() {
            let resume = self
                .queued_request
                .take()
                .or_else(|| self.last_result.clone());
            if let Some(request) = resume {
                self.queue_request(request);
            }
            return;
        }

        let playlist_empty = match self.session.ready_player() {
            Some(player) => {
                player.unmute();
                player.playlist().is_empty()
            }
            None => {
                debug!("Play pressed before player ready, queued request starts on ready");
                return;
            }
        };

        if playlist_empty {
            let resume = self
                .queued_request
                .take()
                .or_else(|| self.last_result.clone());
            if let Some(request) = resume {
                info!(query = %request.raw_query, "Resuming playback after user gesture");
                self.run_ladder(request);
            }
        } else if let Some(player) = self.session.ready_player() {
            if let Err(e) = player.play() {
                warn!("Play failed after user gesture: {}", e);
            }
        }

        if !self.crossfade.is_fading() {
            let target = self.session.target_volume();
            self.session.apply_volume(target);
        }
    }

    pub fn press_pause(&mut self) {
        if let Some(player) = self.session.ready_player() {
            player.pause();
        }
    }

    /// Apply a volume immediately, without a crossfade
    ///
    /// During a fade-out only the target changes; the following fade-in
    /// ramps to it.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.session.set_target_volume(volume);

        if self.crossfade.is_fading() {
            debug!(volume, "Volume change deferred until fade-out completes");
            return;
        }
        if self.crossfade.cancel_fade_in() {
            debug!("Fade-in cancelled by direct volume change");
        }
        self.session.apply_volume(volume);
    }

    /// Destroy the player; pending tasks become no-ops
    pub fn shutdown(&mut self) {
        info!("Playback controller shutting down");
        self.session.destroy();
        self.queued_request = None;
        self.pending_load = None;
        self.pending_recovery = None;
        self.set_state(ControllerState::Idle);
    }

    pub(super) fn on_player_event(&mut self, session: SessionId, event: PlayerEvent) {
        if !self.session.is_current(session) {
            debug!(%session, ?event, "Ignoring signal from replaced player");
            return;
        }

        match event {
            PlayerEvent::Ready => self.on_ready(),
            PlayerEvent::StateChange(state) => self.on_state_change(state),
            PlayerEvent::Error(code) => self.on_player_error(code),
        }
    }

    fn on_ready(&mut self) {
        info!(session = %self.session.id(), host = %self.session.host(), "Player ready");
        self.session.mark_ready();
        self.stall_recovered = false;

        let target = self.session.target_volume();
        self.session.apply_volume(target);
        self.session.reset_errors();

        let seeded = self.session.take_seeded();
        if let Some(request) = self.queued_request.take() {
            debug!(query = %request.raw_query, "Loading queued request");
            self.run_ladder(request);
        } else if seeded {
            self.start_seeded_content();
        } else {
            self.set_state(ControllerState::Idle);
        }
    }

    fn on_state_change(&mut self, state: PlayerState) {
        debug!(%state, "Player state changed");

        match state {
            PlayerState::Playing => {
                self.session.reset_errors();
                self.hard_rebuild_used = false;
                self.gave_up = false;
                if matches!(
                    self.state,
                    ControllerState::Loading | ControllerState::AwaitingSession | ControllerState::Error
                ) {
                    self.set_state(ControllerState::Idle);
                }
            }
            PlayerState::Cued => {
                if !self.gesture.is_unlocked() {
                    debug!("Content cued, waiting for user gesture");
                    return;
                }
                if let Some(player) = self.session.ready_player() {
                    if let Err(e) = player.play() {
                        debug!("Play after cue failed: {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    /// Create the player if none exists
    pub(super) fn ensure_session(&mut self) {
        match self.session.ensure(self.factory.as_mut(), &self.message_tx) {
            Ok(true) => {
                self.pending_recovery = None;
                self.schedule_watchdog();
            }
            Ok(false) => {}
            Err(e) => {
                error!("Failed to create player: {}", e);
                self.fail(format!("Music player unavailable: {}", e));
            }
        }
    }

    pub(super) fn schedule_watchdog(&mut self) {
        if let Some(timeout) = self.config.readiness_timeout() {
            let session = self.session.id();
            self.timers
                .schedule(self.now + timeout, ScheduledTask::ReadinessWatchdog { session });
        }
    }

    /// Fires when the player has not signalled readiness in time
    ///
    /// Recreates the player once on the same host; afterwards the request
    /// stays queued until readiness arrives.
    fn readiness_watchdog(&mut self, session: SessionId) {
        if !self.session.is_current(session) || self.session.is_ready() {
            return;
        }

        warn!(%session, "Player did not signal readiness in time");
        self.emit(ControllerEvent::SessionStalled);

        if self.stall_recovered {
            return;
        }
        self.stall_recovered = true;

        if self.queued_request.is_none() {
            self.queued_request = self.last_attempted.clone();
        }
        match self
            .session
            .rebuild(self.factory.as_mut(), &self.message_tx, None, false)
        {
            Ok(()) => {
                self.pending_recovery = None;
                self.emit(ControllerEvent::SessionRebuilt {
                    host: self.session.host(),
                });
                self.schedule_watchdog();
            }
            Err(e) => {
                error!("Failed to recreate stalled player: {}", e);
                self.fail(format!("Music player unavailable: {}", e));
            }
        }
    }

    pub(super) fn record_attempt(&mut self, attempt: LoadAttempt) {
        self.history.push(attempt.clone());
        self.emit(ControllerEvent::LoadIssued(attempt));
    }

    pub(super) fn set_state(&mut self, new: ControllerState) {
        if self.state == new {
            return;
        }
        let old = std::mem::replace(&mut self.state, new);
        debug!(%old, %new, "Controller state changed");
        self.emit(ControllerEvent::StateChanged { old, new });
    }

    /// Terminal failure for the current request
    pub(super) fn fail(&mut self, message: String) {
        self.set_state(ControllerState::Error);
        self.emit(ControllerEvent::PlaybackFailed { message });
    }

    pub(super) fn emit(&self, event: ControllerEvent) {
        // Ignore send errors (no subscribers is OK)
        let _ = self.event_tx.send(event);
    }
}
