//! Synchronous controller harness with a virtual clock

use super::mock_player::{Command, MockFactory, SharedFactoryLog, SharedPlayerState};
use super::recording_transport::{RecordingTransport, SharedReports};
use ambience_common::{RecommendationResult, SceneMeta};
use ambience_player::{
    ControllerConfig, ControllerEvent, ControllerMessage, PlaybackController, PlayerCallbacks,
    PlayerErrorCode, PlayerState,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Route controller logs to the test writer; `RUST_LOG` selects the level
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub controller: PlaybackController,
    pub player: SharedPlayerState,
    pub factory: SharedFactoryLog,
    pub reports: SharedReports,
    rx: mpsc::UnboundedReceiver<ControllerMessage>,
    events: broadcast::Receiver<ControllerEvent>,
    now: Duration,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        init_test_logging();
        let factory = MockFactory::new();
        let player = factory.player.clone();
        let log = factory.log.clone();
        let transport = RecordingTransport::default();
        let reports = transport.reports.clone();

        let (controller, rx) =
            PlaybackController::new(config, Box::new(factory), Box::new(transport));
        let events = controller.subscribe();

        Self {
            controller,
            player,
            factory: log,
            reports,
            rx,
            events,
            now: Duration::ZERO,
        }
    }

    /// Deliver every pending message to the controller
    pub fn pump(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.controller.handle(message);
        }
    }

    /// Move the virtual clock forward and run due tasks
    pub fn advance(&mut self, millis: u64) {
        self.now += Duration::from_millis(millis);
        self.controller.advance_to(self.now);
        self.pump();
    }

    pub fn play(&mut self, result: RecommendationResult, meta: SceneMeta) {
        self.controller.play_result(&result, &meta).unwrap();
        self.pump();
    }

    /// Callbacks handed to the most recently created player
    pub fn callbacks(&self) -> PlayerCallbacks {
        let log = self.factory.lock().unwrap();
        log.created.last().expect("no player created").callbacks.clone()
    }

    pub fn players_created(&self) -> usize {
        self.factory.lock().unwrap().created.len()
    }

    pub fn signal_ready(&mut self) {
        self.callbacks().ready();
        self.pump();
    }

    /// Set the mock's state and report the transition
    pub fn signal_state(&mut self, state: PlayerState) {
        self.player.lock().unwrap().state = state;
        self.callbacks().state_changed(state);
        self.pump();
    }

    pub fn signal_error(&mut self, code: i32) {
        self.callbacks().error(PlayerErrorCode(code));
        self.pump();
    }

    /// Play a result and bring the player to readiness
    pub fn start(&mut self, result: RecommendationResult) {
        self.play(result, SceneMeta::default());
        self.signal_ready();
    }

    pub fn commands(&self) -> Vec<Command> {
        self.player.lock().unwrap().commands.clone()
    }

    pub fn clear_commands(&mut self) {
        self.player.lock().unwrap().commands.clear();
    }

    pub fn loads(&self) -> Vec<Command> {
        self.commands()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::LoadList(_) | Command::LoadPlaylist(_) | Command::LoadSearch(_)
                )
            })
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn reports(&self) -> Vec<serde_json::Value> {
        self.reports.lock().unwrap().clone()
    }
}

pub fn search(query: &str) -> RecommendationResult {
    RecommendationResult::from_query("fantasy", "exploration", query)
}

pub fn with_volume(volume: i32, crossfade: f64) -> SceneMeta {
    SceneMeta {
        volume: Some(volume),
        crossfade: Some(crossfade),
        cooldown_sec: None,
    }
}
