//! Tokio runtime driver
//!
//! Runs one [`PlaybackController`] on a single task. Host commands, player
//! signals and timer expiries are all serialized through that task, so the
//! controller itself needs no locking.

use crate::config::ControllerConfig;
use crate::controller::{ControllerMessage, HostCommand, PlaybackController};
use crate::error::{Error, Result};
use crate::events::ControllerEvent;
use crate::player::PlayerFactory;
use crate::telemetry::{HttpReportTransport, ReportTransport};
use ambience_common::{RecommendationResult, SceneMeta};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Spawn a controller on the current tokio runtime
pub fn spawn_controller(
    config: ControllerConfig,
    factory: Box<dyn PlayerFactory>,
    transport: Box<dyn ReportTransport>,
) -> ControllerHandle {
    let (controller, rx) = PlaybackController::new(config, factory, transport);
    let tx = controller.sender();
    let events = controller.event_sender();
    let task = tokio::spawn(run(controller, rx));
    ControllerHandle { tx, events, task }
}

/// Spawn a controller that posts error reports to the configured collector
pub fn spawn_with_http_telemetry(
    config: ControllerConfig,
    factory: Box<dyn PlayerFactory>,
) -> Result<ControllerHandle> {
    let transport = HttpReportTransport::new(&config.telemetry)?;
    Ok(spawn_controller(config, factory, Box::new(transport)))
}

async fn run(
    mut controller: PlaybackController,
    mut rx: mpsc::UnboundedReceiver<ControllerMessage>,
) {
    let origin = Instant::now();
    info!("Playback controller started");

    loop {
        let deadline = controller.next_deadline().map(|due| origin + due);

        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    break;
                };
                controller.advance_to(origin.elapsed());

                let shutdown = matches!(message, ControllerMessage::Command(HostCommand::Shutdown));
                controller.handle(message);
                if shutdown {
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                controller.advance_to(origin.elapsed());
            }
        }
    }

    debug!("Playback controller task exiting");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Host-side handle to a running controller
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerMessage>,
    events: broadcast::Sender<ControllerEvent>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Play a recommendation with its scene metadata
    pub fn play_result(&self, result: RecommendationResult, meta: SceneMeta) -> Result<()> {
        send(
            &self.tx,
            HostCommand::PlayResult {
                result: Box::new(result),
                meta,
            },
        )
    }

    /// Set volume immediately, without a crossfade
    pub fn set_volume(&self, volume: u8) -> Result<()> {
        send(&self.tx, HostCommand::SetVolume(volume))
    }

    /// Controls to wire to the host's play button, pause button and volume slider
    pub fn register_controls(&self) -> TransportControls {
        TransportControls {
            tx: self.tx.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Destroy the player and wait for the controller task to finish
    pub async fn shutdown(self) -> Result<()> {
        send(&self.tx, HostCommand::Shutdown)?;
        self.task
            .await
            .map_err(|e| Error::InvalidState(format!("Controller task failed: {}", e)))
    }
}

/// User-facing transport controls
///
/// `press_play` is the user gesture that unlocks unmuted playback.
#[derive(Clone)]
pub struct TransportControls {
    tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl TransportControls {
    pub fn press_play(&self) -> Result<()> {
        send(&self.tx, HostCommand::PressPlay)
    }

    pub fn press_pause(&self) -> Result<()> {
        send(&self.tx, HostCommand::PressPause)
    }

    pub fn slide_volume(&self, volume: u8) -> Result<()> {
        send(&self.tx, HostCommand::SetVolume(volume))
    }
}

fn send(tx: &mpsc::UnboundedSender<ControllerMessage>, command: HostCommand) -> Result<()> {
    tx.send(ControllerMessage::Command(command))
        .map_err(|_| Error::InvalidState("Playback controller has stopped".to_string()))
}
