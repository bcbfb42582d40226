//! Player error handling: classification, scheduled recovery, telemetry

use super::{PlaybackController, ScheduledTask};
use crate::events::{ControllerEvent, ControllerState};
use crate::ladder::{degrade_manual_list, LoadAttempt, LoadCommand, ManualTrim};
use crate::player::{PlayerErrorCode, SessionId};
use crate::recovery::{ErrorContext, RecoveryAction};
use ambience_common::PlayerErrorReport;
use tracing::{debug, error, info, warn};

/// Playlist shape reported by the player when the error arrived
struct PlaylistSnapshot {
    length: usize,
    index: Option<usize>,
    current_item: Option<String>,
}

impl PlaybackController {
    pub(super) fn on_player_error(&mut self, code: PlayerErrorCode) {
        let consecutive = self.session.record_error();
        let snapshot = self.playlist_snapshot();

        warn!(
            %code,
            consecutive,
            video_id = snapshot.current_item.as_deref().unwrap_or("none"),
            playlist_length = snapshot.length,
            playlist_index = ?snapshot.index,
            "Player error"
        );

        let manual_list_active = self
            .last_attempted
            .as_ref()
            .map(|request| request.has_manual_list())
            .unwrap_or(false);
        let mut trim = None;

        if self.gave_up {
            debug!("Recovery already abandoned for this request");
        } else if self.pending_recovery.is_some() {
            debug!("Recovery already pending, it will act on current state");
        } else {
            let ctx = ErrorContext {
                code,
                host: self.session.host(),
                hard_rebuild_used: self.hard_rebuild_used,
                has_request: self.last_attempted.is_some(),
                manual_list_active,
                playlist_length: snapshot.length,
                playlist_index: snapshot.index,
                consecutive_errors: consecutive,
            };
            let action = self.policy.classify(&ctx);

            match action {
                RecoveryAction::GiveUp => self.give_up(code, consecutive),
                RecoveryAction::DegradeManualList => {
                    if let Some(request) = self.last_attempted.as_mut() {
                        let trimmed = degrade_manual_list(
                            request,
                            snapshot.current_item.as_deref(),
                            snapshot.index,
                        );
                        match trimmed.removed_id.as_deref() {
                            Some(removed) => info!(
                                removed,
                                remaining = trimmed.remaining_len,
                                "Removed failing item from explicit list"
                            ),
                            None => debug!(
                                remaining = trimmed.remaining_len,
                                "Failing item already gone from explicit list"
                            ),
                        }
                        trim = Some(trimmed);
                    }
                    self.schedule_recovery(action);
                }
                RecoveryAction::Rebuild { hard } => {
                    if hard {
                        self.hard_rebuild_used = true;
                    }
                    self.schedule_recovery(action);
                }
                RecoveryAction::RetryRequest | RecoveryAction::SkipToNext => {
                    self.schedule_recovery(action)
                }
            }
        }

        self.report_error(code, &snapshot, consecutive, manual_list_active, trim);
    }

    fn playlist_snapshot(&mut self) -> PlaylistSnapshot {
        match self.session.player() {
            Some(player) => PlaylistSnapshot {
                length: player.playlist().len(),
                index: player.playlist_index(),
                current_item: player.current_item(),
            },
            None => PlaylistSnapshot {
                length: 0,
                index: None,
                current_item: None,
            },
        }
    }

    fn schedule_recovery(&mut self, action: RecoveryAction) {
        info!(%action, delay_ms = self.config.timing.recovery_delay_ms, "Recovery scheduled");
        let id = self.next_recovery_id;
        self.next_recovery_id += 1;
        self.pending_recovery = Some(id);

        let due = self.now + self.config.recovery_delay();
        self.timers.schedule(
            due,
            ScheduledTask::Recovery {
                id,
                session: self.session.id(),
                generation: self.generation,
                action,
            },
        );
        self.emit(ControllerEvent::RecoveryScheduled(action));
    }

    fn give_up(&mut self, code: PlayerErrorCode, consecutive: u32) {
        self.gave_up = true;
        error!(%code, consecutive, "Playback recovery exhausted, giving up");
        self.fail(
            "Unable to play music for this scene. Try another scene or press play.".to_string(),
        );
    }

    /// Execute a scheduled recovery against the state current at this moment
    pub(super) fn run_recovery(
        &mut self,
        id: u64,
        session: SessionId,
        generation: u64,
        action: RecoveryAction,
    ) {
        if self.pending_recovery != Some(id) {
            debug!(%action, "Skipping superseded recovery");
            return;
        }
        self.pending_recovery = None;

        if generation != self.generation || !self.session.is_current(session) {
            debug!(%action, "Skipping superseded recovery");
            return;
        }

        match action {
            RecoveryAction::Rebuild { hard } => self.rebuild_session(hard),
            RecoveryAction::DegradeManualList | RecoveryAction::RetryRequest => {
                if let Some(request) = self.last_attempted.clone() {
                    self.run_ladder(request);
                }
            }
            RecoveryAction::SkipToNext => {
                let unlocked = self.gesture.is_unlocked();
                if let Some(player) = self.session.ready_player() {
                    player.next();
                    if unlocked {
                        if let Err(e) = player.play() {
                            debug!("Play after skip failed: {}", e);
                        }
                    }
                }
            }
            RecoveryAction::GiveUp => {}
        }
    }

    /// Recreate the player on the privacy-restricted host, seeded with content
    ///
    /// A soft rebuild seeds the last attempted request; a hard rebuild seeds
    /// the request as originally normalized.
    fn rebuild_session(&mut self, hard: bool) {
        let source = if hard {
            self.last_result.clone()
        } else {
            self.last_attempted.clone()
        };
        let Some(request) = source else {
            return;
        };

        let command = LoadCommand::for_request(&request);
        let attempt = LoadAttempt::new(&command, &request, true);
        warn!(hard, rung = %command.rung(), "Rebuilding player session");

        match self.session.rebuild(
            self.factory.as_mut(),
            &self.message_tx,
            Some(command.into_initial_content()),
            true,
        ) {
            Ok(()) => {
                self.record_attempt(attempt);
                self.last_attempted = Some(request);
                self.emit(ControllerEvent::SessionRebuilt {
                    host: self.session.host(),
                });
                self.set_state(ControllerState::AwaitingSession);
                self.schedule_watchdog();
            }
            Err(e) => {
                error!("Failed to rebuild player: {}", e);
                self.fail(format!("Music player unavailable: {}", e));
            }
        }
    }

    fn report_error(
        &mut self,
        code: PlayerErrorCode,
        snapshot: &PlaylistSnapshot,
        consecutive: u32,
        manual_list_active: bool,
        trim: Option<ManualTrim>,
    ) {
        let mut report = PlayerErrorReport::new(code.0);
        report.video_id = snapshot.current_item.clone();
        report.playlist_index = snapshot.index.map(|index| index as i64);
        report.playlist_length = Some(snapshot.length as u64);
        report.consecutive_errors = Some(consecutive);
        report.manual_list_active = Some(manual_list_active);
        report.reported_at = Some(ambience_common::time::now());

        let mut query = String::new();
        if let Some(request) = &self.last_attempted {
            report.request = Some(request.to_reported());
            report.last_query = Some(request.raw_query.clone());
            report.manual_list_initial_length = Some(request.manual_initial_len as u64);
            report.manual_list_remaining_length = Some(request.manual_video_ids.len() as u64);
            query = request.search_query.clone();
        }

        let removed = trim.and_then(|trim| trim.removed_id);
        report.manual_list_was_trimmed = Some(removed.is_some());
        report.removed_manual_video_id = removed;

        let outcome = self.telemetry.report(&report, &query, self.now);
        debug!(?outcome, "Player error report processed");
    }
}
