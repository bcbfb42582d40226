//! Request dispatch, fallback ladder execution and crossfades

use super::{PlaybackController, ScheduledTask};
use crate::crossfade::{fade_in_duration, fade_out_duration, RampPurpose};
use crate::error::Result;
use crate::events::ControllerState;
use crate::ladder::{LadderRung, LoadAttempt, LoadCommand};
use crate::player::SessionId;
use crate::request::PlaybackRequest;
use ambience_common::{RecommendationResult, SceneMeta};
use std::time::Duration;
use tracing::{debug, info, warn};

impl PlaybackController {
    /// Accept a recommendation and start playing it
    ///
    /// Supersedes any earlier request, including one still waiting for the
    /// player. Returns `Error::EmptyRequest` if the result carries nothing
    /// playable; every other failure is handled internally.
    pub fn play_result(&mut self, result: &RecommendationResult, meta: &SceneMeta) -> Result<()> {
        let request = PlaybackRequest::from_result(result, meta, &self.config.defaults)?;

        self.generation += 1;
        self.hard_rebuild_used = false;
        self.gave_up = false;
        self.stall_recovered = false;
        self.pending_recovery = None;

        info!(
            scene = %result.scene,
            genre = %result.genre,
            query = %request.raw_query,
            manual_items = request.manual_video_ids.len(),
            playlist = request.playlist_id.is_some(),
            volume = request.desired_volume,
            crossfade = request.crossfade_seconds,
            "Playback requested"
        );

        self.last_result = Some(request.clone());
        self.session.set_target_volume(request.desired_volume);

        if !self.session.is_ready() {
            self.queue_request(request);
            return Ok(());
        }

        self.dispatch(request);
        Ok(())
    }

    /// Hold `request` until the player signals readiness
    pub(super) fn queue_request(&mut self, request: PlaybackRequest) {
        if let Some(previous) = self.queued_request.replace(request) {
            debug!(query = %previous.raw_query, "Superseding queued request");
        }
        self.set_state(ControllerState::AwaitingSession);
        self.ensure_session();
    }

    /// Load into a ready player, fading out first if something is audible
    fn dispatch(&mut self, request: PlaybackRequest) {
        if self.crossfade.is_fading() {
            debug!("Fade-out already running, loading newest request immediately");
            self.run_ladder(request);
            return;
        }

        let audible = self
            .session
            .player()
            .map(|player| player.state().is_audible())
            .unwrap_or(false);

        if audible && self.gesture.is_unlocked() {
            let duration = fade_out_duration(
                request.crossfade_seconds,
                Duration::from_millis(self.config.timing.fade_out_min_ms),
            );
            let from = self.session.current_volume();
            debug!(from, duration_ms = duration.as_millis() as u64, "Fading out before load");

            self.pending_load = Some(request);
            let ramp = self.crossfade.start(
                from,
                0,
                duration,
                self.now,
                RampPurpose::FadeOut {
                    generation: self.generation,
                },
            );
            self.set_state(ControllerState::Fading);
            self.ramp_tick(ramp);
            return;
        }

        self.run_ladder(request);
        if self.crossfade.cancel_fade_in() {
            debug!("Fade-in toward previous target cancelled by direct load");
        }
        let target = self.session.target_volume();
        self.session.apply_volume(target);
    }

    /// Issue exactly one load command for `request`
    ///
    /// Records the request as the retry context, attempts an immediate play
    /// and schedules a second, gated one.
    pub(super) fn run_ladder(&mut self, request: PlaybackRequest) {
        let command = LoadCommand::for_request(&request);
        if command.rung() == LadderRung::Search && request.search_differs() {
            info!(
                raw = %request.raw_query,
                sanitized = %request.search_query,
                "Search text sanitized for player"
            );
        }

        let locked = !self.gesture.is_unlocked();
        let Some(player) = self.session.ready_player() else {
            self.queue_request(request);
            return;
        };

        if locked {
            player.mute();
        }
        if let Err(e) = command.issue(player) {
            warn!(rung = %command.rung(), "Player rejected load: {}", e);
        }
        if let Err(e) = player.play() {
            debug!("Immediate play not permitted: {}", e);
        }

        info!(rung = %command.rung(), issued = %command.describe(), muted = locked, "Load issued");
        self.record_attempt(LoadAttempt::new(&command, &request, false));
        self.last_attempted = Some(request);
        self.set_state(ControllerState::Loading);
        self.schedule_delayed_play();
    }

    /// Start playback of content seeded into a rebuilt player
    pub(super) fn start_seeded_content(&mut self) {
        let locked = !self.gesture.is_unlocked();
        if let Some(player) = self.session.ready_player() {
            if locked {
                player.mute();
            }
            if let Err(e) = player.play() {
                debug!("Immediate play not permitted: {}", e);
            }
        }
        self.set_state(ControllerState::Loading);
        self.schedule_delayed_play();
    }

    fn schedule_delayed_play(&mut self) {
        let due = self.now + self.config.second_play_delay();
        self.timers.schedule(
            due,
            ScheduledTask::DelayedPlay {
                session: self.session.id(),
                generation: self.generation,
            },
        );
    }

    pub(super) fn delayed_play(&mut self, session: SessionId, generation: u64) {
        if !self.session.is_current(session) || generation != self.generation {
            return;
        }
        let Some(player) = self.session.ready_player() else {
            return;
        };

        if !self.gesture.allows_play(player.is_muted()) {
            debug!("Deferred play skipped until user gesture");
            return;
        }
        if let Err(e) = player.play() {
            debug!("Deferred play failed: {}", e);
        }
    }

    pub(super) fn ramp_tick(&mut self, ramp: u64) {
        let Some(step) = self.crossfade.tick(ramp, self.now) else {
            return;
        };
        self.session.apply_volume(step.volume);

        if !step.finished {
            let due = self.now + self.config.frame_interval();
            self.timers.schedule(due, ScheduledTask::RampTick { ramp });
            return;
        }

        if let RampPurpose::FadeOut { generation } = step.purpose {
            self.complete_fade_out(generation);
        }
    }

    /// Fade-out reached zero: load, then ramp up to the newest target
    fn complete_fade_out(&mut self, generation: u64) {
        match self.pending_load.take() {
            Some(request) if generation == self.generation => self.run_ladder(request),
            _ => debug!("Newer request already loaded, skipping superseded load"),
        }

        let crossfade_seconds = self
            .last_result
            .as_ref()
            .map(|request| request.crossfade_seconds)
            .unwrap_or(self.config.defaults.crossfade_seconds);
        let duration = fade_in_duration(
            crossfade_seconds,
            Duration::from_millis(self.config.timing.fade_in_min_ms),
        );
        let target = self.session.target_volume();
        debug!(target, duration_ms = duration.as_millis() as u64, "Fading in after load");

        let ramp = self.crossfade.start(
            self.session.current_volume(),
            target,
            duration,
            self.now,
            RampPurpose::FadeIn,
        );
        self.ramp_tick(ramp);
    }
}
