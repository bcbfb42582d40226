//! Crossfade scheduler
//!
//! Moves the audible volume toward a target over a duration. At most one
//! ramp is active; starting a new ramp replaces the old one, which then sees
//! its remaining ticks as stale. The controller owns the clock and calls
//! [`CrossfadeScheduler::tick`] once per frame interval.
//!
//! # Content change sequence
//!
//! ```text
//! volume
//!   V ──┐                       ┌── target
//!       │ fade-out              │ fade-in
//!       │ max(min, s × 500ms)   │ max(min, s × 1000ms)
//!   0   └──────── load ─────────┘
//! ```
//!
//! The `fading` flag is set for the whole fade-out and cleared when it
//! reaches zero, before the fade-in starts.

use ambience_common::FadeCurve;
use std::time::Duration;

/// Fade-out length for a content change
pub fn fade_out_duration(crossfade_seconds: f64, minimum: Duration) -> Duration {
    scaled(crossfade_seconds, 500.0).max(minimum)
}

/// Fade-in length after a content change
pub fn fade_in_duration(crossfade_seconds: f64, minimum: Duration) -> Duration {
    scaled(crossfade_seconds, 1000.0).max(minimum)
}

fn scaled(seconds: f64, millis_per_second: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds * millis_per_second / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Why a ramp is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPurpose {
    /// Silence before a load; carries the request generation that started it
    FadeOut { generation: u64 },
    /// Restore volume after a load
    FadeIn,
}

#[derive(Debug, Clone)]
struct VolumeRamp {
    id: u64,
    from: u8,
    to: u8,
    started_at: Duration,
    duration: Duration,
    purpose: RampPurpose,
}

impl VolumeRamp {
    fn position(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }
}

/// Result of evaluating the active ramp at one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampStep {
    pub volume: u8,
    pub finished: bool,
    pub purpose: RampPurpose,
}

#[derive(Debug)]
pub struct CrossfadeScheduler {
    active: Option<VolumeRamp>,
    next_id: u64,
    fading: bool,
    curve: FadeCurve,
}

impl CrossfadeScheduler {
    pub fn new(curve: FadeCurve) -> Self {
        Self {
            active: None,
            next_id: 1,
            fading: false,
            curve,
        }
    }

    /// Start a ramp from `from` to `to`, replacing any active one
    ///
    /// Returns the ramp id the caller schedules ticks for.
    pub fn start(
        &mut self,
        from: u8,
        to: u8,
        duration: Duration,
        now: Duration,
        purpose: RampPurpose,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.fading = matches!(purpose, RampPurpose::FadeOut { .. });
        self.active = Some(VolumeRamp {
            id,
            from: from.min(100),
            to: to.min(100),
            started_at: now,
            duration,
            purpose,
        });
        id
    }

    /// Evaluate ramp `id` at `now`
    ///
    /// Returns `None` when `id` is no longer the active ramp. The ramp is
    /// retired on its final step; a finished fade-out also clears `fading`.
    pub fn tick(&mut self, id: u64, now: Duration) -> Option<RampStep> {
        let ramp = self.active.as_ref().filter(|ramp| ramp.id == id)?;

        let position = ramp.position(now);
        let finished = position >= 1.0;
        let step = RampStep {
            volume: if finished {
                ramp.to
            } else {
                self.curve.interpolate(ramp.from, ramp.to, position)
            },
            finished,
            purpose: ramp.purpose,
        };

        if finished {
            self.active = None;
            if matches!(step.purpose, RampPurpose::FadeOut { .. }) {
                self.fading = false;
            }
        }
        Some(step)
    }

    /// A fade-out toward a content change is in progress
    pub fn is_fading(&self) -> bool {
        self.fading
    }

    /// Drop an active fade-in so a direct volume change wins
    ///
    /// A fade-out is never cancelled; returns whether a ramp was dropped.
    pub fn cancel_fade_in(&mut self) -> bool {
        match &self.active {
            Some(ramp) if ramp.purpose == RampPurpose::FadeIn => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fade_durations() {
        assert_eq!(fade_out_duration(3.0, ms(150)), ms(1500));
        assert_eq!(fade_in_duration(3.0, ms(200)), ms(3000));
        assert_eq!(fade_out_duration(0.1, ms(150)), ms(150));
        assert_eq!(fade_in_duration(0.0, ms(200)), ms(200));
        assert_eq!(fade_out_duration(f64::NAN, ms(150)), ms(150));
    }

    #[test]
    fn test_linear_ramp_progress() {
        let mut scheduler = CrossfadeScheduler::new(FadeCurve::Linear);
        let id = scheduler.start(80, 0, ms(1000), ms(0), RampPurpose::FadeOut { generation: 1 });
        assert!(scheduler.is_fading());

        let step = scheduler.tick(id, ms(250)).unwrap();
        assert_eq!(step.volume, 60);
        assert!(!step.finished);

        let step = scheduler.tick(id, ms(500)).unwrap();
        assert_eq!(step.volume, 40);

        let step = scheduler.tick(id, ms(1200)).unwrap();
        assert_eq!(step.volume, 0);
        assert!(step.finished);
        assert!(!scheduler.is_fading());
        assert!(scheduler.tick(id, ms(1300)).is_none());
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut scheduler = CrossfadeScheduler::new(FadeCurve::SCurve);
        let id = scheduler.start(10, 90, Duration::ZERO, ms(5), RampPurpose::FadeIn);
        let step = scheduler.tick(id, ms(5)).unwrap();
        assert!(step.finished);
        assert_eq!(step.volume, 90);
    }

    #[test]
    fn test_replaced_ramp_is_stale() {
        let mut scheduler = CrossfadeScheduler::new(FadeCurve::Linear);
        let first = scheduler.start(50, 100, ms(1000), ms(0), RampPurpose::FadeIn);
        let second = scheduler.start(50, 20, ms(1000), ms(100), RampPurpose::FadeIn);
        assert_ne!(first, second);
        assert!(scheduler.tick(first, ms(200)).is_none());
        assert!(scheduler.tick(second, ms(200)).is_some());
    }

    #[test]
    fn test_cancel_only_drops_fade_in() {
        let mut scheduler = CrossfadeScheduler::new(FadeCurve::Linear);
        let id = scheduler.start(70, 0, ms(500), ms(0), RampPurpose::FadeOut { generation: 3 });
        assert!(!scheduler.cancel_fade_in());
        assert!(scheduler.tick(id, ms(100)).is_some());

        let id = scheduler.start(0, 70, ms(500), ms(0), RampPurpose::FadeIn);
        assert!(scheduler.cancel_fade_in());
        assert!(scheduler.tick(id, ms(100)).is_none());
    }
}
