//! Fade curve implementations for volume ramps
//!
//! The playback controller moves the player volume between two levels over a
//! fixed duration. The curve maps normalized progress through the ramp
//! (0.0 = start, 1.0 = end) to the fraction of the volume distance covered.
//!
//! `Linear` is the default and produces a straight interpolation between the
//! start and target volume.

use serde::{Deserialize, Serialize};

/// Fade curve types for volume ramps
///
/// - Linear: Constant rate of change (precise, predictable)
/// - Exponential: Slow start, fast finish (natural-sounding fade-in)
/// - Logarithmic: Fast start, slow finish (natural-sounding fade-out)
/// - SCurve: Smooth acceleration and deceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    #[default]
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = 1 - (1-t)²
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine", alias = "s-curve", alias = "scurve")]
    SCurve,
}

impl FadeCurve {
    /// Rising gain at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through the ramp (0.0 to 1.0)
    ///
    /// # Returns
    /// Fraction of the ramp completed (0.0 = start level, 1.0 = target level)
    pub fn fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
        }
    }

    /// Interpolate between two volume levels (0-100 scale)
    ///
    /// The result is rounded to the nearest integer step and always lies
    /// between `from` and `to` inclusive.
    pub fn interpolate(&self, from: u8, to: u8, position: f32) -> u8 {
        let from_f = from as f32;
        let to_f = to as f32;
        let value = from_f + (to_f - from_f) * self.fade_in(position);
        let (lo, hi) = if from <= to { (from_f, to_f) } else { (to_f, from_f) };
        value.round().clamp(lo, hi) as u8
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Exponential => "Exponential",
            FadeCurve::Logarithmic => "Logarithmic",
            FadeCurve::SCurve => "S-Curve",
        }
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
