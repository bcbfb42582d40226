//! # Ambience Common Library
//!
//! Shared code for the ambience workspace crates including:
//! - Recommendation and scene metadata types consumed by the playback controller
//! - The player error report wire schema (produced by the controller, consumed by the collector)
//! - Configuration file discovery and TOML loading
//! - Fade curve definitions and calculations
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod models;
pub mod player_errors;
pub mod time;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use models::{PlaylistSearch, RecommendationResult, SceneMeta};
pub use player_errors::{PlayerErrorReport, ReportedRequest};
