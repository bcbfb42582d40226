//! Player error report wire schema
//!
//! The playback controller posts one of these to `/api/player-errors` whenever
//! the embedded player reports an error; the collector service validates and
//! logs it. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path the collector serves and the controller posts to
pub const PLAYER_ERRORS_PATH: &str = "/api/player-errors";

/// Snapshot of the playback request that was active when the error happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedRequest {
    /// Original free-text query
    pub query: String,
    pub desired_vol: u8,
    pub crossfade_sec: f64,
    /// Sanitized search text, present only when it differs from `query`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

/// Schema of the payload emitted by the player error handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerErrorReport {
    /// Error code reported by the embedded player
    pub error_code: i32,

    /// Identifier of the affected item
    #[serde(default)]
    pub video_id: Option<String>,

    /// Last request issued by the controller
    #[serde(default)]
    pub request: Option<ReportedRequest>,

    /// Most recent query text
    #[serde(default)]
    pub last_query: Option<String>,

    /// Index of the failing item in the playlist
    #[serde(default)]
    pub playlist_index: Option<i64>,

    /// Number of items in the active playlist
    #[serde(default)]
    pub playlist_length: Option<u64>,

    /// How many playback errors occurred without recovery
    #[serde(default, alias = "consecutivePlaybackErrors")]
    pub consecutive_errors: Option<u32>,

    /// Whether a manual override list was in use
    #[serde(default)]
    pub manual_list_active: Option<bool>,

    /// Size of the manual list before error handling
    #[serde(default)]
    pub manual_list_initial_length: Option<u64>,

    /// Size of the manual list after removing failing entries
    #[serde(default)]
    pub manual_list_remaining_length: Option<u64>,

    /// Whether an entry was removed from the manual list
    #[serde(default)]
    pub manual_list_was_trimmed: Option<bool>,

    /// Identifier of the manual entry that was dropped
    #[serde(default)]
    pub removed_manual_video_id: Option<String>,

    /// Client-side timestamp of the error
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

impl PlayerErrorReport {
    /// Minimal report carrying only an error code
    pub fn new(error_code: i32) -> Self {
        Self {
            error_code,
            video_id: None,
            request: None,
            last_query: None,
            playlist_index: None,
            playlist_length: None,
            consecutive_errors: None,
            manual_list_active: None,
            manual_list_initial_length: None,
            manual_list_remaining_length: None,
            manual_list_was_trimmed: None,
            removed_manual_video_id: None,
            reported_at: None,
        }
    }

    /// JSON object with all `null` fields removed
    pub fn to_compact_json(&self) -> crate::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.retain(|_, v| !v.is_null());
        }
        Ok(value)
    }
}
