//! Recommendation and scene metadata types
//!
//! These mirror the JSON returned by the backend's search and recommend
//! endpoints. Unknown fields (hysteresis settings and the like) are ignored.

use serde::{Deserialize, Serialize};

/// A prepared link to a playlist search on an external provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSearch {
    /// Provider name (for example "YouTube")
    pub provider: String,
    /// Fully-built search URL
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A recommendation or search result for one (genre, scene) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub genre: String,
    pub scene: String,
    /// Free-text description of the desired music
    pub query: String,

    /// Curated playlist identifier, preferred over search when present
    #[serde(default)]
    pub youtube_playlist_id: Option<String>,

    /// Explicit ordered list of individual items, most preferred source
    #[serde(default)]
    pub youtube_video_ids: Vec<String>,

    #[serde(default)]
    pub playlists: Vec<PlaylistSearch>,

    /// Tags that drove a recommendation (absent for plain searches)
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub confidence: Option<f32>,

    #[serde(default)]
    pub reason: Option<String>,
}

impl RecommendationResult {
    /// Build a plain search result with only a query
    pub fn from_query(genre: &str, scene: &str, query: &str) -> Self {
        Self {
            genre: genre.to_string(),
            scene: scene.to_string(),
            query: query.to_string(),
            youtube_playlist_id: None,
            youtube_video_ids: Vec::new(),
            playlists: Vec::new(),
            tags: Vec::new(),
            confidence: None,
            reason: None,
        }
    }

    /// Attach a curated playlist identifier
    pub fn with_playlist_id(mut self, playlist_id: &str) -> Self {
        self.youtube_playlist_id = Some(playlist_id.to_string());
        self
    }

    /// Attach an explicit ordered item list
    pub fn with_video_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.youtube_video_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Per-scene playback hints from the scene configuration
///
/// Values come from hand-edited config, so they are validated loosely here and
/// clamped by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneMeta {
    /// Recommended volume (0-100)
    #[serde(default)]
    pub volume: Option<i32>,

    /// Crossfade duration in seconds
    #[serde(default)]
    pub crossfade: Option<f64>,

    /// Recommended anti-flicker cooldown in seconds
    #[serde(default)]
    pub cooldown_sec: Option<u32>,
}
