//! Request normalizer
//!
//! Turns a raw recommendation/search result plus scene metadata into a
//! [`PlaybackRequest`]: the immutable snapshot the fallback ladder loads from.
//!
//! The embedded player's search surface silently returns nothing for queries
//! containing boolean-exclusion operators, so the search text is sanitized
//! once here. The original query is kept for logging and telemetry.

use crate::config::PlaybackDefaults;
use crate::error::{Error, Result};
use ambience_common::player_errors::ReportedRequest;
use ambience_common::{RecommendationResult, SceneMeta};
use serde::Serialize;

/// Upper bound for a scene crossfade, in seconds
pub const MAX_CROSSFADE_SECONDS: f64 = 30.0;

/// Canonical playback request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackRequest {
    /// Free-text description of the desired music, as received
    pub raw_query: String,

    /// `raw_query` without exclusion tokens; equals `raw_query` if stripping emptied it
    pub search_query: String,

    /// Curated playlist identifier
    pub playlist_id: Option<String>,

    /// Working copy of the explicit item list; failed entries are removed from it
    pub manual_video_ids: Vec<String>,

    /// Length of the explicit list as recommended
    pub manual_initial_len: usize,

    pub desired_volume: u8,

    pub crossfade_seconds: f64,
}

impl PlaybackRequest {
    /// Normalize a recommendation into a request
    ///
    /// Blank ids and playlist ids are dropped. Volume is clamped to 0-100 and
    /// crossfade to 0-30 seconds; missing values come from `defaults`.
    ///
    /// Returns `Error::EmptyRequest` if nothing playable remains.
    pub fn from_result(
        result: &RecommendationResult,
        meta: &SceneMeta,
        defaults: &PlaybackDefaults,
    ) -> Result<Self> {
        let raw_query = result.query.trim().to_string();
        let search_query = sanitize_search_query(&raw_query);

        let playlist_id = result
            .youtube_playlist_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let manual_video_ids: Vec<String> = result
            .youtube_video_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        if manual_video_ids.is_empty() && playlist_id.is_none() && search_query.is_empty() {
            return Err(Error::EmptyRequest);
        }

        let desired_volume = meta
            .volume
            .map(|v| v.clamp(0, 100) as u8)
            .unwrap_or(defaults.volume.min(100));

        let crossfade_seconds = meta
            .crossfade
            .filter(|c| c.is_finite())
            .unwrap_or(defaults.crossfade_seconds)
            .clamp(0.0, MAX_CROSSFADE_SECONDS);

        Ok(Self {
            raw_query,
            search_query,
            playlist_id,
            manual_initial_len: manual_video_ids.len(),
            manual_video_ids,
            desired_volume,
            crossfade_seconds,
        })
    }

    /// Whether sanitization changed the search text
    pub fn search_differs(&self) -> bool {
        self.search_query != self.raw_query
    }

    pub fn has_manual_list(&self) -> bool {
        !self.manual_video_ids.is_empty()
    }

    /// Telemetry snapshot of this request
    pub fn to_reported(&self) -> ReportedRequest {
        ReportedRequest {
            query: self.raw_query.clone(),
            desired_vol: self.desired_volume,
            crossfade_sec: self.crossfade_seconds,
            search_query: self.search_differs().then(|| self.search_query.clone()),
        }
    }
}

/// Strip boolean-exclusion tokens from a search query
///
/// Removes `-word` tokens and `-"quoted phrases"`, collapses whitespace, and
/// returns the trimmed original when nothing else would remain.
pub fn sanitize_search_query(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut rest = raw.trim_start();

    while !rest.is_empty() {
        let (token, remainder) = next_token(rest);
        if !is_exclusion(token) {
            kept.push(token);
        }
        rest = remainder.trim_start();
    }

    let cleaned = kept.join(" ");
    if cleaned.is_empty() {
        raw.trim().to_string()
    } else {
        cleaned
    }
}

/// Split off the next whitespace-delimited token, keeping quoted phrases whole
fn next_token(s: &str) -> (&str, &str) {
    let quote_offset = if s.starts_with("-\"") {
        Some(2)
    } else if s.starts_with('"') {
        Some(1)
    } else {
        None
    };

    if let Some(offset) = quote_offset {
        if let Some(close) = s[offset..].find('"') {
            let after_quote = offset + close + 1;
            let end = s[after_quote..]
                .find(char::is_whitespace)
                .map(|i| after_quote + i)
                .unwrap_or(s.len());
            return s.split_at(end);
        }
    }

    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    s.split_at(end)
}

fn is_exclusion(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !token[1..].starts_with('-')
}
