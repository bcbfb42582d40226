//! Fallback ladder
//!
//! A request can name three sources, in priority order:
//! 1. An explicit ordered item list
//! 2. A curated playlist id
//! 3. A free-text search
//!
//! Exactly one of them is loaded per attempt. Lower rungs stay in the request
//! as fallbacks for when error recovery exhausts the explicit list.

use crate::player::{InitialContent, PlayerError, PlayerHandle};
use crate::request::PlaybackRequest;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of load attempts kept for diagnostics
pub const HISTORY_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LadderRung {
    Manual,
    Playlist,
    Search,
}

impl std::fmt::Display for LadderRung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LadderRung::Manual => write!(f, "manual"),
            LadderRung::Playlist => write!(f, "playlist"),
            LadderRung::Search => write!(f, "search"),
        }
    }
}

/// One external load command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCommand {
    ExplicitList(Vec<String>),
    NamedPlaylist(String),
    Search(String),
}

impl LoadCommand {
    /// Pick the highest-priority rung the request can satisfy
    pub fn for_request(request: &PlaybackRequest) -> Self {
        if request.has_manual_list() {
            LoadCommand::ExplicitList(request.manual_video_ids.clone())
        } else if let Some(playlist_id) = &request.playlist_id {
            LoadCommand::NamedPlaylist(playlist_id.clone())
        } else {
            LoadCommand::Search(request.search_query.clone())
        }
    }

    pub fn rung(&self) -> LadderRung {
        match self {
            LoadCommand::ExplicitList(_) => LadderRung::Manual,
            LoadCommand::NamedPlaylist(_) => LadderRung::Playlist,
            LoadCommand::Search(_) => LadderRung::Search,
        }
    }

    /// Send the command to the player, always starting at index 0
    pub fn issue(&self, player: &mut dyn PlayerHandle) -> Result<(), PlayerError> {
        match self {
            LoadCommand::ExplicitList(ids) => player.load_explicit_list(ids, 0),
            LoadCommand::NamedPlaylist(id) => player.load_named_playlist(id, 0),
            LoadCommand::Search(query) => player.load_search(query, 0),
        }
    }

    /// Text sent to the player, for logs
    pub fn describe(&self) -> String {
        match self {
            LoadCommand::ExplicitList(ids) => ids.join(","),
            LoadCommand::NamedPlaylist(id) => id.clone(),
            LoadCommand::Search(query) => query.clone(),
        }
    }

    /// Same content expressed as creation parameters for a rebuilt player
    pub fn into_initial_content(self) -> InitialContent {
        match self {
            LoadCommand::ExplicitList(ids) => InitialContent::List(ids),
            LoadCommand::NamedPlaylist(id) => InitialContent::Playlist(id),
            LoadCommand::Search(query) => InitialContent::Search(query),
        }
    }
}

/// Record of a load the controller issued
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadAttempt {
    pub rung: LadderRung,
    /// Original query text of the request
    pub query: String,
    /// Exact text handed to the player
    pub issued: String,
    /// Explicit list at the time of the load (empty for other rungs)
    pub manual_ids: Vec<String>,
    /// True when the content was seeded into a rebuilt player
    pub seeded: bool,
}

impl LoadAttempt {
    pub fn new(command: &LoadCommand, request: &PlaybackRequest, seeded: bool) -> Self {
        let manual_ids = match command {
            LoadCommand::ExplicitList(ids) => ids.clone(),
            _ => Vec::new(),
        };
        Self {
            rung: command.rung(),
            query: request.raw_query.clone(),
            issued: command.describe(),
            manual_ids,
            seeded,
        }
    }
}

/// Bounded log of recent load attempts, oldest first
#[derive(Debug, Default)]
pub struct LoadHistory {
    entries: VecDeque<LoadAttempt>,
}

impl LoadHistory {
    pub fn push(&mut self, attempt: LoadAttempt) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(attempt);
    }

    pub fn last(&self) -> Option<&LoadAttempt> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadAttempt> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of removing a failed entry from the explicit list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualTrim {
    pub initial_len: usize,
    pub remaining_len: usize,
    pub removed_id: Option<String>,
}

/// Drop the failing entry from the request's explicit list
///
/// Matched by reported item id. Only when the player reports no id is the
/// reported index used, and otherwise the first entry is removed. A reported
/// id that is no longer in the list was already removed, so nothing is.
pub fn degrade_manual_list(
    request: &mut PlaybackRequest,
    current_video_id: Option<&str>,
    playlist_index: Option<usize>,
) -> ManualTrim {
    let ids = &mut request.manual_video_ids;

    let position = match current_video_id {
        Some(current) => ids.iter().position(|id| id == current),
        None => playlist_index
            .filter(|&index| index < ids.len())
            .or_else(|| (!ids.is_empty()).then_some(0)),
    };

    let removed_id = position.map(|index| ids.remove(index));

    ManualTrim {
        initial_len: request.manual_initial_len,
        remaining_len: ids.len(),
        removed_id,
    }
}
