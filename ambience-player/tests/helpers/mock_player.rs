//! Scripted external player for controller tests
//!
//! Every handle created by [`MockFactory`] shares one [`MockPlayerState`], so
//! tests can inspect the full command log across rebuilds.

use ambience_player::player::{InitialContent, PlayerOptions};
use ambience_player::{PlayerCallbacks, PlayerError, PlayerFactory, PlayerHandle, PlayerState};
use std::sync::{Arc, Mutex};

/// One call made on a player handle
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadList(Vec<String>),
    LoadPlaylist(String),
    LoadSearch(String),
    Play { muted: bool },
    Pause,
    Next,
    Mute,
    Unmute,
    SetVolume(u8),
    Destroy,
}

#[derive(Debug)]
pub struct MockPlayerState {
    pub commands: Vec<Command>,
    pub state: PlayerState,
    pub muted: bool,
    pub playlist: Vec<String>,
    pub index: Option<usize>,
    /// Items a named playlist load resolves to
    pub playlist_items: Vec<String>,
    /// Items a search load resolves to
    pub search_items: Vec<String>,
    /// Reject `play` while unmuted, like a browser before a gesture
    pub block_unmuted_play: bool,
}

impl Default for MockPlayerState {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            state: PlayerState::Unstarted,
            muted: false,
            playlist: Vec::new(),
            index: None,
            playlist_items: Vec::new(),
            search_items: Vec::new(),
            block_unmuted_play: false,
        }
    }
}

impl MockPlayerState {
    fn load(&mut self, items: Vec<String>, start_index: usize) {
        self.index = if items.is_empty() { None } else { Some(start_index) };
        self.playlist = items;
        self.state = PlayerState::Unstarted;
    }

    pub fn current_item(&self) -> Option<String> {
        self.index.and_then(|index| self.playlist.get(index).cloned())
    }
}

pub type SharedPlayerState = Arc<Mutex<MockPlayerState>>;

pub struct MockPlayer {
    state: SharedPlayerState,
}

impl PlayerHandle for MockPlayer {
    fn load_explicit_list(&mut self, ids: &[String], start_index: usize) -> Result<(), PlayerError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::LoadList(ids.to_vec()));
        state.load(ids.to_vec(), start_index);
        Ok(())
    }

    fn load_named_playlist(&mut self, playlist_id: &str, start_index: usize) -> Result<(), PlayerError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::LoadPlaylist(playlist_id.to_string()));
        let items = state.playlist_items.clone();
        state.load(items, start_index);
        Ok(())
    }

    fn load_search(&mut self, query: &str, start_index: usize) -> Result<(), PlayerError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::LoadSearch(query.to_string()));
        let items = state.search_items.clone();
        state.load(items, start_index);
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut state = self.state.lock().unwrap();
        let muted = state.muted;
        if state.block_unmuted_play && !muted {
            return Err(PlayerError::AutoplayBlocked);
        }
        state.commands.push(Command::Play { muted });
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Pause);
        state.state = PlayerState::Paused;
    }

    fn next(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Next);
        let len = state.playlist.len();
        state.index = state.index.map(|index| (index + 1).min(len.saturating_sub(1)));
    }

    fn mute(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Mute);
        state.muted = true;
    }

    fn unmute(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Unmute);
        state.muted = false;
    }

    fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn set_volume(&mut self, volume: u8) {
        self.state.lock().unwrap().commands.push(Command::SetVolume(volume));
    }

    fn state(&self) -> PlayerState {
        self.state.lock().unwrap().state
    }

    fn playlist(&self) -> Vec<String> {
        self.state.lock().unwrap().playlist.clone()
    }

    fn playlist_index(&self) -> Option<usize> {
        self.state.lock().unwrap().index
    }

    fn current_item(&self) -> Option<String> {
        self.state.lock().unwrap().current_item()
    }

    fn destroy(&mut self) {
        self.state.lock().unwrap().commands.push(Command::Destroy);
    }
}

/// Record of one `create` call
#[derive(Debug, Clone)]
pub struct Creation {
    pub options: PlayerOptions,
    pub callbacks: PlayerCallbacks,
}

#[derive(Debug, Default)]
pub struct FactoryLog {
    pub created: Vec<Creation>,
    pub fail_next: bool,
}

pub type SharedFactoryLog = Arc<Mutex<FactoryLog>>;

pub struct MockFactory {
    pub player: SharedPlayerState,
    pub log: SharedFactoryLog,
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            player: Arc::new(Mutex::new(MockPlayerState::default())),
            log: Arc::new(Mutex::new(FactoryLog::default())),
        }
    }
}

impl PlayerFactory for MockFactory {
    fn create(
        &mut self,
        options: PlayerOptions,
        callbacks: PlayerCallbacks,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
        let mut log = self.log.lock().unwrap();
        if std::mem::take(&mut log.fail_next) {
            return Err(PlayerError::Creation("script failed to load".to_string()));
        }

        {
            let mut player = self.player.lock().unwrap();
            player.muted = false;
            player.state = PlayerState::Unstarted;
            match &options.initial_content {
                Some(InitialContent::List(ids)) => player.load(ids.clone(), 0),
                Some(InitialContent::Playlist(_)) => {
                    let items = player.playlist_items.clone();
                    player.load(items, 0);
                }
                Some(InitialContent::Search(_)) => {
                    let items = player.search_items.clone();
                    player.load(items, 0);
                }
                None => player.load(Vec::new(), 0),
            }
        }

        log.created.push(Creation { options, callbacks });
        Ok(Box::new(MockPlayer {
            state: Arc::clone(&self.player),
        }))
    }
}
