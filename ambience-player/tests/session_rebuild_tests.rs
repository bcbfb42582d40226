//! Player session lifecycle: host switch, hard rebuild, readiness queueing

mod helpers;

use ambience_common::SceneMeta;
use ambience_player::player::InitialContent;
use ambience_player::{ControllerConfig, ControllerEvent, ControllerState, DeliveryHost, PlayerErrorCode};
use helpers::{search, Command, Harness};

fn rebuilt_count(events: &[ControllerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ControllerEvent::SessionRebuilt { .. }))
        .count()
}

#[test]
fn test_player_options_fixed_at_creation() {
    let mut config = ControllerConfig::default();
    config.player.container = "ambience-player".to_string();
    config.player.page_origin = Some("https://table.example".to_string());
    let mut h = Harness::with_config(config);
    h.play(search("wind"), SceneMeta::default());

    let log = h.factory.lock().unwrap();
    let options = &log.created[0].options;
    assert_eq!(options.container, "ambience-player");
    assert_eq!(options.host, DeliveryHost::Standard);
    assert_eq!(options.origin.as_deref(), Some("https://table.example"));
    assert!(options.inline_playback);
    assert!(!options.show_controls);
    assert!(options.js_bridge);
    assert_eq!(options.initial_content, None);
}

#[test]
fn test_insecure_page_sends_no_origin() {
    let mut config = ControllerConfig::default();
    config.player.page_origin = Some("http://localhost:8000".to_string());
    let mut h = Harness::with_config(config);
    h.play(search("wind"), SceneMeta::default());

    assert_eq!(h.factory.lock().unwrap().created[0].options.origin, None);
}

#[test]
fn test_invalid_parameter_switches_host_then_hard_rebuilds_once() {
    let mut h = Harness::new();
    h.start(search("misty moor"));
    h.drain_events();

    h.signal_error(2);
    h.advance(400);

    assert_eq!(h.players_created(), 2);
    assert_eq!(h.controller.delivery_host(), DeliveryHost::PrivacyRestricted);
    {
        let log = h.factory.lock().unwrap();
        let options = &log.created[1].options;
        assert_eq!(options.host, DeliveryHost::PrivacyRestricted);
        assert_eq!(
            options.initial_content,
            Some(InitialContent::Search("misty moor".into()))
        );
    }
    assert!(h.commands().contains(&Command::Destroy));
    assert_eq!(h.controller.state(), ControllerState::AwaitingSession);

    h.signal_ready();
    h.signal_error(2);
    h.advance(400);
    assert_eq!(h.players_created(), 3);
    assert_eq!(h.controller.delivery_host(), DeliveryHost::PrivacyRestricted);

    // Third occurrence: no more rebuilds, ordinary recovery instead
    h.signal_ready();
    h.clear_commands();
    h.signal_error(2);
    h.advance(400);
    assert_eq!(h.players_created(), 3);
    assert_eq!(h.loads(), vec![Command::LoadSearch("misty moor".into())]);

    assert_eq!(rebuilt_count(&h.drain_events()), 2);
}

#[test]
fn test_hard_rebuild_seeds_original_list() {
    let mut h = Harness::new();
    h.start(search("crypt").with_video_ids(["X", "Y"]));

    h.signal_error(150);
    h.advance(400);
    assert_eq!(h.loads().last(), Some(&Command::LoadList(vec!["Y".into()])));

    // Soft rebuild reloads what was last attempted
    h.signal_error(2);
    h.advance(400);
    {
        let log = h.factory.lock().unwrap();
        assert_eq!(
            log.created[1].options.initial_content,
            Some(InitialContent::List(vec!["Y".into()]))
        );
    }

    // Hard rebuild goes back to the list as recommended
    h.signal_ready();
    h.signal_error(2);
    h.advance(400);
    {
        let log = h.factory.lock().unwrap();
        assert_eq!(
            log.created[2].options.initial_content,
            Some(InitialContent::List(vec!["X".into(), "Y".into()]))
        );
    }
    assert_eq!(
        h.controller.last_attempted().unwrap().manual_video_ids,
        vec!["X".to_string(), "Y".to_string()]
    );
    assert!(h.controller.load_history().last().unwrap().seeded);
}

#[test]
fn test_seeded_player_starts_on_ready() {
    let mut h = Harness::new();
    h.start(search("misty moor"));
    h.signal_error(2);
    h.advance(400);
    h.clear_commands();

    h.signal_ready();
    let commands = h.commands();
    assert!(commands.contains(&Command::Mute));
    assert!(commands.contains(&Command::Play { muted: true }));
    assert!(h.loads().is_empty());
    assert_eq!(h.controller.state(), ControllerState::Loading);
}

#[test]
fn test_signals_from_replaced_player_ignored() {
    let mut h = Harness::new();
    h.start(search("misty moor"));
    let stale = h.callbacks();

    h.signal_error(2);
    h.advance(400);
    assert_eq!(h.controller.consecutive_errors(), 1);

    stale.error(PlayerErrorCode(100));
    stale.ready();
    h.pump();
    assert_eq!(h.controller.consecutive_errors(), 1);
    assert!(!h.controller.is_session_ready());
}

#[test]
fn test_newer_request_makes_scheduled_recovery_stale() {
    let mut h = Harness::new();
    h.start(search("misty moor"));

    h.signal_error(100);
    h.play(search("sunny meadow"), SceneMeta::default());
    h.clear_commands();
    h.advance(400);

    assert!(h.loads().is_empty());
}

#[test]
fn test_request_waits_indefinitely_for_readiness_by_default() {
    let mut h = Harness::new();
    h.play(search("deep space"), SceneMeta::default());
    h.advance(120_000);

    assert_eq!(h.players_created(), 1);
    assert_eq!(h.controller.state(), ControllerState::AwaitingSession);
    assert!(h.controller.queued_request().is_some());
    assert!(!h
        .drain_events()
        .iter()
        .any(|e| matches!(e, ControllerEvent::SessionStalled)));
}

#[test]
fn test_readiness_timeout_recreates_player_once() {
    let mut config = ControllerConfig::default();
    config.timing.readiness_timeout_ms = Some(5_000);
    let mut h = Harness::with_config(config);
    h.play(search("deep space"), SceneMeta::default());

    h.advance(5_000);
    assert_eq!(h.players_created(), 2);
    assert_eq!(h.controller.delivery_host(), DeliveryHost::Standard);

    h.advance(5_000);
    assert_eq!(h.players_created(), 2);

    let stalls = h
        .drain_events()
        .iter()
        .filter(|e| matches!(e, ControllerEvent::SessionStalled))
        .count();
    assert_eq!(stalls, 2);

    h.signal_ready();
    assert_eq!(h.loads(), vec![Command::LoadSearch("deep space".into())]);
}

#[test]
fn test_player_creation_failure_surfaces_status() {
    let mut h = Harness::new();
    h.factory.lock().unwrap().fail_next = true;
    h.play(search("deep space"), SceneMeta::default());

    assert_eq!(h.controller.state(), ControllerState::Error);
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, ControllerEvent::PlaybackFailed { .. })));

    // The next request tries again
    h.play(search("deep space"), SceneMeta::default());
    assert_eq!(h.players_created(), 1);
}
