//! Replay recording, file round-trips and verification.

use proptest::prelude::*;
use skirmish_core::error::GameError;
use skirmish_core::input::{InputFrame, Key};
use skirmish_core::replay::{Replay, ReplayPlayer, REPLAY_VERSION};
use skirmish_core::session::CombatSession;
use skirmish_test_utils::determinism::strategies::arb_frame_script;
use skirmish_test_utils::fixtures::{arena_session, duel_session, point, started};

fn record(mut session: CombatSession, frames: &[InputFrame]) -> (Replay, CombatSession) {
    let mut replay = Replay::new("fixture", &session).unwrap();
    for frame in frames {
        session.tick(frame);
        replay.record_frame(frame.clone());
    }
    replay.finalize(&session);
    (replay, session)
}

fn duel_script() -> Vec<InputFrame> {
    vec![
        InputFrame::at(point(2, 0)).tap(Key::Digit(2)),
        InputFrame::at(point(2, 0)).click(),
        InputFrame::idle().tap(Key::EndTurn),
        InputFrame::idle(),
        InputFrame::at(point(2, 4)).tap(Key::Digit(1)),
        InputFrame::at(point(2, 4)).click(),
        InputFrame::idle().tap(Key::EndTurn),
        InputFrame::idle(),
    ]
}

#[test]
fn test_replay_file_round_trip_verifies() {
    let (replay, live) = record(started(duel_session()), &duel_script());
    assert_eq!(replay.version, REPLAY_VERSION);
    assert_eq!(replay.duration(), 8);
    assert_eq!(replay.final_hash, live.state_hash());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.replay");
    replay.save(&path).unwrap();

    let loaded = Replay::load(&path).unwrap();
    let mut player = ReplayPlayer::new(loaded).unwrap();
    player.verify().unwrap();
    assert_eq!(player.session().state_hash(), live.state_hash());
}

#[test]
fn test_version_mismatch_is_rejected() {
    let (mut replay, _) = record(started(duel_session()), &[]);
    replay.version = REPLAY_VERSION + 1;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.replay");
    replay.save(&path).unwrap();

    let err = Replay::load(&path).unwrap_err();
    assert!(err.to_string().contains("version mismatch"));
}

#[test]
fn test_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Replay::load(dir.path().join("nope.replay")).is_err());
}

#[test]
fn test_playback_emits_same_events() {
    let script = duel_script();
    let mut live = started(duel_session());
    let mut replay = Replay::new("fixture", &live).unwrap();
    let mut live_events = Vec::new();
    for frame in &script {
        live_events.push(live.tick(frame));
        replay.record_frame(frame.clone());
    }
    replay.finalize(&live);

    let mut player = ReplayPlayer::new(replay).unwrap();
    let mut replayed = Vec::new();
    while let Some(events) = player.advance() {
        replayed.push(events);
    }
    assert_eq!(replayed, live_events);
}

#[test]
fn test_desync_reports_hashes() {
    let (mut replay, _) = record(started(duel_session()), &duel_script());
    replay.final_hash ^= 1;
    let mut player = ReplayPlayer::new(replay).unwrap();
    assert!(matches!(
        player.verify(),
        Err(GameError::DesyncDetected { tick: 8, .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any recorded script replays to the same final hash.
    #[test]
    fn prop_recorded_scripts_verify(frames in arb_frame_script(20)) {
        let (replay, _) = record(started(arena_session()), &frames);
        let mut player = ReplayPlayer::new(replay).unwrap();
        prop_assert!(player.verify().is_ok());
    }
}
