//! End-to-end runs of the JSON line loop.

use std::io::Cursor;

use skirmish_core::events::CombatEvent;
use skirmish_core::replay::{Replay, ReplayPlayer};
use skirmish_core::session::Outcome;
use skirmish_headless::protocol::Response;
use skirmish_headless::runner::{HeadlessConfig, HeadlessRunner};
use skirmish_headless::scenario::Scenario;

fn run_lines(config: HeadlessConfig, scenario: &Scenario, lines: &[&str]) -> Vec<Response> {
    let runner = HeadlessRunner::new(config, scenario).unwrap();
    let input = Cursor::new(lines.join("\n"));
    let mut output = Vec::new();
    runner.run(input, &mut output).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Red attacks Blue, both end turns, until Blue (3 health, 1 damage per
/// hit) falls on Red's third attack.
const DUEL_TO_THE_END: &[&str] = &[
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"key_down":{"digit":2}}]}"#,
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"pointer_down":"primary"}]}"#,
    r#"{"cmd":"input","x":0.0,"y":0.0,"events":[{"key_up":"end_turn"}]}"#,
    r#"{"cmd":"tick"}"#,
    r#"{"cmd":"input","x":0.0,"y":0.0,"events":[{"key_up":"end_turn"}]}"#,
    r#"{"cmd":"tick"}"#,
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"key_down":{"digit":2}}]}"#,
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"pointer_down":"primary"}]}"#,
    r#"{"cmd":"input","x":0.0,"y":0.0,"events":[{"key_up":"end_turn"}]}"#,
    r#"{"cmd":"tick"}"#,
    r#"{"cmd":"input","x":0.0,"y":0.0,"events":[{"key_up":"end_turn"}]}"#,
    r#"{"cmd":"tick"}"#,
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"key_down":{"digit":2}}]}"#,
    r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"pointer_down":"primary"}]}"#,
    r#"{"cmd":"query"}"#,
    r#"{"cmd":"quit"}"#,
];

#[test]
fn test_duel_plays_to_game_over() {
    let responses = run_lines(HeadlessConfig::default(), &Scenario::duel(), DUEL_TO_THE_END);

    assert!(matches!(responses.first(), Some(Response::Ready { .. })));
    assert!(matches!(responses.last(), Some(Response::Bye)));

    let game_over: Vec<_> = responses
        .iter()
        .filter_map(|r| match r {
            Response::GameOver { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .collect();
    assert_eq!(game_over.len(), 1);
    assert!(matches!(game_over[0], Outcome::Victor(id) if id.0 == 0));

    let defeated = responses.iter().any(|r| match r {
        Response::Events { events, .. } => events
            .iter()
            .any(|e| matches!(e, CombatEvent::Defeated { .. })),
        _ => false,
    });
    assert!(defeated);

    let state = responses.iter().find_map(|r| match r {
        Response::State(state) => Some(state),
        _ => None,
    });
    let state = state.expect("query answered");
    assert!(state.participants[1].defeated);
    assert_eq!(state.participants[0].resources.len(), 2);
}

#[test]
fn test_recorded_run_replays_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.replay");
    let config = HeadlessConfig {
        auto_state_output: false,
        record_path: Some(path.clone()),
    };

    let responses = run_lines(config, &Scenario::duel(), DUEL_TO_THE_END);
    let final_hash = responses
        .iter()
        .rev()
        .find_map(|r| match r {
            Response::State(state) => Some(state.hash),
            _ => None,
        })
        .unwrap();

    let replay = Replay::load(&path).unwrap();
    assert_eq!(replay.encounter, "duel");
    assert_eq!(replay.final_hash, final_hash);

    let mut player = ReplayPlayer::new(replay).unwrap();
    player.verify().unwrap();
}

#[test]
fn test_end_of_input_also_saves_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.replay");
    let config = HeadlessConfig {
        auto_state_output: true,
        record_path: Some(path.clone()),
    };

    let responses = run_lines(config, &Scenario::duel(), &[r#"{"cmd":"tick","count":3}"#]);
    let states = responses
        .iter()
        .filter(|r| matches!(r, Response::State(_)))
        .count();
    assert_eq!(states, 3);

    let replay = Replay::load(&path).unwrap();
    assert_eq!(replay.duration(), 3);
}

#[test]
fn test_load_encounter_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trio.ron");
    std::fs::write(
        &path,
        r#"EncounterData(
            name: "trio",
            participants: [
                (name: "A", kind: Actor(stamina: 10.0, health: 3.0, actions: [move, attack]), position: (x: 0.0, y: 0.0)),
                (name: "B", kind: Actor(stamina: 10.0, health: 3.0, actions: [move, attack]), position: (x: 2.0, y: 0.0)),
                (name: "C", kind: Sentinel(health: 1.0), position: (x: 4.0, y: 0.0)),
            ],
        )"#,
    )
    .unwrap();

    let load = format!(
        r#"{{"cmd":"load_encounter","path":"{}"}}"#,
        path.display().to_string().replace('\\', "/")
    );
    let responses = run_lines(
        HeadlessConfig::default(),
        &Scenario::duel(),
        &[&load, r#"{"cmd":"query"}"#],
    );

    let encounters: Vec<&str> = responses
        .iter()
        .filter_map(|r| match r {
            Response::Ready { encounter, .. } => Some(encounter.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(encounters, vec!["duel", "trio"]);

    let Some(Response::State(state)) = responses.last() else {
        panic!("expected state, got {responses:?}");
    };
    assert_eq!(state.participants.len(), 3);
    assert_eq!(state.tick, 0);
}

#[test]
fn test_builtin_duel_matches_asset() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../assets/encounters/duel.ron");
    let from_file = Scenario::load(path).unwrap();
    assert_eq!(from_file.encounter, Scenario::duel().encounter);
}
