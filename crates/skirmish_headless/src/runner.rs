//! Headless runner implementation.
//!
//! Reads one command per line, plays the frames it describes and writes
//! the responses. Blocking IO on a single thread: the session only moves
//! when the controller asks it to.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use skirmish_core::input::InputFrame;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::replay::Replay;
use skirmish_core::session::{CombatSession, Outcome};
use tracing::{debug, error, info, warn};

use crate::protocol::{Command, Response, StateView};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs only on query).
    pub auto_state_output: bool,
    /// Write a replay of the run here on quit or end of input.
    pub record_path: Option<PathBuf>,
}

/// Headless runner for controller-driven encounters.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    scenario_id: String,
    session: CombatSession,
    pending: Vec<Response>,
    pointer: Vec2Fixed,
    replay: Option<Replay>,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Start `scenario` and get ready to take commands.
    pub fn new(config: HeadlessConfig, scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut runner = Self {
            config,
            scenario_id: String::new(),
            session: CombatSession::default(),
            pending: Vec::new(),
            pointer: Vec2Fixed::ZERO,
            replay: None,
            game_over_sent: false,
        };
        runner.load(scenario)?;
        Ok(runner)
    }

    fn load(&mut self, scenario: &Scenario) -> Result<(), ScenarioError> {
        let (session, opening) = scenario.start()?;

        if self.replay.as_ref().is_some_and(|r| !r.frames.is_empty()) {
            warn!(
                from = %self.scenario_id,
                to = %scenario.id,
                "Encounter replaced; recorded frames discarded"
            );
        }
        self.replay = match self.config.record_path {
            Some(_) => Some(Replay::new(scenario.id.clone(), &session)?),
            None => None,
        };

        info!(
            encounter = %scenario.id,
            participants = session.participants().len(),
            "Encounter loaded"
        );

        self.scenario_id.clone_from(&scenario.id);
        self.session = session;
        self.pointer = Vec2Fixed::ZERO;
        self.game_over_sent = false;
        self.pending = vec![Response::ready(&self.scenario_id, self.session.get_tick())];
        if !opening.events.is_empty() {
            self.pending.push(Response::Events {
                tick: opening.tick,
                events: opening.events,
            });
        }
        Ok(())
    }

    /// Session being driven.
    #[must_use]
    pub const fn session(&self) -> &CombatSession {
        &self.session
    }

    /// Responses produced by loading the encounter that have not been
    /// handed out yet.
    pub fn take_pending(&mut self) -> Vec<Response> {
        std::mem::take(&mut self.pending)
    }

    /// Process one parsed command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let cmd_name = cmd.name();
        let mut responses = Vec::new();

        match cmd {
            Command::Input { .. } | Command::Tick { .. } => match cmd.frames(&mut self.pointer) {
                Ok(frames) => {
                    for frame in frames {
                        self.step(frame, &mut responses);
                    }
                    if responses.is_empty() {
                        responses.push(Response::ack(cmd_name));
                    }
                }
                Err(message) => responses.push(Response::error(message, Some(cmd_name))),
            },

            Command::Query => {
                responses.push(Response::State(StateView::capture(&self.session)));
            }

            Command::Hash => {
                responses.push(Response::StateHash {
                    tick: self.session.get_tick(),
                    hash: self.session.state_hash(),
                });
            }

            Command::LoadEncounter { path } => {
                match Scenario::resolve(&path).and_then(|scenario| self.load(&scenario)) {
                    Ok(()) => responses.extend(self.take_pending()),
                    Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
                }
            }

            Command::Quit => {
                self.finish();
                responses.push(Response::Bye);
            }
        }

        responses
    }

    /// Parse and process one input line. Blank lines produce nothing.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => vec![Response::error(format!("Parse error: {e}"), None)],
        }
    }

    fn step(&mut self, frame: InputFrame, responses: &mut Vec<Response>) {
        if let Some(replay) = &mut self.replay {
            replay.record_frame(frame.clone());
        }

        let events = self.session.tick(&frame);
        if !events.events.is_empty() {
            responses.push(Response::Events {
                tick: events.tick,
                events: events.events,
            });
        }

        if self.config.auto_state_output {
            responses.push(Response::State(StateView::capture(&self.session)));
        }

        let outcome = self.session.outcome();
        if !self.game_over_sent && outcome != Outcome::Ongoing {
            info!(?outcome, tick = self.session.get_tick(), "Encounter decided");
            self.game_over_sent = true;
            responses.push(Response::GameOver {
                outcome,
                tick: self.session.get_tick(),
            });
        }
    }

    /// Save the replay, if recording. Safe to call more than once.
    pub fn finish(&mut self) -> Option<PathBuf> {
        let mut replay = self.replay.take()?;
        let path = self.config.record_path.clone()?;
        replay.finalize(&self.session);
        match replay.save(&path) {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    ticks = replay.duration(),
                    hash = format_args!("{:016x}", replay.final_hash),
                    "Replay saved"
                );
                Some(path)
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to save replay");
                None
            }
        }
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub fn run<R: BufRead, W: Write>(mut self, input: R, mut output: W) -> io::Result<()> {
        for response in self.take_pending() {
            output.write_all(response.to_json_line().as_bytes())?;
        }
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let responses = self.handle_line(&line);
            let quit = responses.iter().any(|r| matches!(r, Response::Bye));

            for response in responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;

            if quit {
                return Ok(());
            }
        }

        debug!("Input closed");
        self.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::events::CombatEvent;

    fn runner() -> HeadlessRunner {
        HeadlessRunner::new(HeadlessConfig::default(), &Scenario::duel()).unwrap()
    }

    #[test]
    fn test_opening_is_ready_then_turn_start() {
        let mut runner = runner();
        let opening = runner.take_pending();
        assert!(matches!(&opening[0], Response::Ready { encounter, .. } if encounter == "duel"));
        assert!(matches!(
            &opening[1],
            Response::Events { events, .. }
                if matches!(events[0], CombatEvent::TurnStarted { .. })
        ));
        assert!(runner.take_pending().is_empty());
    }

    #[test]
    fn test_idle_tick_acks() {
        let mut runner = runner();
        let responses = runner.handle_line(r#"{"cmd":"tick","count":2}"#);
        assert_eq!(responses, vec![Response::ack("tick")]);
        assert_eq!(runner.session().get_tick(), 2);
    }

    #[test]
    fn test_bad_line_reports_error() {
        let mut runner = runner();
        let responses = runner.handle_line("{not json");
        assert!(matches!(&responses[0], Response::Error { cmd: None, .. }));
        assert!(runner.handle_line("   ").is_empty());
    }

    #[test]
    fn test_attack_reports_damage() {
        let mut runner = runner();
        runner.handle_line(
            r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"key_down":{"digit":2}}]}"#,
        );
        let responses = runner.handle_line(
            r#"{"cmd":"input","x":3.0,"y":0.0,"events":[{"pointer_down":"primary"}]}"#,
        );

        let damaged = responses.iter().any(|r| match r {
            Response::Events { events, .. } => events
                .iter()
                .any(|e| matches!(e, CombatEvent::Damaged { .. })),
            _ => false,
        });
        assert!(damaged, "{responses:?}");
    }

    #[test]
    fn test_far_pointer_is_refused_and_session_survives() {
        let mut runner = runner();
        let responses = runner.handle_line(
            r#"{"cmd":"input","x":100000.0,"y":0.0,"events":[{"key_down":{"digit":1}}]}"#,
        );
        assert!(matches!(&responses[0], Response::Error { cmd: Some(cmd), .. } if cmd == "input"));
        assert_eq!(runner.session().get_tick(), 0);

        // An action started at the edge of the arena still ticks cleanly.
        runner.handle_line(
            r#"{"cmd":"input","x":10000.0,"y":-10000.0,"events":[{"key_down":{"digit":1}}]}"#,
        );
        runner.handle_line(r#"{"cmd":"input","x":-10000.0,"y":10000.0}"#);
        let responses = runner.handle_line(r#"{"cmd":"tick","count":2}"#);
        assert!(!responses.iter().any(|r| matches!(r, Response::Error { .. })));
        assert_eq!(runner.session().get_tick(), 4);
    }

    #[test]
    fn test_huge_tick_count_is_refused() {
        let mut runner = runner();
        let responses = runner.handle_line(r#"{"cmd":"tick","count":4294967295}"#);
        assert!(matches!(&responses[0], Response::Error { cmd: Some(cmd), .. } if cmd == "tick"));
        assert_eq!(runner.session().get_tick(), 0);
    }

    #[test]
    fn test_query_and_hash_agree() {
        let mut runner = runner();
        let Response::State(state) = runner.handle(Command::Query).remove(0) else {
            panic!("expected state");
        };
        let Response::StateHash { hash, .. } = runner.handle(Command::Hash).remove(0) else {
            panic!("expected hash");
        };
        assert_eq!(state.hash, hash);
        assert_eq!(state.participants.len(), 2);
        assert_eq!(state.current, Some(0));
    }

    #[test]
    fn test_load_unknown_encounter_keeps_session() {
        let mut runner = runner();
        runner.handle(Command::Tick { count: 1 });
        let responses = runner.handle(Command::LoadEncounter {
            path: "no_such_encounter".to_string(),
        });
        assert!(matches!(&responses[0], Response::Error { .. }));
        assert_eq!(runner.session().get_tick(), 1);
    }
}
