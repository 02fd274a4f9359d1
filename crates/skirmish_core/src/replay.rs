//! Replay recording and playback.
//!
//! A replay stores the session right after [`CombatSession::start`] and
//! the input frame of every tick that followed. Playback feeds the same
//! frames to a restored session; determinism guarantees the same result.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GameError, Result};
use crate::events::TickEvents;
use crate::input::InputFrame;
use crate::session::CombatSession;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Encounter the session was built from.
    pub encounter: String,
    /// Serialized session state at the first recorded tick.
    pub initial_state: Vec<u8>,
    /// Tick of the initial state.
    pub start_tick: u64,
    /// One input frame per tick, in tick order.
    pub frames: Vec<InputFrame>,
    /// Tick after the last recorded frame.
    pub final_tick: u64,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording from the session's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized.
    pub fn new(encounter: impl Into<String>, session: &CombatSession) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            encounter: encounter.into(),
            initial_state: session.serialize()?,
            start_tick: session.get_tick(),
            frames: Vec::new(),
            final_tick: session.get_tick(),
            final_hash: session.state_hash(),
        })
    }

    /// Record the frame fed to the next tick.
    pub fn record_frame(&mut self, frame: InputFrame) {
        self.frames.push(frame);
    }

    /// Finalize the replay with the end state.
    pub fn finalize(&mut self, session: &CombatSession) {
        self.final_tick = session.get_tick();
        self.final_hash = session.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, decoding or the version check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Restore the recorded initial session.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state is corrupt.
    pub fn restore_initial_state(&self) -> Result<CombatSession> {
        CombatSession::deserialize(&self.initial_state)
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.frames.len() as u64
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    session: CombatSession,
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at the start of the replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let session = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            session,
            cursor: 0,
        })
    }

    /// Play the next recorded frame. Returns `None` at the end.
    pub fn advance(&mut self) -> Option<TickEvents> {
        let frame = self.replay.frames.get(self.cursor)?;
        let events = self.session.tick(frame);
        self.cursor += 1;
        Some(events)
    }

    /// Whether every frame has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.frames.len()
    }

    /// Session being played.
    #[must_use]
    pub const fn session(&self) -> &CombatSession {
        &self.session
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Play to the end and compare the final hash.
    ///
    /// # Errors
    ///
    /// [`GameError::DesyncDetected`] if the hash differs from the
    /// recorded one.
    pub fn verify(&mut self) -> Result<()> {
        while self.advance().is_some() {}

        let actual = self.session.state_hash();
        if actual != self.replay.final_hash {
            return Err(GameError::DesyncDetected {
                tick: self.session.get_tick(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::actor::{Actor, ActorStats};
    use crate::input::Key;
    use crate::math::{Fixed, Vec2Fixed};
    use crate::participant::Role;
    use crate::spatial::Body;

    fn started_session() -> CombatSession {
        let mut session = CombatSession::default();
        for (name, x) in [("A", 0), ("B", 2)] {
            session.register(
                name,
                Body::new(Vec2Fixed::from_ints(x, 0), Fixed::ONE / Fixed::from_num(2)),
                Role::Actor(Actor::new(
                    ActorStats {
                        stamina: Fixed::from_num(10),
                        health: Fixed::from_num(3),
                    },
                    vec![ActionKind::Move, ActionKind::Attack],
                )),
            );
        }
        session.start().unwrap();
        session
    }

    fn record(session: &mut CombatSession, frames: &[InputFrame]) -> Replay {
        let mut replay = Replay::new("duel", session).unwrap();
        for frame in frames {
            session.tick(frame);
            replay.record_frame(frame.clone());
        }
        replay.finalize(session);
        replay
    }

    #[test]
    fn test_playback_matches_recording() {
        let mut session = started_session();
        let frames = vec![
            InputFrame::at(Vec2Fixed::from_ints(0, 3)).tap(Key::Digit(1)),
            InputFrame::at(Vec2Fixed::from_ints(0, 3)).click(),
            InputFrame::idle().tap(Key::EndTurn),
            InputFrame::idle(),
        ];
        let replay = record(&mut session, &frames);
        assert_eq!(replay.duration(), 4);

        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(player.verify().is_ok());
        assert!(player.is_finished());
        assert_eq!(player.session().state_hash(), session.state_hash());
    }

    #[test]
    fn test_tampered_replay_desyncs() {
        let mut session = started_session();
        let mut replay = record(&mut session, &[InputFrame::idle().tap(Key::EndTurn)]);
        replay.frames[0] = InputFrame::idle();

        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(matches!(
            player.verify(),
            Err(GameError::DesyncDetected { .. })
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut session = started_session();
        let replay = record(&mut session, &[InputFrame::idle()]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.replay");
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();

        assert_eq!(loaded.encounter, "duel");
        assert_eq!(loaded.final_hash, replay.final_hash);
        assert_eq!(loaded.frames, replay.frames);
    }
}
