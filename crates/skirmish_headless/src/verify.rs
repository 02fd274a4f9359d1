//! Determinism verification.
//!
//! Runs the same encounter with the same frame script several times in
//! parallel using rayon and compares the final state hashes.

use std::io::BufRead;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::action::ActionKind;
use skirmish_core::data::{EncounterData, ParticipantKind};
use skirmish_core::input::{InputFrame, Key};
use skirmish_core::math::Vec2Fixed;
use tracing::{debug, info, warn};

use crate::protocol::Command;
use crate::scenario::{Scenario, ScenarioError};

/// Outcome of a verification batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario that was run.
    pub scenario: String,
    /// Frames fed to every run.
    pub ticks: u64,
    /// Final hash of each run, in run order.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// Whether every run ended on the same hash.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Distinct hashes seen.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }
}

/// Play `frames` against a fresh session and return the final hash.
pub fn run_script(scenario: &Scenario, frames: &[InputFrame]) -> Result<u64, ScenarioError> {
    let (mut session, _) = scenario.start()?;
    for frame in frames {
        session.tick(frame);
    }
    debug!(
        tick = session.get_tick(),
        outcome = ?session.outcome(),
        "Script finished"
    );
    Ok(session.state_hash())
}

/// Run the script `runs` times in parallel and collect the hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    frames: &[InputFrame],
    runs: u32,
) -> Result<VerifyReport, ScenarioError> {
    info!(
        scenario = %scenario.id,
        runs,
        ticks = frames.len(),
        "Verifying determinism"
    );

    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| run_script(scenario, frames))
        .collect::<Result<Vec<_>, _>>()?;

    let report = VerifyReport {
        scenario: scenario.id.clone(),
        ticks: frames.len() as u64,
        hashes,
    };
    if !report.is_deterministic() {
        warn!(unique = report.unique_hashes().len(), "Runs diverged");
    }
    Ok(report)
}

/// A script where every actor attacks the next participant in the
/// encounter list, then ends its turn, for `rounds` rounds.
///
/// Pointers aim at starting positions, so later attacks may miss once
/// somebody has moved. That is fine for determinism checks.
#[must_use]
pub fn scripted_frames(encounter: &EncounterData, rounds: u32) -> Vec<InputFrame> {
    let positions: Vec<Vec2Fixed> = encounter
        .participants
        .iter()
        .map(|p| p.position.into())
        .collect();
    let count = positions.len();

    let mut frames = Vec::new();
    for _ in 0..rounds {
        for (index, participant) in encounter.participants.iter().enumerate() {
            let ParticipantKind::Actor { actions, .. } = &participant.kind else {
                // Sentinels pass on their own; the handoff still takes a tick.
                frames.push(InputFrame::idle());
                continue;
            };

            let target = positions[(index + 1) % count];
            if let Some(slot) = actions.iter().position(|kind| *kind == ActionKind::Attack) {
                let digit = u8::try_from((slot + 1) % 10).unwrap_or(0);
                frames.push(InputFrame::at(target).tap(Key::Digit(digit)));
                frames.push(InputFrame::at(target).click());
                frames.push(InputFrame::at(target).tap(Key::Cancel));
            }
            frames.push(InputFrame::idle().tap(Key::EndTurn));
            frames.push(InputFrame::idle());
        }
    }
    frames
}

/// Read a frame script: one protocol command per line. `input` and
/// `tick` lines become frames; other commands are skipped.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<InputFrame>, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);

    let mut pointer = Vec2Fixed::ZERO;
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let script_error = |message: String| ScenarioError::Script {
            line: index + 1,
            message,
        };
        let cmd = Command::from_json(line).map_err(|e| script_error(e.to_string()))?;
        frames.extend(cmd.frames(&mut pointer).map_err(script_error)?);
    }
    Ok(frames)
}
