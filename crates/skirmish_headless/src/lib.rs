//! Headless encounter runner for scripted play and CI verification.
//!
//! This crate drives a combat session without graphics, controlled via
//! JSON commands on stdin, with events and state on stdout. This enables:
//!
//! - **Scripted play**: A controller (bot, test, agent) plays an encounter
//! - **CI verification**: Automated determinism checks of the combat core
//! - **Replay verification**: Check that replays produce identical results
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (input, tick, query, ...)
//! - **stdout**: Events, state and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":2}' | cargo run -p skirmish_headless
//!
//! # Run an encounter and record a replay
//! cargo run -p skirmish_headless -- run --scenario assets/encounters/abc.ron --record run.replay
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- replay --file run.replay --verify
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::{Scenario, ScenarioError};
pub use verify::{verify_determinism, VerifyReport};
