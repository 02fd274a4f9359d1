//! Error types for the combat core.
//!
//! Domain outcomes (not enough stamina, a hotkey outside the catalog, a
//! second action while one is running) are not errors; they are reported
//! as [`crate::actor::Rejection`] values. The types here cover real faults:
//! malformed data, unknown participants and broken persistence.

use thiserror::Error;

use crate::participant::ParticipantId;
use crate::turn::TurnError;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all combat core errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Referenced participant does not exist.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Encounter data failed validation.
    #[error("Invalid encounter data: {0}")]
    InvalidData(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path or name of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Turn order could not advance.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// Invalid session state.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Desync detected while verifying a replay.
    #[error("Desync detected at tick {tick}: expected hash {expected:016x}, got {actual:016x}")]
    DesyncDetected {
        /// Tick where the replay finished.
        tick: u64,
        /// Hash recorded in the replay.
        expected: u64,
        /// Hash produced by playback.
        actual: u64,
    },
}
