//! Encounter data validation.
//!
//! Every `.ron` file in a directory must parse as an encounter, pass the
//! core's validation, and start a session. Encounter names must be unique
//! across the directory since the headless runner looks them up by name.

use std::fmt;
use std::path::{Path, PathBuf};

use skirmish_core::data::EncounterData;
use skirmish_core::error::GameError;
use thiserror::Error;
use tracing::debug;

/// Why a file or directory failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The path to validate is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Reading a file or listing the directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for an encounter.
    #[error("{}: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser error with position.
        source: ron::error::SpannedError,
    },

    /// The encounter parsed but cannot run.
    #[error("{}: {source}", path.display())]
    Invalid {
        /// Offending file.
        path: PathBuf,
        /// What the core rejected.
        source: GameError,
    },

    /// Two files define the same encounter name.
    #[error(
        "encounter '{name}' defined in both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateName {
        /// Encounter name.
        name: String,
        /// File seen first.
        first: PathBuf,
        /// File seen second.
        second: PathBuf,
    },
}

/// Result of validating a directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Files that passed, in path order.
    pub checked: Vec<PathBuf>,
    /// Problems found.
    pub failures: Vec<ValidationError>,
}

impl ValidationReport {
    /// Whether no problems were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed",
            self.checked.len(),
            self.failures.len()
        )
    }
}

/// Parse, validate and test-start one encounter file.
///
/// # Errors
///
/// Returns the first problem with the file.
pub fn validate_encounter_file(path: &Path) -> Result<EncounterData, ValidationError> {
    let text = std::fs::read_to_string(path)?;
    let encounter: EncounterData = ron::from_str(&text).map_err(|source| ValidationError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |source: GameError| ValidationError::Invalid {
        path: path.to_path_buf(),
        source,
    };
    let mut session = encounter.build().map_err(invalid)?;
    session.start().map_err(invalid)?;

    debug!(
        path = %path.display(),
        name = %encounter.name,
        participants = encounter.participants.len(),
        "Encounter valid"
    );
    Ok(encounter)
}

/// Validate all encounter files in a directory.
///
/// Individual file problems are collected in the report; only problems
/// with the directory itself are returned as errors.
///
/// # Errors
///
/// Returns an error if `path` is not a readable directory.
pub fn validate_encounter_directory(path: &Path) -> Result<ValidationReport, ValidationError> {
    if !path.is_dir() {
        return Err(ValidationError::NotADirectory(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let file = entry?.path();
        if file.extension().is_some_and(|ext| ext == "ron") {
            files.push(file);
        }
    }
    files.sort();

    let mut report = ValidationReport::default();
    let mut seen: Vec<(String, PathBuf)> = Vec::new();
    for file in files {
        match validate_encounter_file(&file) {
            Ok(encounter) => {
                if let Some((_, first)) = seen.iter().find(|(name, _)| *name == encounter.name) {
                    report.failures.push(ValidationError::DuplicateName {
                        name: encounter.name,
                        first: first.clone(),
                        second: file,
                    });
                    continue;
                }
                seen.push((encounter.name, file.clone()));
                report.checked.push(file);
            }
            Err(e) => report.failures.push(e),
        }
    }

    Ok(report)
}
