//! Encounter loading for headless runs.
//!
//! A scenario is a validated [`EncounterData`] plus the id it was loaded
//! under. Ids resolve to a built-in encounter, a RON file path, or a file
//! under `assets/encounters/`.

use std::path::{Path, PathBuf};

use skirmish_core::action::ActionKind;
use skirmish_core::data::{
    EncounterData, ParticipantData, ParticipantKind, PointData, RulesData, WallData,
};
use skirmish_core::error::GameError;
use skirmish_core::events::TickEvents;
use skirmish_core::math::Fixed;
use skirmish_core::session::CombatSession;
use thiserror::Error;
use tracing::debug;

/// Directory searched for encounter ids that are not paths.
pub const ENCOUNTER_DIR: &str = "assets/encounters";

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Encounter file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read encounter file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse encounter: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The encounter parsed but cannot run.
    #[error(transparent)]
    Invalid(#[from] GameError),
    /// A frame script line could not be used.
    #[error("Script line {line}: {message}")]
    Script {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

/// A loaded, validated encounter.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Id the scenario was requested under.
    pub id: String,
    /// Encounter definition.
    pub encounter: EncounterData,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let id = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        Self::from_ron_str(id, &contents)
    }

    /// Load from a RON string (useful for embedded encounters).
    pub fn from_ron_str(id: impl Into<String>, ron: &str) -> Result<Self, ScenarioError> {
        let encounter: EncounterData = ron::from_str(ron)?;
        Self::new(id, encounter)
    }

    /// Wrap already-parsed data after validating it.
    pub fn new(id: impl Into<String>, encounter: EncounterData) -> Result<Self, ScenarioError> {
        encounter.validate()?;
        Ok(Self {
            id: id.into(),
            encounter,
        })
    }

    /// Resolve an id: `duel` is built in, anything else is tried as a
    /// path and then as `assets/encounters/<id>.ron`.
    pub fn resolve(id: &str) -> Result<Self, ScenarioError> {
        if id == "duel" {
            return Ok(Self::duel());
        }
        let direct = PathBuf::from(id);
        if direct.exists() {
            return Self::load(direct);
        }
        let in_assets = Path::new(ENCOUNTER_DIR).join(format!("{id}.ron"));
        debug!(path = %in_assets.display(), "Looking up encounter in assets");
        Self::load(in_assets)
    }

    /// The standard two-actor duel in an open arena with one wall.
    #[must_use]
    pub fn duel() -> Self {
        let actor = |name: &str, x: i32| ParticipantData {
            name: name.to_string(),
            kind: ParticipantKind::Actor {
                stamina: Fixed::from_num(10),
                health: Fixed::from_num(3),
                actions: vec![ActionKind::Move, ActionKind::Attack],
            },
            position: point(x, 0),
            radius: Fixed::ONE / Fixed::from_num(2),
        };

        Self {
            id: "duel".to_string(),
            encounter: EncounterData {
                name: "duel".to_string(),
                description: "Two actors, three units apart, with cover to the north".to_string(),
                rules: RulesData::default(),
                walls: vec![WallData {
                    from: point(-5, 4),
                    to: point(5, 4),
                }],
                participants: vec![actor("Red", 0), actor("Blue", 3)],
            },
        }
    }

    /// Build and start a fresh session. Returns the opening events too.
    pub fn start(&self) -> Result<(CombatSession, TickEvents), ScenarioError> {
        let mut session = self.encounter.build()?;
        let opening = session.start()?;
        Ok((session, opening))
    }
}

fn point(x: i32, y: i32) -> PointData {
    PointData {
        x: Fixed::from_num(x),
        y: Fixed::from_num(y),
    }
}
