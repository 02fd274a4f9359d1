//! JSON protocol for headless encounter control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Events, state and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}` and the opening turn events
//! 2. The controller sends one `input` command per tick it wants to play
//! 3. Runner outputs the events each tick produced
//! 4. When one participant is left standing, outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","encounter":"duel","tick":0}
//! <- {"type":"events","tick":0,"events":[{"event":"turn_started",...}]}
//! -> {"cmd":"input","x":2.0,"y":0.0,"events":[{"key_down":{"digit":2}}]}
//! <- {"type":"events","tick":0,"events":[{"event":"action_started",...}]}
//! -> {"cmd":"input","x":2.0,"y":0.0,"events":[{"pointer_down":"primary"}]}
//! <- {"type":"events","tick":1,"events":[{"event":"damaged",...},...]}
//! -> {"cmd":"input","x":2.0,"y":0.0,"events":[{"key_up":"end_turn"}]}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":3,"round":1,...}
//! ```
//!
//! Event payloads are the core's own serialization: fixed-point fields
//! carry raw `I32F32` bits. State responses convert to decimals.

use serde::{Deserialize, Serialize};

use skirmish_core::action::Visual;
use skirmish_core::events::CombatEvent;
use skirmish_core::input::{InputEvent, InputFrame};
use skirmish_core::math::{within_limit, Fixed, Vec2Fixed, ARENA_LIMIT};
use skirmish_core::participant::ParticipantSnapshot;
use skirmish_core::resource::ResourceSnapshot;
use skirmish_core::session::{CombatSession, Outcome};

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Most ticks a single `tick` command may play.
pub const MAX_TICK_COUNT: u32 = 10_000;

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Play one tick with this pointer position and these events.
    Input {
        x: f64,
        y: f64,
        #[serde(default)]
        events: Vec<InputEvent>,
    },

    /// Play N ticks without events at the last pointer position (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query the current state without advancing time.
    Query,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Replace the running encounter.
    LoadEncounter { path: String },

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        encounter: String,
        tick: u64,
    },

    /// Acknowledgment of a command that produced nothing else.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Events produced by one tick.
    Events { tick: u64, events: Vec<CombatEvent> },

    /// Current session state.
    State(StateView),

    /// Only one participant (or nobody) is left standing.
    GameOver { outcome: Outcome, tick: u64 },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Full state report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub tick: u64,
    pub round: u32,
    pub current: Option<u32>,
    pub participants: Vec<ParticipantState>,
    pub visuals: Vec<VisualState>,
    pub outcome: Outcome,
    pub hash: u64,
}

/// State of a single participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub id: u32,
    pub name: String,
    pub is_turn: bool,
    pub defeated: bool,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub resources: Vec<ResourceState>,
}

/// One resource bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub name: String,
    pub current: f64,
    pub max: f64,
    pub delta: f64,
}

/// A visual the acting participant currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualState {
    GuideLine {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },
    RangeOverlay { x: f64, y: f64, vertex_count: usize },
}

fn decimal(value: Fixed) -> f64 {
    value.to_num::<f64>()
}

impl From<&ResourceSnapshot> for ResourceState {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            current: decimal(snapshot.current),
            max: decimal(snapshot.max),
            delta: decimal(snapshot.delta),
        }
    }
}

impl From<&ParticipantSnapshot> for ParticipantState {
    fn from(snapshot: &ParticipantSnapshot) -> Self {
        Self {
            id: snapshot.id.0,
            name: snapshot.name.clone(),
            is_turn: snapshot.is_turn,
            defeated: snapshot.defeated,
            x: decimal(snapshot.position.x),
            y: decimal(snapshot.position.y),
            radius: decimal(snapshot.radius),
            resources: snapshot.resources.iter().map(ResourceState::from).collect(),
        }
    }
}

impl From<&Visual> for VisualState {
    fn from(visual: &Visual) -> Self {
        match visual {
            Visual::GuideLine { from, to } => Self::GuideLine {
                from_x: decimal(from.x),
                from_y: decimal(from.y),
                to_x: decimal(to.x),
                to_y: decimal(to.y),
            },
            Visual::RangeOverlay(polygon) => Self::RangeOverlay {
                x: decimal(polygon.origin().x),
                y: decimal(polygon.origin().y),
                vertex_count: polygon.vertices().len(),
            },
        }
    }
}

impl StateView {
    /// Capture a session.
    #[must_use]
    pub fn capture(session: &CombatSession) -> Self {
        let snapshot = session.snapshot();
        Self {
            tick: snapshot.tick,
            round: snapshot.round,
            current: snapshot.current.map(|id| id.0),
            participants: snapshot.participants.iter().map(ParticipantState::from).collect(),
            visuals: snapshot.visuals.iter().map(VisualState::from).collect(),
            outcome: session.outcome(),
            hash: session.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(encounter: &str, tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            encounter: encounter.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::LoadEncounter { .. } => "load_encounter",
            Self::Quit => "quit",
        }
    }

    /// Frames this command plays. `pointer` carries the last pointer
    /// position between commands and is updated by `input`.
    ///
    /// Commands that do not advance time give no frames.
    ///
    /// # Errors
    ///
    /// Returns a message if a coordinate is not a finite number within
    /// the arena limit, or if a tick count exceeds [`MAX_TICK_COUNT`].
    pub fn frames(&self, pointer: &mut Vec2Fixed) -> Result<Vec<InputFrame>, String> {
        match self {
            Self::Input { x, y, events } => {
                *pointer = Vec2Fixed::new(coordinate(*x)?, coordinate(*y)?);
                Ok(vec![InputFrame {
                    pointer: *pointer,
                    events: events.clone(),
                }])
            }
            Self::Tick { count } if *count > MAX_TICK_COUNT => Err(format!(
                "tick count {count} exceeds the limit of {MAX_TICK_COUNT}"
            )),
            Self::Tick { count } => Ok((0..*count).map(|_| InputFrame::at(*pointer)).collect()),
            _ => Ok(Vec::new()),
        }
    }
}

fn coordinate(value: f64) -> Result<Fixed, String> {
    Fixed::checked_from_num(value)
        .filter(|v| within_limit(*v))
        .ok_or_else(|| format!("coordinate out of range (±{ARENA_LIMIT}): {value}"))
}
