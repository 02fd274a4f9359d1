//! Authored encounter data.
//!
//! Encounters are written by hand in RON with plain decimal numbers.
//! The types here are the deserialization targets; they convert to the
//! fixed-point runtime types at the load boundary and nowhere else.
//!
//! **Note:** This module contains no IO - it only parses strings.
//! File loading is handled by `skirmish_headless` and `skirmish_tools`.

mod encounter_data;
mod rules_data;

pub use encounter_data::{EncounterData, ParticipantData, ParticipantKind, PointData, WallData};
pub use rules_data::{AttackData, MoveData, RulesData};
