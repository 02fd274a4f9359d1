//! # Skirmish Core
//!
//! Deterministic turn-based tactical combat core.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO apart from replay files
//! - No input devices (the host hands in one [`input::InputFrame`] per tick)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and scripted encounters
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`session`] - Tick loop, participants and turn handoff
//! - [`turn`] - Round-robin turn order
//! - [`participant`] / [`actor`] - Participant lifecycle and player input
//! - [`action`] - Move and attack actions and what they own
//! - [`fov`] - Ray-cast range polygons
//! - [`spatial`] - Collision queries the core relies on
//! - [`data`] - Authored encounter definitions
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod actor;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod fov;
pub mod input;
pub mod math;
pub mod participant;
pub mod replay;
pub mod resource;
pub mod scheduler;
pub mod session;
pub mod spatial;
pub mod target;
pub mod turn;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{ActionKind, ActiveAction, Visual};
    pub use crate::actor::{Actor, ActorStats, Rejection};
    pub use crate::config::RulesConfig;
    pub use crate::data::EncounterData;
    pub use crate::error::{GameError, Result};
    pub use crate::events::{ActionEnd, CombatEvent, TickEvents};
    pub use crate::fov::{FovParams, FovPolygon};
    pub use crate::input::{Button, InputEvent, InputFrame, Key};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::participant::{Participant, ParticipantId, Role, Sentinel};
    pub use crate::resource::Resource;
    pub use crate::session::{CombatSession, Outcome, SessionSnapshot};
    pub use crate::spatial::{ArenaView, Body, SpatialQuery, Wall};
    pub use crate::turn::TurnTracker;
}
