//! Test fixtures and helpers.
//!
//! Pre-built sessions and participant configurations
//! for consistent testing.

use fixed::types::I32F32;
use skirmish_core::action::ActionKind;
use skirmish_core::actor::{Actor, ActorStats};
use skirmish_core::config::RulesConfig;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::participant::{Role, Sentinel};
use skirmish_core::session::CombatSession;
use skirmish_core::spatial::{Body, Wall};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer point.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Body of radius 0.5 at an integer point.
#[must_use]
pub fn body_at(x: i32, y: i32) -> Body {
    Body::new(point(x, y), fixed_f(0.5))
}

/// Stamina every fixture actor starts its turn with.
pub const ACTOR_STAMINA: i32 = 10;

/// Health every fixture actor starts with.
pub const ACTOR_HEALTH: i32 = 3;

/// Actor with 10 stamina, 3 health and `[Move, Attack]` on keys 1 and 2.
#[must_use]
pub fn actor_role() -> Role {
    Role::Actor(Actor::new(
        ActorStats {
            stamina: fixed(ACTOR_STAMINA),
            health: fixed(ACTOR_HEALTH),
        },
        vec![ActionKind::Move, ActionKind::Attack],
    ))
}

/// Sentinel with the given health.
#[must_use]
pub fn sentinel_role(health: i32) -> Role {
    Role::Sentinel(Sentinel::new(fixed(health)))
}

/// Rules with a cheaper range polygon so tests stay fast.
#[must_use]
pub fn test_rules() -> RulesConfig {
    let mut rules = RulesConfig::default();
    rules.attack.ray_count = 120;
    rules
}

/// Three actors A, B, C registered in that order, not yet started.
///
/// A is at the origin, B two units east of A and C two units east of B,
/// so every actor has at least one neighbour within attack range.
#[must_use]
pub fn abc_session() -> CombatSession {
    let mut session = CombatSession::new(test_rules(), Vec::new());
    for (name, x) in [("A", 0), ("B", 2), ("C", 4)] {
        session.register(name, body_at(x, 0), actor_role());
    }
    session
}

/// Two actors facing each other, not yet started.
#[must_use]
pub fn duel_session() -> CombatSession {
    let mut session = CombatSession::new(test_rules(), Vec::new());
    session.register("Red", body_at(0, 0), actor_role());
    session.register("Blue", body_at(2, 0), actor_role());
    session
}

/// A walled arena with two actors and a sentinel, not yet started.
///
/// A wall north of the actors blocks movement and vision.
#[must_use]
pub fn arena_session() -> CombatSession {
    let walls = vec![
        Wall::new(point(-6, 3), point(6, 3)),
        Wall::new(point(6, 3), point(6, -6)),
    ];
    let mut session = CombatSession::new(test_rules(), walls);
    session.register("Scout", body_at(0, 0), actor_role());
    session.register("Brute", body_at(3, -1), actor_role());
    session.register("Post", body_at(-3, -2), sentinel_role(2));
    session
}

/// Start a fixture session, panicking on failure (tests only).
///
/// # Panics
///
/// Panics if the session cannot start.
#[must_use]
pub fn started(mut session: CombatSession) -> CombatSession {
    session
        .start()
        .unwrap_or_else(|e| panic!("fixture session failed to start: {e}"));
    session
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_registers_three() {
        let session = abc_session();
        let names: Vec<_> = session
            .participants()
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_started_hands_out_first_turn() {
        let session = started(arena_session());
        assert_eq!(session.current().map(|p| p.display_name()), Some("Scout"));
    }
}
