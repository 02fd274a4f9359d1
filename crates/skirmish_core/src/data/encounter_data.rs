//! Encounter definitions: arena, rules and starting participants.

use serde::{Deserialize, Serialize};

use super::rules_data::RulesData;
use crate::action::ActionKind;
use crate::actor::{Actor, ActorStats};
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, within_limit, Fixed, Vec2Fixed, ARENA_LIMIT};
use crate::participant::{Role, Sentinel};
use crate::session::CombatSession;
use crate::spatial::{Body, Wall};

/// Number of hotkey slots (`1`-`9` and `0`).
const MAX_CATALOG: usize = 10;

/// A point authored with decimal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointData {
    /// X coordinate.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

impl From<PointData> for Vec2Fixed {
    fn from(point: PointData) -> Self {
        Self::new(point.x, point.y)
    }
}

/// An authored wall segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallData {
    /// Segment start.
    pub from: PointData,
    /// Segment end.
    pub to: PointData,
}

/// What kind of participant to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantKind {
    /// Player-controlled actor.
    Actor {
        /// Maximum stamina.
        #[serde(with = "fixed_decimal")]
        stamina: Fixed,
        /// Maximum health.
        #[serde(with = "fixed_decimal")]
        health: Fixed,
        /// Actions bound to hotkeys `1`, `2`, ... in order.
        actions: Vec<ActionKind>,
    },
    /// Passes its turn.
    Sentinel {
        /// Maximum health.
        #[serde(with = "fixed_decimal")]
        health: Fixed,
    },
}

/// One starting participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantData {
    /// Display name.
    pub name: String,
    /// Role and pools.
    pub kind: ParticipantKind,
    /// Starting body center.
    pub position: PointData,
    /// Body radius.
    #[serde(with = "fixed_decimal", default = "default_radius")]
    pub radius: Fixed,
}

fn default_radius() -> Fixed {
    Fixed::ONE / Fixed::from_num(2)
}

/// A complete encounter.
///
/// # Example RON
///
/// ```ron
/// EncounterData(
///     name: "duel",
///     walls: [
///         (from: (x: -5.0, y: 4.0), to: (x: 5.0, y: 4.0)),
///     ],
///     participants: [
///         (
///             name: "Vanguard",
///             kind: Actor(stamina: 10.0, health: 3.0, actions: [move, attack]),
///             position: (x: 0.0, y: 0.0),
///         ),
///         (
///             name: "Training Dummy",
///             kind: Sentinel(health: 2.0),
///             position: (x: 2.0, y: 0.0),
///         ),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterData {
    /// Unique encounter name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Rules overrides.
    #[serde(default)]
    pub rules: RulesData,
    /// Arena walls.
    #[serde(default)]
    pub walls: Vec<WallData>,
    /// Participants in turn order.
    pub participants: Vec<ParticipantData>,
}

impl EncounterData {
    /// Parse an encounter from RON text. `source` names the input in
    /// error messages.
    ///
    /// # Errors
    ///
    /// [`GameError::DataParseError`] if the text is not a valid encounter.
    pub fn from_ron_str(source: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Check the encounter for values the session cannot run with.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidData`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("encounter name is empty"));
        }
        if self.participants.is_empty() {
            return Err(invalid(format!("encounter '{}' has no participants", self.name)));
        }
        self.rules.to_config().validate()?;

        for (i, wall) in self.walls.iter().enumerate() {
            if wall.from == wall.to {
                return Err(invalid(format!("wall {i} has zero length")));
            }
            let (from, to) = (Vec2Fixed::from(wall.from), Vec2Fixed::from(wall.to));
            if !from.within_arena() || !to.within_arena() {
                return Err(invalid(format!("wall {i} lies outside ±{ARENA_LIMIT}")));
            }
        }

        for participant in &self.participants {
            let name = &participant.name;
            if name.trim().is_empty() {
                return Err(invalid("participant name is empty"));
            }
            if self.participants.iter().filter(|p| &p.name == name).count() > 1 {
                return Err(invalid(format!("duplicate participant name '{name}'")));
            }
            if participant.radius <= Fixed::ZERO || !within_limit(participant.radius) {
                return Err(invalid(format!("'{name}' must have a positive radius")));
            }
            if !Vec2Fixed::from(participant.position).within_arena() {
                return Err(invalid(format!("'{name}' starts outside ±{ARENA_LIMIT}")));
            }

            match &participant.kind {
                ParticipantKind::Actor {
                    stamina,
                    health,
                    actions,
                } => {
                    if *stamina < Fixed::ZERO {
                        return Err(invalid(format!("'{name}' has negative stamina")));
                    }
                    if *health <= Fixed::ZERO {
                        return Err(invalid(format!("'{name}' must start with health")));
                    }
                    if actions.len() > MAX_CATALOG {
                        return Err(invalid(format!(
                            "'{name}' has {} actions but only {MAX_CATALOG} hotkeys exist",
                            actions.len()
                        )));
                    }
                }
                ParticipantKind::Sentinel { health } => {
                    if *health <= Fixed::ZERO {
                        return Err(invalid(format!("'{name}' must start with health")));
                    }
                }
            }
        }

        Ok(())
    }

    /// Validate and build an unstarted session.
    ///
    /// # Errors
    ///
    /// Returns the validation error, if any.
    pub fn build(&self) -> Result<CombatSession> {
        self.validate()?;

        let walls = self
            .walls
            .iter()
            .map(|wall| Wall::new(wall.from.into(), wall.to.into()))
            .collect();
        let mut session = CombatSession::new(self.rules.to_config(), walls);

        for participant in &self.participants {
            let body = Body::new(participant.position.into(), participant.radius);
            let role = match &participant.kind {
                ParticipantKind::Actor {
                    stamina,
                    health,
                    actions,
                } => Role::Actor(Actor::new(
                    ActorStats {
                        stamina: *stamina,
                        health: *health,
                    },
                    actions.clone(),
                )),
                ParticipantKind::Sentinel { health } => Role::Sentinel(Sentinel::new(*health)),
            };
            session
                .register(participant.name.clone(), body, role)
                .ok_or_else(|| GameError::InvalidState("session refused registration".into()))?;
        }

        Ok(session)
    }
}

fn invalid(message: impl Into<String>) -> GameError {
    GameError::InvalidData(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = r#"
        EncounterData(
            name: "duel",
            walls: [
                (from: (x: -5.0, y: 4.0), to: (x: 5.0, y: 4.0)),
            ],
            participants: [
                (
                    name: "Vanguard",
                    kind: Actor(stamina: 10.0, health: 3.0, actions: [move, attack]),
                    position: (x: 0.0, y: 0.0),
                ),
                (
                    name: "Dummy",
                    kind: Sentinel(health: 2.0),
                    position: (x: 2.0, y: 0.0),
                    radius: 0.75,
                ),
            ],
        )
    "#;

    #[test]
    fn test_parse_and_build() {
        let data = EncounterData::from_ron_str("duel.ron", DUEL).unwrap();
        assert_eq!(data.participants.len(), 2);
        assert_eq!(data.participants[0].radius, Fixed::ONE / Fixed::from_num(2));
        assert_eq!(data.participants[1].radius, Fixed::from_num(0.75));

        let session = data.build().unwrap();
        assert_eq!(session.participants().len(), 2);
        assert_eq!(session.walls().len(), 1);
        assert_eq!(session.participants()[0].display_name(), "Vanguard");
        assert!(session.participants()[1].actor().is_none());
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = EncounterData::from_ron_str("broken.ron", "EncounterData(").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut data = EncounterData::from_ron_str("duel.ron", DUEL).unwrap();
        data.participants[1].name = "Vanguard".to_string();
        assert!(data.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_rejects_far_positions() {
        let mut data = EncounterData::from_ron_str("duel.ron", DUEL).unwrap();
        data.participants[1].position.x = Fixed::from_num(50_000);
        assert!(data.validate().unwrap_err().to_string().contains("outside"));

        let mut data = EncounterData::from_ron_str("duel.ron", DUEL).unwrap();
        data.walls[0].to.y = Fixed::from_num(-20_000);
        assert!(data.validate().unwrap_err().to_string().contains("outside"));
    }

    #[test]
    fn test_validate_rejects_empty_encounter() {
        let mut data = EncounterData::from_ron_str("duel.ron", DUEL).unwrap();
        data.participants.clear();
        assert!(data.build().is_err());
    }
}
