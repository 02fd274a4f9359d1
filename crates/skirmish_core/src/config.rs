//! Combat rules.
//!
//! Defaults reproduce the prototype's tuning: a 1-damage attack with a
//! reach of 3 units costing 5 stamina, drawn with 500 rays.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::fov::DEFAULT_RAY_COUNT;
use crate::math::{fixed_serde, Fixed, ARENA_LIMIT};

/// Rules for the attack action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackRules {
    /// Health removed from the selected target.
    #[serde(with = "fixed_serde")]
    pub damage: Fixed,
    /// Radius of the range polygon.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Stamina spent when the attack lands.
    #[serde(with = "fixed_serde")]
    pub stamina_cost: Fixed,
    /// Rays used to build the range polygon.
    pub ray_count: u32,
}

impl Default for AttackRules {
    fn default() -> Self {
        Self {
            damage: Fixed::ONE,
            range: Fixed::from_num(3),
            stamina_cost: Fixed::from_num(5),
            ray_count: DEFAULT_RAY_COUNT,
        }
    }
}

/// Rules for the move action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRules {
    /// Gap kept between a moving body and whatever stops it.
    #[serde(with = "fixed_serde")]
    pub clearance: Fixed,
}

impl Default for MoveRules {
    fn default() -> Self {
        Self {
            clearance: Fixed::ONE / Fixed::from_num(10),
        }
    }
}

/// All tunable combat rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Attack tuning.
    pub attack: AttackRules,
    /// Movement tuning.
    pub movement: MoveRules,
}

impl RulesConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.attack.damage < Fixed::ZERO, "attack.damage must not be negative"),
            (self.attack.range <= Fixed::ZERO, "attack.range must be positive"),
            (self.attack.range > ARENA_LIMIT, "attack.range exceeds the arena limit"),
            (
                self.attack.stamina_cost < Fixed::ZERO,
                "attack.stamina_cost must not be negative",
            ),
            (self.attack.ray_count == 0, "attack.ray_count must be at least 1"),
            (
                self.movement.clearance < Fixed::ZERO,
                "movement.clearance must not be negative",
            ),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(GameError::InvalidData((*message).to_string())),
            None => Ok(()),
        }
    }
}
