//! Rules as authored in encounter files.

use serde::{Deserialize, Serialize};

use crate::config::{AttackRules, MoveRules, RulesConfig};
use crate::fov::DEFAULT_RAY_COUNT;
use crate::math::{fixed_decimal, Fixed};

/// Attack tuning. Every field is optional in RON.
///
/// # Example RON
///
/// ```ron
/// AttackData(
///     damage: 1.0,
///     range: 3.0,
///     stamina_cost: 5.0,
///     ray_count: 500,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackData {
    /// Health removed per hit.
    #[serde(with = "fixed_decimal")]
    pub damage: Fixed,
    /// Range polygon radius.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Stamina spent per hit.
    #[serde(with = "fixed_decimal")]
    pub stamina_cost: Fixed,
    /// Rays in the range polygon.
    pub ray_count: u32,
}

impl Default for AttackData {
    fn default() -> Self {
        let rules = AttackRules::default();
        Self {
            damage: rules.damage,
            range: rules.range,
            stamina_cost: rules.stamina_cost,
            ray_count: DEFAULT_RAY_COUNT,
        }
    }
}

/// Movement tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveData {
    /// Gap kept between a moving body and obstacles.
    #[serde(with = "fixed_decimal")]
    pub clearance: Fixed,
}

impl Default for MoveData {
    fn default() -> Self {
        Self {
            clearance: MoveRules::default().clearance,
        }
    }
}

/// All authored rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesData {
    /// Attack tuning.
    pub attack: AttackData,
    /// Movement tuning.
    pub movement: MoveData,
}

impl RulesData {
    /// Convert to runtime rules.
    #[must_use]
    pub fn to_config(&self) -> RulesConfig {
        RulesConfig {
            attack: AttackRules {
                damage: self.attack.damage,
                range: self.attack.range,
                stamina_cost: self.attack.stamina_cost,
                ray_count: self.attack.ray_count,
            },
            movement: MoveRules {
                clearance: self.movement.clearance,
            },
        }
    }
}
