//! Bounded participant resources (stamina, health).

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// A named, bounded quantity owned by a participant.
///
/// `current` always stays within `[0, max]`. `delta` is the projected
/// change of the action in progress, shown by the presentation layer
/// and reset to zero whenever no action is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Display name.
    pub name: String,
    #[serde(with = "fixed_serde")]
    current: Fixed,
    #[serde(with = "fixed_serde")]
    max: Fixed,
    #[serde(with = "fixed_serde")]
    delta: Fixed,
}

/// Read-only copy of a resource for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Display name.
    pub name: String,
    /// Current value.
    #[serde(with = "fixed_serde")]
    pub current: Fixed,
    /// Maximum value.
    #[serde(with = "fixed_serde")]
    pub max: Fixed,
    /// Projected change of the in-progress action.
    #[serde(with = "fixed_serde")]
    pub delta: Fixed,
}

impl Resource {
    /// Create a full resource.
    #[must_use]
    pub fn new(name: impl Into<String>, max: Fixed) -> Self {
        let max = max.max(Fixed::ZERO);
        Self {
            name: name.into(),
            current: max,
            max,
            delta: Fixed::ZERO,
        }
    }

    /// Create a resource with an explicit starting value (clamped).
    #[must_use]
    pub fn with_current(name: impl Into<String>, max: Fixed, current: Fixed) -> Self {
        let mut resource = Self::new(name, max);
        resource.current = current.clamp(Fixed::ZERO, resource.max);
        resource
    }

    /// Current value.
    #[must_use]
    pub const fn current(&self) -> Fixed {
        self.current
    }

    /// Maximum value.
    #[must_use]
    pub const fn max(&self) -> Fixed {
        self.max
    }

    /// Projected change of the in-progress action.
    #[must_use]
    pub const fn delta(&self) -> Fixed {
        self.delta
    }

    /// Whether the resource has been fully drained.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current == Fixed::ZERO
    }

    /// Whether at least `amount` is available.
    #[must_use]
    pub fn can_afford(&self, amount: Fixed) -> bool {
        self.current >= amount
    }

    /// Refill to maximum.
    pub fn refill(&mut self) {
        self.current = self.max;
    }

    /// Reduce the current value, clamping at zero.
    ///
    /// Returns the amount actually removed.
    pub fn drain(&mut self, amount: Fixed) -> Fixed {
        let amount = amount.max(Fixed::ZERO);
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Set the projected change shown while an action is pending.
    pub fn set_delta(&mut self, delta: Fixed) {
        self.delta = delta;
    }

    /// Clear the projected change.
    pub fn clear_delta(&mut self) {
        self.delta = Fixed::ZERO;
    }

    /// Copy out the values for presentation.
    #[must_use]
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            name: self.name.clone(),
            current: self.current,
            max: self.max,
            delta: self.delta,
        }
    }
}
