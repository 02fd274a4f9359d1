//! Hover/click selectors attached to candidate participants.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::participant::ParticipantId;
use crate::spatial::SpatialQuery;

/// A selectable recipient for a targeted action.
///
/// Each target belongs to exactly one action. Several actions may target
/// the same participant, but they never share `Target` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    host: ParticipantId,
    highlighted: bool,
}

impl Target {
    /// Create an unhighlighted target on `host`.
    #[must_use]
    pub const fn new(host: ParticipantId) -> Self {
        Self {
            host,
            highlighted: false,
        }
    }

    /// The participant this target sits on.
    #[must_use]
    pub const fn host(&self) -> ParticipantId {
        self.host
    }

    /// Whether the pointer is currently over the host.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Update the highlight from the pointer position.
    ///
    /// Returns true if the highlight changed.
    pub fn refresh(&mut self, pointer: Vec2Fixed, spatial: &dyn SpatialQuery) -> bool {
        let over = spatial.hit_test(pointer).contains(&self.host);
        let changed = over != self.highlighted;
        self.highlighted = over;
        changed
    }

    /// The host, if a click now would select it.
    #[must_use]
    pub fn selection(&self) -> Option<ParticipantId> {
        self.highlighted.then_some(self.host)
    }
}
