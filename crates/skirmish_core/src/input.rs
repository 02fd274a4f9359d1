//! Device-independent input events.
//!
//! The host polls its devices once per tick and hands the core one
//! [`InputFrame`]. The core never talks to a keyboard or mouse API.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Confirm / select (left click).
    Primary,
    /// Cancel (right click).
    Secondary,
}

/// Logical keys the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Number row key `0`-`9`.
    Digit(u8),
    /// Cancel the active action.
    Cancel,
    /// End the current turn (fires on release).
    EndTurn,
    /// Log the acting participant's name.
    Announce,
}

/// A discrete input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer button pressed.
    PointerDown(Button),
    /// Pointer button released.
    PointerUp(Button),
    /// Key pressed.
    KeyDown(Key),
    /// Key released.
    KeyUp(Key),
}

impl InputEvent {
    /// Whether this event asks to cancel the active action.
    #[must_use]
    pub const fn is_cancel(self) -> bool {
        matches!(
            self,
            Self::KeyDown(Key::Cancel) | Self::PointerDown(Button::Secondary)
        )
    }
}

/// Everything the input source reported for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Pointer position in world space.
    pub pointer: Vec2Fixed,
    /// Events in the order they happened.
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    /// A frame with only a pointer position.
    #[must_use]
    pub fn at(pointer: Vec2Fixed) -> Self {
        Self {
            pointer,
            events: Vec::new(),
        }
    }

    /// An empty frame.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builder-style event append.
    #[must_use]
    pub fn with(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Press and release of a key within one frame.
    #[must_use]
    pub fn tap(self, key: Key) -> Self {
        self.with(InputEvent::KeyDown(key)).with(InputEvent::KeyUp(key))
    }

    /// Primary click within one frame.
    #[must_use]
    pub fn click(self) -> Self {
        self.with(InputEvent::PointerDown(Button::Primary))
            .with(InputEvent::PointerUp(Button::Primary))
    }
}

/// Map a number-row digit to a catalog slot.
///
/// Keys `1`-`9` select slots 0-8 and `0` selects slot 9.
#[must_use]
pub const fn hotkey_slot(digit: u8) -> Option<usize> {
    match digit {
        0 => Some(9),
        1..=9 => Some(digit as usize - 1),
        _ => None,
    }
}
