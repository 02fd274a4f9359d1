//! Events and effects produced while a tick runs.
//!
//! [`CombatEvent`]s are notifications for the presentation layer (turn
//! changes, moves, hits). [`Effect`]s are requests a participant makes
//! that only the session can carry out, because they touch another
//! participant or the turn order.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::actor::Rejection;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::participant::ParticipantId;

/// Why an action stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEnd {
    /// The action finished its work.
    Completed,
    /// The player cancelled it.
    Cancelled,
    /// The turn ended while it was running.
    TurnEnded,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    /// A participant's turn began.
    TurnStarted {
        /// Acting participant.
        participant: ParticipantId,
        /// Round number (1-based).
        round: u32,
    },
    /// A participant's turn ended; the next one starts on the following tick.
    TurnEnded {
        /// Participant that finished.
        participant: ParticipantId,
    },
    /// An action became active.
    ActionStarted {
        /// Acting participant.
        participant: ParticipantId,
        /// Kind of action.
        kind: ActionKind,
    },
    /// An action was torn down.
    ActionEnded {
        /// Acting participant.
        participant: ParticipantId,
        /// Kind of action.
        kind: ActionKind,
        /// Why it stopped.
        reason: ActionEnd,
    },
    /// A request was ignored.
    ActionRejected {
        /// Requesting participant.
        participant: ParticipantId,
        /// Reason.
        reason: Rejection,
    },
    /// An action could not be paid for and completed without effect.
    InsufficientResource {
        /// Acting participant.
        participant: ParticipantId,
        /// Kind of action.
        kind: ActionKind,
        /// Required amount.
        #[serde(with = "fixed_serde")]
        required: Fixed,
        /// Available amount.
        #[serde(with = "fixed_serde")]
        available: Fixed,
    },
    /// A participant moved.
    Moved {
        /// Moving participant.
        participant: ParticipantId,
        /// Start position.
        from: Vec2Fixed,
        /// End position.
        to: Vec2Fixed,
        /// Stamina spent.
        #[serde(with = "fixed_serde")]
        cost: Fixed,
    },
    /// A participant took damage.
    Damaged {
        /// Attacking participant.
        source: ParticipantId,
        /// Damaged participant.
        target: ParticipantId,
        /// Health removed.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
        /// Health left.
        #[serde(with = "fixed_serde")]
        remaining: Fixed,
    },
    /// A participant's health reached zero; it leaves the rotation.
    Defeated {
        /// Defeated participant.
        participant: ParticipantId,
    },
}

/// A request only the session can fulfil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Deal damage to another participant.
    Damage {
        /// Attacker.
        source: ParticipantId,
        /// Receiver.
        target: ParticipantId,
        /// Amount of health to remove.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
    },
    /// The participant ended its turn; schedule the handoff.
    TurnEnded(ParticipantId),
}

/// Collects events and effects while hooks run.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    /// Notifications, in the order they happened.
    pub events: Vec<CombatEvent>,
    /// Requests for the session.
    pub effects: Vec<Effect>,
}

impl Outbox {
    /// Record a notification.
    pub fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    /// Record a request.
    pub fn request(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Take the pending requests, leaving the list empty.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

/// Events generated during a session tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick the events belong to.
    pub tick: u64,
    /// Events in order.
    pub events: Vec<CombatEvent>,
}

impl TickEvents {
    /// Whether any event matches `pred`.
    pub fn any(&self, pred: impl Fn(&CombatEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }

    /// Participant whose turn started this tick, if any.
    #[must_use]
    pub fn turn_started(&self) -> Option<ParticipantId> {
        self.events.iter().find_map(|e| match e {
            CombatEvent::TurnStarted { participant, .. } => Some(*participant),
            _ => None,
        })
    }
}
