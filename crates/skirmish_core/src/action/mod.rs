//! Action lifecycle.
//!
//! An action is a transient behaviour bound to one actor for part of one
//! turn. It owns everything it creates while it runs (guide lines, range
//! overlays, target selectors) in an [`Attachments`] arena, and
//! [`ActiveAction::teardown`] releases all of it. Completion and
//! cancellation both go through that single teardown so neither path can
//! leak attachments or leave a projected resource change behind.

mod attack;
mod movement;

pub use attack::AttackAction;
pub use movement::MoveAction;

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::events::Outbox;
use crate::fov::FovPolygon;
use crate::math::Vec2Fixed;
use crate::participant::ParticipantId;
use crate::resource::Resource;
use crate::spatial::{Body, SpatialQuery};
use crate::target::Target;

/// The actions an actor can have in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Walk toward the pointer.
    Move,
    /// Hit a participant within range.
    Attack,
}

impl ActionKind {
    /// Lowercase name for logs and protocol output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
        }
    }
}

/// Whether an action still wants input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Keep the action alive.
    Pending,
    /// The action is done; tear it down.
    Complete,
}

/// Ephemeral render objects owned by an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visual {
    /// Line from the actor to the projected move destination.
    GuideLine {
        /// Line start.
        from: Vec2Fixed,
        /// Line end.
        to: Vec2Fixed,
    },
    /// Area an attack can reach.
    RangeOverlay(FovPolygon),
}

/// What a teardown released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Release {
    /// Visuals dropped.
    pub visuals: usize,
    /// Targets dropped.
    pub targets: usize,
}

/// Arena of everything an action created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachments {
    visuals: Vec<Visual>,
    targets: Vec<Target>,
}

impl Attachments {
    /// Add a visual; returns its slot.
    pub fn add_visual(&mut self, visual: Visual) -> usize {
        self.visuals.push(visual);
        self.visuals.len() - 1
    }

    /// Add a target selector.
    pub fn add_target(&mut self, target: Target) {
        self.targets.push(target);
    }

    /// Mutable access to a visual slot.
    pub fn visual_mut(&mut self, slot: usize) -> Option<&mut Visual> {
        self.visuals.get_mut(slot)
    }

    /// Owned visuals.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        &self.visuals
    }

    /// Owned targets.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Mutable access to the targets.
    pub fn targets_mut(&mut self) -> &mut [Target] {
        &mut self.targets
    }

    /// Drop everything, reporting what was released.
    pub fn release(&mut self) -> Release {
        let released = Release {
            visuals: self.visuals.len(),
            targets: self.targets.len(),
        };
        self.visuals.clear();
        self.targets.clear();
        released
    }
}

/// What an action can see and touch while it runs.
pub struct ActionContext<'a> {
    /// Owning actor.
    pub owner: ParticipantId,
    /// Owner's body (moves write the new position here).
    pub body: &'a mut Body,
    /// Owner's stamina.
    pub stamina: &'a mut Resource,
    /// Pointer position this tick.
    pub pointer: Vec2Fixed,
    /// Collision queries.
    pub spatial: &'a dyn SpatialQuery,
    /// Combat rules.
    pub rules: &'a RulesConfig,
    /// Event and effect sink.
    pub out: &'a mut Outbox,
}

/// The action an actor is currently performing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveAction {
    /// Move in progress.
    Move(MoveAction),
    /// Attack in progress.
    Attack(AttackAction),
}

impl ActiveAction {
    /// Instantiate an action of `kind` for the context's owner.
    ///
    /// The returned status is [`ActionStatus::Complete`] when the action
    /// finished on start (for example an unaffordable attack).
    pub fn begin(kind: ActionKind, ctx: &mut ActionContext<'_>) -> (Self, ActionStatus) {
        match kind {
            ActionKind::Move => {
                let (action, status) = MoveAction::begin(ctx);
                (Self::Move(action), status)
            }
            ActionKind::Attack => {
                let (action, status) = AttackAction::begin(ctx);
                (Self::Attack(action), status)
            }
        }
    }

    /// Kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Move(_) => ActionKind::Move,
            Self::Attack(_) => ActionKind::Attack,
        }
    }

    /// Per-tick refresh from the pointer position.
    pub fn update(&mut self, ctx: &mut ActionContext<'_>) {
        match self {
            Self::Move(action) => action.update(ctx),
            Self::Attack(action) => action.update(ctx),
        }
    }

    /// Handle the confirm input (primary click).
    pub fn confirm(&mut self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        match self {
            Self::Move(action) => action.confirm(ctx),
            Self::Attack(action) => action.confirm(ctx),
        }
    }

    fn attachments(&self) -> &Attachments {
        match self {
            Self::Move(action) => action.attachments(),
            Self::Attack(action) => action.attachments(),
        }
    }

    fn attachments_mut(&mut self) -> &mut Attachments {
        match self {
            Self::Move(action) => action.attachments_mut(),
            Self::Attack(action) => action.attachments_mut(),
        }
    }

    /// Visuals currently owned by the action.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        self.attachments().visuals()
    }

    /// Targets currently owned by the action.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        self.attachments().targets()
    }

    /// Release every attachment and clear the projected stamina change.
    ///
    /// Shared by completion, cancellation and end-of-turn cleanup.
    pub fn teardown(mut self, stamina: &mut Resource) -> Release {
        stamina.clear_delta();
        self.attachments_mut().release()
    }
}
