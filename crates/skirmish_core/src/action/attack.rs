//! Attack action: pick a participant inside the range polygon and hit it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ActionContext, ActionStatus, Attachments, Visual};
use crate::events::{CombatEvent, Effect};
use crate::fov::{FovParams, FovPolygon};
use crate::participant::ParticipantId;
use crate::spatial::OverlapFilter;
use crate::target::Target;

/// A pending attack.
///
/// On start the range polygon is attached as a visual and every other
/// live participant inside it gets a [`Target`]. The attack stays open
/// until a highlighted target is clicked or the action is cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackAction {
    attachments: Attachments,
}

impl AttackAction {
    pub(super) fn begin(ctx: &mut ActionContext<'_>) -> (Self, ActionStatus) {
        let rules = ctx.rules.attack;

        if !ctx.stamina.can_afford(rules.stamina_cost) {
            debug!(
                participant = %ctx.owner,
                required = %rules.stamina_cost,
                available = %ctx.stamina.current(),
                "Not enough stamina to attack"
            );
            ctx.out.emit(CombatEvent::InsufficientResource {
                participant: ctx.owner,
                kind: super::ActionKind::Attack,
                required: rules.stamina_cost,
                available: ctx.stamina.current(),
            });
            return (Self::default(), ActionStatus::Complete);
        }

        ctx.stamina.set_delta(rules.stamina_cost);

        let range = FovPolygon::build(
            ctx.body.position,
            FovParams::full_circle(rules.range, rules.ray_count),
            ctx.spatial,
        );
        let candidates = ctx
            .spatial
            .entities_overlapping(&range, OverlapFilter::others_than(ctx.owner));

        let mut attachments = Attachments::default();
        attachments.add_visual(Visual::RangeOverlay(range));
        for host in candidates {
            attachments.add_target(Target::new(host));
        }
        debug!(
            participant = %ctx.owner,
            targets = attachments.targets().len(),
            "Attack range built"
        );

        let mut action = Self { attachments };
        action.update(ctx);
        (action, ActionStatus::Pending)
    }

    /// Participants this attack can hit.
    pub fn candidates(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.attachments.targets().iter().map(Target::host)
    }

    pub(super) fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub(super) fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }

    pub(super) fn update(&mut self, ctx: &mut ActionContext<'_>) {
        for target in self.attachments.targets_mut() {
            target.refresh(ctx.pointer, ctx.spatial);
        }
    }

    pub(super) fn confirm(&mut self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let Some(target) = self.attachments.targets().iter().find_map(Target::selection) else {
            return ActionStatus::Pending;
        };

        let rules = ctx.rules.attack;
        ctx.out.request(Effect::Damage {
            source: ctx.owner,
            target,
            amount: rules.damage,
        });
        ctx.stamina.drain(rules.stamina_cost);
        debug!(participant = %ctx.owner, %target, "Attack landed");
        ActionStatus::Complete
    }
}
