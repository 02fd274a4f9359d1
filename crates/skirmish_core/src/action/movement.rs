//! Move action: walk toward the pointer, paying stamina per unit travelled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ActionContext, ActionStatus, Attachments, Visual};
use crate::events::CombatEvent;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// A pending move.
///
/// The destination is recomputed every tick from the pointer and is
/// shown as a guide line; the stamina delta shows what committing would
/// cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveAction {
    destination: Vec2Fixed,
    #[serde(with = "fixed_serde")]
    cost: Fixed,
    guide: usize,
    attachments: Attachments,
}

impl MoveAction {
    pub(super) fn begin(ctx: &mut ActionContext<'_>) -> (Self, ActionStatus) {
        let origin = ctx.body.position;
        let mut attachments = Attachments::default();
        let guide = attachments.add_visual(Visual::GuideLine {
            from: origin,
            to: origin,
        });

        let mut action = Self {
            destination: origin,
            cost: Fixed::ZERO,
            guide,
            attachments,
        };
        action.update(ctx);
        (action, ActionStatus::Pending)
    }

    /// Where the actor would end up if the move were confirmed now.
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.destination
    }

    /// Stamina the move would cost now.
    #[must_use]
    pub const fn cost(&self) -> Fixed {
        self.cost
    }

    pub(super) fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub(super) fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }

    pub(super) fn update(&mut self, ctx: &mut ActionContext<'_>) {
        let origin = ctx.body.position;
        let reach = reach_toward(ctx, ctx.pointer);
        let direction = (ctx.pointer - origin).normalize();

        self.destination = origin + direction.scale(reach);
        self.cost = reach;
        ctx.stamina.set_delta(reach);

        if let Some(Visual::GuideLine { from, to }) = self.attachments.visual_mut(self.guide) {
            *from = origin;
            *to = self.destination;
        }
    }

    pub(super) fn confirm(&mut self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let from = ctx.body.position;
        let travelled = self.cost;

        if travelled > Fixed::ZERO {
            ctx.body.position = self.destination;
            let cost = ctx.stamina.drain(travelled);
            ctx.out.emit(CombatEvent::Moved {
                participant: ctx.owner,
                from,
                to: self.destination,
                cost,
            });
            debug!(participant = %ctx.owner, distance = %travelled, "Move committed");
        } else {
            debug!(participant = %ctx.owner, "Move confirmed with nowhere to go");
        }

        ActionStatus::Complete
    }
}

/// Distance the actor can travel toward `pointer` this tick.
///
/// Limited by the pointer distance, the first wall along the way, the
/// actor's stamina and other bodies (keeping the configured clearance).
fn reach_toward(ctx: &ActionContext<'_>, pointer: Vec2Fixed) -> Fixed {
    let origin = ctx.body.position;
    let wanted = origin.distance(pointer);
    if wanted == Fixed::ZERO {
        return Fixed::ZERO;
    }

    let direction = (pointer - origin).normalize();
    let clearance = ctx.rules.movement.clearance;

    let wall = ctx
        .spatial
        .ray_obstruction_distance(origin, direction, wanted);
    // Sweeping the body padded by the clearance stops head-on moves
    // `clearance` short and keeps grazing moves just as far away.
    let body_cap = ctx.spatial.sweep_distance(
        ctx.owner,
        origin,
        ctx.body.radius + clearance,
        direction,
        wanted,
    );

    wanted
        .min(wall)
        .min(ctx.stamina.current())
        .min(body_cap)
        .max(Fixed::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::events::Outbox;
    use crate::participant::ParticipantId;
    use crate::resource::Resource;
    use crate::spatial::{ArenaView, Body, BodyEntry, Wall};

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn v(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    struct Rig {
        body: Body,
        stamina: Resource,
        rules: RulesConfig,
        out: Outbox,
    }

    impl Rig {
        fn new(stamina: i32) -> Self {
            let mut rules = RulesConfig::default();
            rules.movement.clearance = Fixed::ZERO;
            Self {
                body: Body::new(v(0, 0), Fixed::ONE / fx(2)),
                stamina: Resource::new("Stamina", fx(stamina)),
                rules,
                out: Outbox::default(),
            }
        }

        fn ctx<'a>(
            &'a mut self,
            pointer: Vec2Fixed,
            view: &'a ArenaView<'a>,
        ) -> ActionContext<'a> {
            ActionContext {
                owner: ParticipantId(0),
                body: &mut self.body,
                stamina: &mut self.stamina,
                pointer,
                spatial: view,
                rules: &self.rules,
                out: &mut self.out,
            }
        }
    }

    fn near(a: Fixed, b: Fixed) -> bool {
        (a - b).abs() < Fixed::from_num(0.001)
    }

    #[test]
    fn test_reach_limited_by_stamina() {
        let view = ArenaView::new(&[], Vec::new());
        let mut rig = Rig::new(4);
        let (action, status) = MoveAction::begin(&mut rig.ctx(v(10, 0), &view));
        assert_eq!(status, ActionStatus::Pending);
        assert!(near(action.cost(), fx(4)));
        assert!(near(action.destination().x, fx(4)));
        assert!(near(rig.stamina.delta(), fx(4)));
    }

    #[test]
    fn test_reach_limited_by_wall() {
        let walls = [Wall::new(v(3, -5), v(3, 5))];
        let view = ArenaView::new(&walls, Vec::new());
        let mut rig = Rig::new(20);
        let (action, _) = MoveAction::begin(&mut rig.ctx(v(10, 0), &view));
        assert!(action.destination().x <= fx(3));
    }

    #[test]
    fn test_reach_stops_before_other_body() {
        let view = ArenaView::new(
            &[],
            vec![BodyEntry {
                id: ParticipantId(1),
                body: Body::new(v(5, 0), Fixed::ONE / fx(2)),
                defeated: false,
            }],
        );
        let mut rig = Rig::new(20);
        let (action, _) = MoveAction::begin(&mut rig.ctx(v(5, 0), &view));
        // Centers can get no closer than the two radii.
        assert!(near(action.destination().x, fx(4)));
    }

    #[test]
    fn test_confirm_moves_and_spends() {
        let view = ArenaView::new(&[], Vec::new());
        let mut rig = Rig::new(10);
        let (mut action, _) = MoveAction::begin(&mut rig.ctx(v(0, 3), &view));
        let status = action.confirm(&mut rig.ctx(v(0, 3), &view));

        assert_eq!(status, ActionStatus::Complete);
        assert!(near(rig.body.position.y, fx(3)));
        assert!(near(rig.stamina.current(), fx(7)));
        assert!(matches!(rig.out.events[0], CombatEvent::Moved { .. }));
    }

    #[test]
    fn test_pointer_on_self_costs_nothing() {
        let view = ArenaView::new(&[], Vec::new());
        let mut rig = Rig::new(10);
        let (mut action, _) = MoveAction::begin(&mut rig.ctx(v(0, 0), &view));
        assert_eq!(action.cost(), Fixed::ZERO);
        assert_eq!(action.confirm(&mut rig.ctx(v(0, 0), &view)), ActionStatus::Complete);
        assert_eq!(rig.stamina.current(), fx(10));
        assert!(rig.out.events.is_empty());
    }

    #[test]
    fn test_guide_line_tracks_destination() {
        let view = ArenaView::new(&[], Vec::new());
        let mut rig = Rig::new(10);
        let (mut action, _) = MoveAction::begin(&mut rig.ctx(v(2, 0), &view));
        action.update(&mut rig.ctx(v(-2, 0), &view));
        match &action.attachments().visuals()[0] {
            Visual::GuideLine { from, to } => {
                assert_eq!(*from, v(0, 0));
                assert!(near(to.x, fx(-2)));
            }
            other => panic!("unexpected visual: {other:?}"),
        }
    }
}
