//! Player-controlled participants.
//!
//! An [`Actor`] owns stamina, health, a catalog of actions bound to the
//! number-row hotkeys and at most one running action. It refills stamina
//! when its turn starts and tears down whatever is still running when
//! the turn ends.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::action::{ActionContext, ActionKind, ActionStatus, ActiveAction, Visual};
use crate::events::{ActionEnd, CombatEvent, Outbox};
use crate::input::{hotkey_slot, Button, InputEvent, Key};
use crate::math::Fixed;
use crate::participant::{ParticipantId, TickEnv};
use crate::resource::Resource;
use crate::spatial::Body;

/// Why an action request was ignored.
///
/// These are ordinary gameplay outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slot", rename_all = "snake_case")]
pub enum Rejection {
    /// The participant is not acting.
    #[error("not this participant's turn")]
    NotYourTurn,
    /// Another action is still running.
    #[error("an action is already in progress")]
    ActionInProgress,
    /// The hotkey does not map to a catalog entry.
    #[error("no action in slot {0}")]
    NoSuchSlot(usize),
    /// The participant cannot perform actions at all.
    #[error("participant has no actions")]
    NoActions,
    /// The participant is out of the fight.
    #[error("participant is defeated")]
    Defeated,
}

/// Stamina and health pools a new actor starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorStats {
    /// Maximum stamina, refilled every turn.
    pub stamina: Fixed,
    /// Maximum health.
    pub health: Fixed,
}

/// A participant that acts on player input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    stamina: Resource,
    health: Resource,
    catalog: Vec<ActionKind>,
    current_action: Option<ActiveAction>,
}

impl Actor {
    /// Create an actor with full pools.
    #[must_use]
    pub fn new(stats: ActorStats, catalog: Vec<ActionKind>) -> Self {
        Self {
            stamina: Resource::new("Stamina", stats.stamina),
            health: Resource::new("Health", stats.health),
            catalog,
            current_action: None,
        }
    }

    /// Stamina pool.
    #[must_use]
    pub const fn stamina(&self) -> &Resource {
        &self.stamina
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Resource {
        &self.health
    }

    pub(crate) fn health_mut(&mut self) -> &mut Resource {
        &mut self.health
    }

    /// Actions bound to hotkey slots, in slot order.
    #[must_use]
    pub fn catalog(&self) -> &[ActionKind] {
        &self.catalog
    }

    /// The running action, if any.
    #[must_use]
    pub const fn current_action(&self) -> Option<&ActiveAction> {
        self.current_action.as_ref()
    }

    /// Visuals owned by the running action.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        self.current_action
            .as_ref()
            .map(ActiveAction::visuals)
            .unwrap_or_default()
    }

    /// Turn-start hook: refill stamina.
    pub fn on_turn_start(&mut self) {
        self.stamina.refill();
        self.stamina.clear_delta();
    }

    /// Turn-end hook: tear down any running action.
    pub fn on_turn_end(&mut self, owner: ParticipantId, out: &mut Outbox) {
        if let Some(action) = self.current_action.take() {
            self.finish(owner, action, ActionEnd::TurnEnded, out);
        }
        self.stamina.clear_delta();
    }

    /// Start an action of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::ActionInProgress`] if an action is already
    /// running.
    pub fn start_action(
        &mut self,
        owner: ParticipantId,
        body: &mut Body,
        kind: ActionKind,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) -> Result<(), Rejection> {
        if self.current_action.is_some() {
            return Err(Rejection::ActionInProgress);
        }

        let mut ctx = context(owner, body, &mut self.stamina, env, out);
        let (action, status) = ActiveAction::begin(kind, &mut ctx);
        out.emit(CombatEvent::ActionStarted {
            participant: owner,
            kind,
        });
        debug!(participant = %owner, action = kind.name(), "Action started");

        match status {
            ActionStatus::Complete => self.finish(owner, action, ActionEnd::Completed, out),
            ActionStatus::Pending => self.current_action = Some(action),
        }
        Ok(())
    }

    /// Start the action bound to a number-row digit.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::NoSuchSlot`] if the digit maps outside the
    /// catalog, or whatever [`Actor::start_action`] rejects with.
    pub fn select_slot(
        &mut self,
        owner: ParticipantId,
        body: &mut Body,
        digit: u8,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) -> Result<(), Rejection> {
        let slot = hotkey_slot(digit).ok_or(Rejection::NoSuchSlot(usize::from(digit)))?;
        let kind = *self.catalog.get(slot).ok_or(Rejection::NoSuchSlot(slot))?;
        self.start_action(owner, body, kind, env, out)
    }

    /// Cancel the running action. Returns false if nothing was running.
    pub fn cancel_action(&mut self, owner: ParticipantId, out: &mut Outbox) -> bool {
        match self.current_action.take() {
            Some(action) => {
                self.finish(owner, action, ActionEnd::Cancelled, out);
                true
            }
            None => false,
        }
    }

    /// React to one input event. End-turn and announce keys are handled
    /// by the participant before this is called.
    pub fn handle_event(
        &mut self,
        owner: ParticipantId,
        body: &mut Body,
        event: InputEvent,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) {
        if event.is_cancel() {
            if self.cancel_action(owner, out) {
                debug!(participant = %owner, "Action cancelled");
            }
            return;
        }

        match event {
            InputEvent::KeyDown(Key::Digit(digit)) => {
                if let Err(reason) = self.select_slot(owner, body, digit, env, out) {
                    debug!(participant = %owner, digit, %reason, "Hotkey ignored");
                    out.emit(CombatEvent::ActionRejected {
                        participant: owner,
                        reason,
                    });
                }
            }
            InputEvent::PointerDown(Button::Primary) => self.confirm(owner, body, env, out),
            _ => {}
        }
    }

    /// Refresh the running action's preview from the pointer.
    pub fn refresh(
        &mut self,
        owner: ParticipantId,
        body: &mut Body,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) {
        if let Some(action) = self.current_action.as_mut() {
            let mut ctx = context(owner, body, &mut self.stamina, env, out);
            action.update(&mut ctx);
        }
    }

    fn confirm(
        &mut self,
        owner: ParticipantId,
        body: &mut Body,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) {
        let Some(action) = self.current_action.as_mut() else {
            return;
        };

        let mut ctx = context(owner, body, &mut self.stamina, env, out);
        action.update(&mut ctx);
        if action.confirm(&mut ctx) == ActionStatus::Complete {
            if let Some(action) = self.current_action.take() {
                self.finish(owner, action, ActionEnd::Completed, out);
            }
        }
    }

    fn finish(
        &mut self,
        owner: ParticipantId,
        action: ActiveAction,
        reason: ActionEnd,
        out: &mut Outbox,
    ) {
        let kind = action.kind();
        let released = action.teardown(&mut self.stamina);
        debug!(
            participant = %owner,
            action = kind.name(),
            ?reason,
            visuals = released.visuals,
            targets = released.targets,
            "Action ended"
        );
        out.emit(CombatEvent::ActionEnded {
            participant: owner,
            kind,
            reason,
        });
    }
}

fn context<'a>(
    owner: ParticipantId,
    body: &'a mut Body,
    stamina: &'a mut Resource,
    env: &'a TickEnv<'_>,
    out: &'a mut Outbox,
) -> ActionContext<'a> {
    ActionContext {
        owner,
        body,
        stamina,
        pointer: env.pointer,
        spatial: env.spatial,
        rules: env.rules,
        out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::math::Vec2Fixed;
    use crate::spatial::{ArenaView, BodyEntry};

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn v(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn actor() -> Actor {
        Actor::new(
            ActorStats {
                stamina: fx(10),
                health: fx(3),
            },
            vec![ActionKind::Move, ActionKind::Attack],
        )
    }

    fn view() -> ArenaView<'static> {
        ArenaView::new(
            &[],
            vec![
                BodyEntry {
                    id: ParticipantId(0),
                    body: Body::new(v(0, 0), Fixed::ONE / fx(2)),
                    defeated: false,
                },
                BodyEntry {
                    id: ParticipantId(1),
                    body: Body::new(v(2, 0), Fixed::ONE / fx(2)),
                    defeated: false,
                },
            ],
        )
    }

    const ME: ParticipantId = ParticipantId(0);

    #[test]
    fn test_second_action_is_rejected() {
        let view = view();
        let rules = RulesConfig::default();
        let env = TickEnv {
            spatial: &view,
            rules: &rules,
            pointer: v(5, 5),
        };
        let mut body = Body::new(v(0, 0), Fixed::ONE / fx(2));
        let mut out = Outbox::default();
        let mut actor = actor();

        assert!(actor.start_action(ME, &mut body, ActionKind::Move, &env, &mut out).is_ok());
        assert_eq!(
            actor.start_action(ME, &mut body, ActionKind::Attack, &env, &mut out),
            Err(Rejection::ActionInProgress)
        );
        assert_eq!(actor.current_action().map(ActiveAction::kind), Some(ActionKind::Move));
    }

    #[test]
    fn test_hotkeys_map_to_catalog() {
        let view = view();
        let rules = RulesConfig::default();
        let env = TickEnv {
            spatial: &view,
            rules: &rules,
            pointer: v(5, 5),
        };
        let mut body = Body::new(v(0, 0), Fixed::ONE / fx(2));
        let mut out = Outbox::default();
        let mut actor = actor();

        assert_eq!(
            actor.select_slot(ME, &mut body, 3, &env, &mut out),
            Err(Rejection::NoSuchSlot(2))
        );
        assert_eq!(
            actor.select_slot(ME, &mut body, 0, &env, &mut out),
            Err(Rejection::NoSuchSlot(9))
        );
        assert!(actor.current_action().is_none());

        assert!(actor.select_slot(ME, &mut body, 2, &env, &mut out).is_ok());
        assert_eq!(actor.current_action().map(ActiveAction::kind), Some(ActionKind::Attack));
    }

    #[test]
    fn test_cancel_restores_delta_and_releases() {
        let view = view();
        let rules = RulesConfig::default();
        let env = TickEnv {
            spatial: &view,
            rules: &rules,
            pointer: v(2, 0),
        };
        let mut body = Body::new(v(0, 0), Fixed::ONE / fx(2));
        let mut out = Outbox::default();
        let mut actor = actor();

        actor
            .start_action(ME, &mut body, ActionKind::Attack, &env, &mut out)
            .unwrap();
        assert_eq!(actor.stamina().delta(), fx(5));
        assert!(!actor.visuals().is_empty());

        actor.handle_event(ME, &mut body, InputEvent::KeyDown(Key::Cancel), &env, &mut out);
        assert!(actor.current_action().is_none());
        assert_eq!(actor.stamina().delta(), Fixed::ZERO);
        assert_eq!(actor.stamina().current(), fx(10));
        assert!(actor.visuals().is_empty());
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_click_confirms_attack() {
        let view = view();
        let rules = RulesConfig::default();
        let env = TickEnv {
            spatial: &view,
            rules: &rules,
            pointer: v(2, 0),
        };
        let mut body = Body::new(v(0, 0), Fixed::ONE / fx(2));
        let mut out = Outbox::default();
        let mut actor = actor();

        actor.handle_event(ME, &mut body, InputEvent::KeyDown(Key::Digit(2)), &env, &mut out);
        actor.handle_event(
            ME,
            &mut body,
            InputEvent::PointerDown(Button::Primary),
            &env,
            &mut out,
        );

        assert!(actor.current_action().is_none());
        assert_eq!(actor.stamina().current(), fx(5));
        assert_eq!(out.effects.len(), 1);
        assert!(out.events.iter().any(|e| matches!(
            e,
            CombatEvent::ActionEnded {
                reason: ActionEnd::Completed,
                ..
            }
        )));
    }

    #[test]
    fn test_turn_end_tears_down_action() {
        let view = view();
        let rules = RulesConfig::default();
        let env = TickEnv {
            spatial: &view,
            rules: &rules,
            pointer: v(4, 4),
        };
        let mut body = Body::new(v(0, 0), Fixed::ONE / fx(2));
        let mut out = Outbox::default();
        let mut actor = actor();

        actor
            .start_action(ME, &mut body, ActionKind::Move, &env, &mut out)
            .unwrap();
        actor.on_turn_end(ME, &mut out);
        assert!(actor.current_action().is_none());
        assert_eq!(actor.stamina().delta(), Fixed::ZERO);
        assert!(matches!(
            out.events.last(),
            Some(CombatEvent::ActionEnded {
                reason: ActionEnd::TurnEnded,
                ..
            })
        ));
    }
}
