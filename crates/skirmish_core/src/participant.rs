//! Participants and their role-specific hooks.
//!
//! Everything that takes turns is a [`Participant`]. The shared lifecycle
//! (turn flag, end-turn and announce keys, damage, defeat) lives here;
//! behaviour that differs between kinds of participant is dispatched on
//! [`Role`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::{ActionKind, Visual};
use crate::actor::{Actor, Rejection};
use crate::config::RulesConfig;
use crate::events::{CombatEvent, Effect, Outbox};
use crate::input::{InputEvent, InputFrame, Key};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::resource::{Resource, ResourceSnapshot};
use crate::spatial::{Body, SpatialQuery};

/// Stable participant identifier, assigned in registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a participant can see while it handles a tick.
pub struct TickEnv<'a> {
    /// Collision queries over the arena.
    pub spatial: &'a dyn SpatialQuery,
    /// Combat rules.
    pub rules: &'a RulesConfig,
    /// Pointer position this tick.
    pub pointer: Vec2Fixed,
}

/// A non-player participant that only holds health and passes its turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sentinel {
    health: Resource,
}

impl Sentinel {
    /// Create a sentinel with full health.
    #[must_use]
    pub fn new(health: Fixed) -> Self {
        Self {
            health: Resource::new("Health", health),
        }
    }
}

/// Role-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Player-controlled.
    Actor(Actor),
    /// Passes every turn.
    Sentinel(Sentinel),
}

/// An entity registered with the turn tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    display_name: String,
    is_turn: bool,
    defeated: bool,
    body: Body,
    role: Role,
}

/// Read-only view of a participant for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    /// Identifier.
    pub id: ParticipantId,
    /// Name shown on the nameplate.
    pub name: String,
    /// Whether it is this participant's turn.
    pub is_turn: bool,
    /// Whether it is out of the fight.
    pub defeated: bool,
    /// Body center.
    pub position: Vec2Fixed,
    /// Body radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Resource bars.
    pub resources: Vec<ResourceSnapshot>,
}

impl Participant {
    /// Create a participant. Ids are normally assigned by the session.
    #[must_use]
    pub fn new(id: ParticipantId, display_name: impl Into<String>, body: Body, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_turn: false,
            defeated: false,
            body,
            role,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> ParticipantId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether this participant is acting.
    #[must_use]
    pub const fn is_turn(&self) -> bool {
        self.is_turn
    }

    /// Whether health has reached zero.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Collision body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Role state.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Actor state, if this participant is an actor.
    #[must_use]
    pub const fn actor(&self) -> Option<&Actor> {
        match &self.role {
            Role::Actor(actor) => Some(actor),
            Role::Sentinel(_) => None,
        }
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Resource {
        match &self.role {
            Role::Actor(actor) => actor.health(),
            Role::Sentinel(sentinel) => &sentinel.health,
        }
    }

    fn health_mut(&mut self) -> &mut Resource {
        match &mut self.role {
            Role::Actor(actor) => actor.health_mut(),
            Role::Sentinel(sentinel) => &mut sentinel.health,
        }
    }

    /// Visuals of the running action.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        self.actor().map(Actor::visuals).unwrap_or_default()
    }

    /// One-time hook when combat starts.
    pub fn on_start(&mut self) {
        debug!(participant = %self.id, name = %self.display_name, "Joined combat");
    }

    /// Begin this participant's turn.
    pub fn start_turn(&mut self, round: u32, out: &mut Outbox) {
        self.is_turn = true;
        info!(participant = %self.id, name = %self.display_name, round, "Turn started");
        out.emit(CombatEvent::TurnStarted {
            participant: self.id,
            round,
        });

        if let Role::Actor(actor) = &mut self.role {
            actor.on_turn_start();
        } else {
            debug!(participant = %self.id, "Sentinel passes");
            self.end_turn(out);
        }
    }

    /// End this participant's turn and ask for the handoff.
    ///
    /// Does nothing if it is not this participant's turn.
    pub fn end_turn(&mut self, out: &mut Outbox) {
        if !self.is_turn {
            debug!(participant = %self.id, "End turn ignored outside own turn");
            return;
        }

        self.is_turn = false;
        if let Role::Actor(actor) = &mut self.role {
            actor.on_turn_end(self.id, out);
        }
        out.emit(CombatEvent::TurnEnded {
            participant: self.id,
        });
        out.request(Effect::TurnEnded(self.id));
    }

    /// Remove health, clamped at zero. Reaching zero defeats the
    /// participant. Returns the health actually removed.
    pub fn damage(&mut self, source: ParticipantId, amount: Fixed, out: &mut Outbox) -> Fixed {
        let health = self.health_mut();
        let removed = health.drain(amount);
        let remaining = health.current();
        let depleted = health.is_depleted();

        out.emit(CombatEvent::Damaged {
            source,
            target: self.id,
            amount: removed,
            remaining,
        });
        debug!(
            participant = %self.id,
            %source,
            amount = %removed,
            remaining = %remaining,
            "Damaged"
        );

        if depleted && !self.defeated {
            self.defeated = true;
            info!(participant = %self.id, name = %self.display_name, "Defeated");
            out.emit(CombatEvent::Defeated {
                participant: self.id,
            });
            self.end_turn(out);
        }
        removed
    }

    /// Start an action of `kind`.
    ///
    /// # Errors
    ///
    /// Rejects when the participant is defeated, not acting, has no
    /// actions, or already runs one.
    pub fn start_action(
        &mut self,
        kind: ActionKind,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) -> Result<(), Rejection> {
        self.check_can_act()?;
        match &mut self.role {
            Role::Actor(actor) => actor.start_action(self.id, &mut self.body, kind, env, out),
            Role::Sentinel(_) => Err(Rejection::NoActions),
        }
    }

    /// Start the action bound to a number-row digit.
    ///
    /// # Errors
    ///
    /// Same as [`Participant::start_action`], plus
    /// [`Rejection::NoSuchSlot`].
    pub fn select_slot(
        &mut self,
        digit: u8,
        env: &TickEnv<'_>,
        out: &mut Outbox,
    ) -> Result<(), Rejection> {
        self.check_can_act()?;
        match &mut self.role {
            Role::Actor(actor) => actor.select_slot(self.id, &mut self.body, digit, env, out),
            Role::Sentinel(_) => Err(Rejection::NoActions),
        }
    }

    /// Cancel the running action. Returns false if there was none.
    pub fn cancel_action(&mut self, out: &mut Outbox) -> bool {
        match &mut self.role {
            Role::Actor(actor) => actor.cancel_action(self.id, out),
            Role::Sentinel(_) => false,
        }
    }

    fn check_can_act(&self) -> Result<(), Rejection> {
        if self.defeated {
            Err(Rejection::Defeated)
        } else if !self.is_turn {
            Err(Rejection::NotYourTurn)
        } else {
            Ok(())
        }
    }

    /// Per-tick hook. Only the acting participant reacts to input.
    pub fn on_tick(&mut self, input: &InputFrame, env: &TickEnv<'_>, out: &mut Outbox) {
        if !self.is_turn || self.defeated {
            return;
        }

        for &event in &input.events {
            match event {
                InputEvent::KeyDown(Key::Announce) => {
                    info!(participant = %self.id, "{}", self.display_name);
                }
                InputEvent::KeyUp(Key::EndTurn) => {
                    self.end_turn(out);
                    return;
                }
                other => {
                    if let Role::Actor(actor) = &mut self.role {
                        actor.handle_event(self.id, &mut self.body, other, env, out);
                    }
                }
            }
        }

        if let Role::Actor(actor) = &mut self.role {
            actor.refresh(self.id, &mut self.body, env, out);
        }
    }

    /// Copy out the presentation state.
    #[must_use]
    pub fn snapshot(&self) -> ParticipantSnapshot {
        let resources = match &self.role {
            Role::Actor(actor) => vec![actor.stamina().snapshot(), actor.health().snapshot()],
            Role::Sentinel(sentinel) => vec![sentinel.health.snapshot()],
        };
        ParticipantSnapshot {
            id: self.id,
            name: self.display_name.clone(),
            is_turn: self.is_turn,
            defeated: self.defeated,
            position: self.body.position,
            radius: self.body.radius,
            resources,
        }
    }
}
