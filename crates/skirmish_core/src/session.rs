//! The combat session: participants, turn order and the tick loop.
//!
//! # Tick order
//!
//! Each call to [`CombatSession::tick`] runs, in this order:
//! 1. **Deferred tasks** due this tick (the turn handoff requested last tick)
//! 2. **Acting participant** handles the input frame
//! 3. **Effects** (damage, end-of-turn requests) are applied
//! 4. The tick counter increments

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::action::Visual;
use crate::config::RulesConfig;
use crate::error::{GameError, Result};
use crate::events::{CombatEvent, Effect, Outbox, TickEvents};
use crate::input::InputFrame;
use crate::math::Fixed;
use crate::participant::{Participant, ParticipantId, ParticipantSnapshot, Role, TickEnv};
use crate::scheduler::{DeferredQueue, DeferredTask};
use crate::spatial::{ArenaView, Body, BodyEntry, Wall};
use crate::turn::{TurnError, TurnTracker};

/// How the fight currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "participant", rename_all = "snake_case")]
pub enum Outcome {
    /// At least two participants can still act.
    Ongoing,
    /// Only this participant is left standing.
    Victor(ParticipantId),
    /// Everybody is defeated.
    Wiped,
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Ticks run so far.
    pub tick: u64,
    /// Current round (0 before the first turn).
    pub round: u32,
    /// Acting participant.
    pub current: Option<ParticipantId>,
    /// Every participant, in registration order.
    pub participants: Vec<ParticipantSnapshot>,
    /// Visuals of the running action.
    pub visuals: Vec<Visual>,
}

/// A deterministic turn-based fight.
///
/// Participants are stored in registration order and their ids are their
/// indices, so iteration order is fixed and never depends on hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
    tick: u64,
    rules: RulesConfig,
    walls: Vec<Wall>,
    participants: Vec<Participant>,
    tracker: TurnTracker,
    deferred: DeferredQueue,
}

impl CombatSession {
    /// Create an empty session over an arena.
    #[must_use]
    pub fn new(rules: RulesConfig, walls: Vec<Wall>) -> Self {
        Self {
            tick: 0,
            rules,
            walls,
            participants: Vec::new(),
            tracker: TurnTracker::new(),
            deferred: DeferredQueue::new(),
        }
    }

    /// Add a participant to the end of the turn order.
    ///
    /// Returns `None` once combat has started.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        body: Body,
        role: Role,
    ) -> Option<ParticipantId> {
        let index = u32::try_from(self.participants.len()).ok()?;
        let id = ParticipantId(index);
        if !self.tracker.register(id) {
            return None;
        }
        self.participants.push(Participant::new(id, name, body, role));
        Some(id)
    }

    /// Run every participant's start hook and hand out the first turn.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] if already started, or
    /// [`GameError::Turn`] if there is nobody to act.
    pub fn start(&mut self) -> Result<TickEvents> {
        if self.tracker.is_started() {
            return Err(GameError::InvalidState("combat already started".to_string()));
        }

        for participant in &mut self.participants {
            participant.on_start();
        }

        let mut out = Outbox::default();
        self.advance_turn(&mut out)?;
        self.apply_effects(&mut out);
        info!(participants = self.participants.len(), "Combat started");

        Ok(TickEvents {
            tick: self.tick,
            events: out.events,
        })
    }

    /// Advance the session by one tick with the host's input frame.
    pub fn tick(&mut self, frame: &InputFrame) -> TickEvents {
        let mut out = Outbox::default();

        // 1. Deferred tasks
        for task in self.deferred.take_due(self.tick) {
            match task {
                DeferredTask::AdvanceTurn => {
                    if let Err(err) = self.advance_turn(&mut out) {
                        warn!(tick = self.tick, error = %err, "Turn handoff failed");
                    }
                }
            }
        }

        // 2. Acting participant
        if let Some(index) = self.tracker.current_index() {
            let view = ArenaView::new(&self.walls, body_entries(&self.participants));
            let env = TickEnv {
                spatial: &view,
                rules: &self.rules,
                pointer: frame.pointer,
            };
            if let Some(participant) = self.participants.get_mut(index) {
                participant.on_tick(frame, &env, &mut out);
            }
        }

        // 3. Effects
        self.apply_effects(&mut out);

        let events = TickEvents {
            tick: self.tick,
            events: out.events,
        };
        self.tick += 1;
        events
    }

    fn advance_turn(&mut self, out: &mut Outbox) -> std::result::Result<(), TurnError> {
        let participants = &self.participants;
        let id = self.tracker.advance(|id| {
            participants
                .get(id.0 as usize)
                .is_some_and(|p| !p.is_defeated())
        })?;

        let round = self.tracker.round();
        if let Some(participant) = self.participants.get_mut(id.0 as usize) {
            participant.start_turn(round, out);
        }
        Ok(())
    }

    fn apply_effects(&mut self, out: &mut Outbox) {
        loop {
            let effects = out.take_effects();
            if effects.is_empty() {
                break;
            }

            for effect in effects {
                match effect {
                    Effect::Damage {
                        source,
                        target,
                        amount,
                    } => match self.participants.get_mut(target.0 as usize) {
                        Some(participant) => {
                            participant.damage(source, amount, out);
                        }
                        None => warn!(%source, %target, "Damage aimed at unknown participant"),
                    },
                    Effect::TurnEnded(id) => {
                        if self.tracker.current() == Some(id) {
                            self.tracker.end_turn(&mut self.deferred, self.tick);
                        } else {
                            debug!(participant = %id, "Stale end-turn request ignored");
                        }
                    }
                }
            }
        }
    }

    /// Deal damage from outside the action system (scripted hazards,
    /// test setups). Returns the events it produced.
    ///
    /// # Errors
    ///
    /// [`GameError::ParticipantNotFound`] if `target` does not exist.
    pub fn damage(
        &mut self,
        source: ParticipantId,
        target: ParticipantId,
        amount: Fixed,
    ) -> Result<Vec<CombatEvent>> {
        if self.participant(target).is_none() {
            return Err(GameError::ParticipantNotFound(target));
        }
        let mut out = Outbox::default();
        out.request(Effect::Damage {
            source,
            target,
            amount,
        });
        self.apply_effects(&mut out);
        Ok(out.events)
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Combat rules.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Arena walls.
    #[must_use]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Turn tracker.
    #[must_use]
    pub const fn tracker(&self) -> &TurnTracker {
        &self.tracker
    }

    /// A participant by id.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(id.0 as usize)
    }

    /// All participants in registration order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Acting participant.
    #[must_use]
    pub fn current(&self) -> Option<&Participant> {
        self.tracker.current().and_then(|id| self.participant(id))
    }

    /// Visuals of the acting participant's running action.
    #[must_use]
    pub fn visuals(&self) -> &[Visual] {
        self.current().map(Participant::visuals).unwrap_or_default()
    }

    /// Who is still standing.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let mut live = self.participants.iter().filter(|p| !p.is_defeated());
        match (live.next(), live.next()) {
            (None, _) => Outcome::Wiped,
            (Some(winner), None) => Outcome::Victor(winner.id()),
            (Some(_), Some(_)) => Outcome::Ongoing,
        }
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tick: self.tick,
            round: self.tracker.round(),
            current: self.tracker.current(),
            participants: self.participants.iter().map(Participant::snapshot).collect(),
            visuals: self.visuals().to_vec(),
        }
    }

    /// Hash of the full session state.
    ///
    /// Two sessions fed the same setup and input frames produce the same
    /// hash on every platform.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.rules.hash(&mut hasher);
        self.walls.hash(&mut hasher);
        self.tracker.hash(&mut hasher);
        self.deferred.hash(&mut hasher);

        self.participants.len().hash(&mut hasher);
        for participant in &self.participants {
            participant.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the session for replays and save games.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize session: {e}")))
    }

    /// Restore a session from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid session.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize session: {e}")))
    }
}

impl Default for CombatSession {
    fn default() -> Self {
        Self::new(RulesConfig::default(), Vec::new())
    }
}

fn body_entries(participants: &[Participant]) -> Vec<BodyEntry> {
    participants
        .iter()
        .map(|p| BodyEntry {
            id: p.id(),
            body: *p.body(),
            defeated: p.is_defeated(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::actor::{Actor, ActorStats};
    use crate::input::Key;
    use crate::math::Vec2Fixed;
    use crate::participant::Sentinel;

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn actor_role() -> Role {
        Role::Actor(Actor::new(
            ActorStats {
                stamina: fx(10),
                health: fx(3),
            },
            vec![ActionKind::Move, ActionKind::Attack],
        ))
    }

    fn body(x: i32, y: i32) -> Body {
        Body::new(Vec2Fixed::from_ints(x, y), Fixed::ONE / fx(2))
    }

    fn duel() -> CombatSession {
        let mut session = CombatSession::default();
        session.register("A", body(0, 0), actor_role());
        session.register("B", body(2, 0), actor_role());
        session
    }

    #[test]
    fn test_start_hands_first_turn() {
        let mut session = duel();
        let events = session.start().unwrap();
        assert_eq!(events.turn_started(), Some(ParticipantId(0)));
        assert_eq!(session.current().map(Participant::id), Some(ParticipantId(0)));
        assert!(session.start().is_err());
    }

    #[test]
    fn test_start_without_participants_fails() {
        let mut session = CombatSession::default();
        assert!(matches!(
            session.start(),
            Err(GameError::Turn(TurnError::EmptyOrder))
        ));
    }

    #[test]
    fn test_register_after_start_is_rejected() {
        let mut session = duel();
        session.start().unwrap();
        assert_eq!(session.register("Late", body(5, 5), actor_role()), None);
        assert_eq!(session.participants().len(), 2);
    }

    #[test]
    fn test_handoff_waits_one_tick() {
        let mut session = duel();
        session.start().unwrap();

        let events = session.tick(&InputFrame::idle().tap(Key::EndTurn));
        assert_eq!(events.turn_started(), None);
        assert_eq!(session.tracker().current(), Some(ParticipantId(0)));
        assert!(session.participants().iter().all(|p| !p.is_turn()));

        let events = session.tick(&InputFrame::idle());
        assert_eq!(events.turn_started(), Some(ParticipantId(1)));
    }

    #[test]
    fn test_sentinel_turns_pass() {
        let mut session = duel();
        session.register("Dummy", body(-4, 0), Role::Sentinel(Sentinel::new(fx(2))));
        session.start().unwrap();

        session.tick(&InputFrame::idle().tap(Key::EndTurn));
        session.tick(&InputFrame::idle().tap(Key::EndTurn));
        let events = session.tick(&InputFrame::idle());
        assert_eq!(events.turn_started(), Some(ParticipantId(2)));
        // Sentinel passed inside the same tick; A follows next tick.
        let events = session.tick(&InputFrame::idle());
        assert_eq!(events.turn_started(), Some(ParticipantId(0)));
        assert_eq!(session.tracker().round(), 2);
    }

    #[test]
    fn test_outcome_and_external_damage() {
        let mut session = duel();
        session.start().unwrap();
        assert_eq!(session.outcome(), Outcome::Ongoing);

        let events = session
            .damage(ParticipantId(0), ParticipantId(1), fx(10))
            .unwrap();
        assert!(events.contains(&CombatEvent::Defeated {
            participant: ParticipantId(1)
        }));
        assert_eq!(session.outcome(), Outcome::Victor(ParticipantId(0)));
        assert!(session.damage(ParticipantId(0), ParticipantId(7), fx(1)).is_err());
    }

    #[test]
    fn test_serialize_round_trip_keeps_hash() {
        let mut session = duel();
        session.start().unwrap();
        session.tick(&InputFrame::idle().tap(Key::Digit(1)));

        let bytes = session.serialize().unwrap();
        let restored = CombatSession::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), session.state_hash());
    }
}
