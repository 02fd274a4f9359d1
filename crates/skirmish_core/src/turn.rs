//! Round-robin turn order.
//!
//! The tracker only knows ids and the acting index. Running the hooks of
//! the participants it selects is the session's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::participant::ParticipantId;
use crate::scheduler::{DeferredQueue, DeferredTask};

/// Reasons the turn order cannot advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnError {
    /// Nobody was registered.
    #[error("no participants registered")]
    EmptyOrder,
    /// Every registered participant is defeated.
    #[error("no live participants left")]
    NoLiveParticipants,
}

/// Tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackerState {
    /// Combat has not started.
    #[default]
    Idle,
    /// The participant at this index of the order is acting.
    Acting(usize),
}

/// Owns the turn order and the acting index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnTracker {
    order: Vec<ParticipantId>,
    state: TrackerState,
    round: u32,
    started: bool,
}

impl TurnTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a participant to the order.
    ///
    /// Returns false (and leaves the order untouched) once combat has
    /// started or if the id is already registered.
    pub fn register(&mut self, id: ParticipantId) -> bool {
        if self.started {
            warn!(participant = %id, "Registration after combat start ignored");
            return false;
        }
        if self.order.contains(&id) {
            warn!(participant = %id, "Participant already registered");
            return false;
        }
        self.order.push(id);
        true
    }

    /// Move to the next live participant and return it.
    ///
    /// The first call selects the first live participant. Later calls
    /// step forward with wraparound, skipping participants for which
    /// `is_live` returns false. The round counter increases on the first
    /// call and on every wrap.
    ///
    /// # Errors
    ///
    /// [`TurnError::EmptyOrder`] if nobody registered, and
    /// [`TurnError::NoLiveParticipants`] if nobody can act.
    pub fn advance(
        &mut self,
        is_live: impl Fn(ParticipantId) -> bool,
    ) -> Result<ParticipantId, TurnError> {
        let n = self.order.len();
        if n == 0 {
            return Err(TurnError::EmptyOrder);
        }
        self.started = true;

        let (first, from_idle) = match self.state {
            TrackerState::Idle => (0, true),
            TrackerState::Acting(index) => (index + 1, false),
        };

        for step in 0..n {
            let raw = first + step;
            let index = raw % n;
            let id = self.order[index];
            if !is_live(id) {
                debug!(participant = %id, "Skipping defeated participant");
                continue;
            }

            if from_idle || raw >= n {
                self.round += 1;
            }
            self.state = TrackerState::Acting(index);
            return Ok(id);
        }

        Err(TurnError::NoLiveParticipants)
    }

    /// Request the handoff at the next tick boundary.
    ///
    /// Repeated requests before the handoff runs collapse into one.
    pub fn end_turn(&self, queue: &mut DeferredQueue, now: u64) {
        if queue.contains(DeferredTask::AdvanceTurn) {
            debug!("Turn handoff already queued");
            return;
        }
        queue.schedule(now + 1, DeferredTask::AdvanceTurn);
    }

    /// Participant currently acting.
    #[must_use]
    pub fn current(&self) -> Option<ParticipantId> {
        self.current_index().map(|index| self.order[index])
    }

    /// Index of the acting participant in the order.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        match self.state {
            TrackerState::Idle => None,
            TrackerState::Acting(index) => Some(index),
        }
    }

    /// Tracker state.
    #[must_use]
    pub const fn state(&self) -> TrackerState {
        self.state
    }

    /// Rounds started so far (0 before combat).
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Registration order.
    #[must_use]
    pub fn order(&self) -> &[ParticipantId] {
        &self.order
    }

    /// Whether the first turn has been handed out.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Number of participants `is_live` accepts.
    pub fn live_count(&self, is_live: impl Fn(ParticipantId) -> bool) -> usize {
        self.order.iter().filter(|&&id| is_live(id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(n: u32) -> TurnTracker {
        let mut tracker = TurnTracker::new();
        for i in 0..n {
            assert!(tracker.register(ParticipantId(i)));
        }
        tracker
    }

    #[test]
    fn test_round_robin_wraps() {
        let mut t = tracker(3);
        let seq: Vec<u32> = (0..7)
            .map(|_| t.advance(|_| true).map(|id| id.0))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(seq, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(t.round(), 3);
    }

    #[test]
    fn test_empty_order_errors() {
        let mut t = TurnTracker::new();
        assert_eq!(t.advance(|_| true), Err(TurnError::EmptyOrder));
        assert_eq!(t.state(), TrackerState::Idle);
    }

    #[test]
    fn test_single_participant_keeps_turn() {
        let mut t = tracker(1);
        assert_eq!(t.advance(|_| true), Ok(ParticipantId(0)));
        assert_eq!(t.advance(|_| true), Ok(ParticipantId(0)));
        assert_eq!(t.round(), 2);
    }

    #[test]
    fn test_register_after_start_is_ignored() {
        let mut t = tracker(2);
        t.advance(|_| true).unwrap();
        assert!(!t.register(ParticipantId(9)));
        assert_eq!(t.order().len(), 2);
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut t = tracker(2);
        assert!(!t.register(ParticipantId(1)));
        assert_eq!(t.order().len(), 2);
    }

    #[test]
    fn test_defeated_are_skipped() {
        let mut t = tracker(3);
        let live = |id: ParticipantId| id != ParticipantId(1);
        assert_eq!(t.advance(live), Ok(ParticipantId(0)));
        assert_eq!(t.advance(live), Ok(ParticipantId(2)));
        assert_eq!(t.advance(live), Ok(ParticipantId(0)));
        assert_eq!(t.live_count(live), 2);
    }

    #[test]
    fn test_all_defeated_errors() {
        let mut t = tracker(2);
        t.advance(|_| true).unwrap();
        assert_eq!(t.advance(|_| false), Err(TurnError::NoLiveParticipants));
        assert_eq!(t.current(), Some(ParticipantId(0)));
    }

    #[test]
    fn test_end_turn_defers_once() {
        let t = tracker(2);
        let mut queue = DeferredQueue::new();
        t.end_turn(&mut queue, 4);
        t.end_turn(&mut queue, 4);
        assert_eq!(queue.len(), 1);
        assert!(queue.take_due(4).is_empty());
        assert_eq!(queue.take_due(5), vec![DeferredTask::AdvanceTurn]);
    }
}
