//! Deferred work executed at a later tick boundary.
//!
//! The turn handoff never happens inside the tick that requested it: the
//! request is queued here and picked up at the start of the next tick.

use serde::{Deserialize, Serialize};

/// Work the session runs at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeferredTask {
    /// Hand the turn to the next live participant.
    AdvanceTurn,
}

/// Tasks keyed by the tick they become due, kept in scheduling order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredQueue {
    pending: Vec<(u64, DeferredTask)>,
}

impl DeferredQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run at `due_tick`.
    pub fn schedule(&mut self, due_tick: u64, task: DeferredTask) {
        self.pending.push((due_tick, task));
    }

    /// Whether `task` is already queued for any tick.
    #[must_use]
    pub fn contains(&self, task: DeferredTask) -> bool {
        self.pending.iter().any(|(_, queued)| *queued == task)
    }

    /// Remove and return every task due at or before `now`.
    pub fn take_due(&mut self, now: u64) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        self.pending.retain(|&(tick, task)| {
            if tick <= now {
                due.push(task);
                false
            } else {
                true
            }
        });
        due
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
