//! Per-actor action usage counts.
//!
//! The tracker is an ordinary value owned by the combat session and passed by
//! reference to whatever needs it (the turn pipeline records, progression
//! handlers read). Two sessions never share counts.

use std::collections::HashMap;

use crate::action::ActionId;
use crate::entity::ActorId;

/// Counts how often each actor has used each action.
#[derive(Debug, Clone, Default)]
pub struct ActionUsageTracker {
    counts: HashMap<(ActorId, ActionId), u32>,
}

impl ActionUsageTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one use and returns the new count for the pair.
    pub fn record_action_usage(&mut self, actor: ActorId, action: &ActionId) -> u32 {
        let count = self.counts.entry((actor, action.clone())).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Uses recorded for the pair; 0 when the pair was never recorded.
    #[must_use]
    pub fn usage_count(&self, actor: ActorId, action: &ActionId) -> u32 {
        self.counts
            .get(&(actor, action.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total uses of every action by one actor.
    #[must_use]
    pub fn total_for(&self, actor: ActorId) -> u32 {
        self.counts
            .iter()
            .filter(|((id, _), _)| *id == actor)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Forgets one actor's counts.
    pub fn clear_actor(&mut self, actor: ActorId) {
        self.counts.retain(|(id, _), _| *id != actor);
    }

    /// Forgets every count.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
