//! Speed-based turn order.
//!
//! Every actor in the fight has a "next action time". The actor with the
//! earliest time goes next; the clock jumps to that time, and once the actor
//! has chosen an action its next time moves forward by the action's
//! duration. Fast actors (short durations) therefore act more often.
//!
//! Times within the configured tie buffer of each other count as
//! simultaneous, and simultaneous actors go in ID order.

use std::collections::BTreeMap;

use crate::entity::ActorId;

/// Next-action times for every actor in the fight.
#[derive(Debug, Clone)]
pub struct TurnTimeline {
    next_times: BTreeMap<ActorId, f64>,
    clock: f64,
    tie_buffer: f64,
}

impl TurnTimeline {
    /// Creates an empty timeline at time 0.
    #[must_use]
    pub fn new(tie_buffer: f64) -> Self {
        Self {
            next_times: BTreeMap::new(),
            clock: 0.0,
            tie_buffer: tie_buffer.max(0.0),
        }
    }

    /// Adds an actor whose first action is due `delay` after the current
    /// clock. Replaces any existing entry for the actor.
    pub fn add(&mut self, actor: ActorId, delay: f64) {
        self.next_times.insert(actor, self.clock + delay.max(0.0));
    }

    /// Drops an actor from the turn order.
    pub fn remove(&mut self, actor: ActorId) {
        self.next_times.remove(&actor);
    }

    /// Returns true if the actor has a slot.
    #[must_use]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.next_times.contains_key(&actor)
    }

    /// The current clock.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// The actor's next action time.
    #[must_use]
    pub fn next_time(&self, actor: ActorId) -> Option<f64> {
        self.next_times.get(&actor).copied()
    }

    /// Peeks at who acts next without moving the clock.
    #[must_use]
    pub fn peek(&self) -> Option<ActorId> {
        let earliest = self
            .next_times
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min);
        // BTreeMap iterates in ID order, so the first actor within the tie
        // buffer of the earliest time is the lowest ID among the tied.
        self.next_times
            .iter()
            .find(|&(_, &time)| time <= earliest + self.tie_buffer)
            .map(|(&id, _)| id)
    }

    /// Picks the next actor and advances the clock to its time.
    pub fn next_actor(&mut self) -> Option<ActorId> {
        let actor = self.peek()?;
        if let Some(&time) = self.next_times.get(&actor) {
            self.clock = self.clock.max(time);
        }
        Some(actor)
    }

    /// Schedules the actor's next action `duration` after the later of the
    /// clock and its current slot. Unknown actors are added.
    pub fn schedule(&mut self, actor: ActorId, duration: f64) {
        let start = self
            .next_times
            .get(&actor)
            .map_or(self.clock, |&t| t.max(self.clock));
        self.next_times.insert(actor, start + duration.max(0.0));
    }

    /// Removes every actor and resets the clock.
    pub fn clear(&mut self) {
        self.next_times.clear();
        self.clock = 0.0;
    }

    /// Number of scheduled actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_times.len()
    }

    /// Returns true if nobody is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_times.is_empty()
    }
}

impl Default for TurnTimeline {
    fn default() -> Self {
        Self::new(0.01)
    }
}
