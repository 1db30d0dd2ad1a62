//! Plain data components shared by every actor.
//!
//! The external snapshot exporter reads these directly, so they stay simple
//! public-field structs.

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Current and maximum health.
///
/// `current` never exceeds `max` when changed through [`Health::damage`] or
/// [`Health::heal`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub current: u32,
    /// Maximum hit points.
    pub max: u32,
}

impl Health {
    /// Full health with the given maximum.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Lowers current health by `amount`, stopping at 0.
    ///
    /// Returns the health actually lost.
    pub fn damage(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        before - self.current
    }

    /// Raises current health by `amount`, stopping at `max`.
    ///
    /// Returns the health actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current.saturating_sub(before)
    }

    /// Returns true at zero health.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Current health as a fraction of max; 0 when max is 0.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            f64::from(self.current) / f64::from(self.max)
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Base attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Scales damage.
    pub strength: u32,
    /// Shortens action durations and adds to defense.
    pub agility: u32,
    /// Adds to roll bonus.
    pub technique: u32,
    /// Adds to roll bonus.
    pub intelligence: u32,
    /// Subtracted from incoming damage and added to defense.
    pub armor: u32,
}

/// One entry in an actor's action pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// The action.
    pub action: Action,
    /// Relative selection weight for weighted picks.
    pub weight: f64,
}
