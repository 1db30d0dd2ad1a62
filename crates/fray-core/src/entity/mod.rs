//! Actors: the characters and enemies that take part in combat.
//!
//! This module provides:
//! - [`ActorId`]: Unique identifier for actors
//! - [`ActorRole`]: Which side of the fight an actor is on
//! - [`Actor`]: Shared health, stats, action pool, combo position, status
//!   ledger and progression for both roles
//!
//! # Architecture
//!
//! Characters and enemies share every capability (they have health, have
//! stats, and can act), so a single [`Actor`] struct carries a role tag
//! instead of splitting into two types. The role only changes how the
//! default action is picked when the combo selector makes no selection.
//!
//! # Example
//!
//! ```
//! use fray_core::action::{Action, ActionCategory};
//! use fray_core::entity::{Actor, ActorId, ActorRole, Stats};
//!
//! let hero = Actor::new(ActorId::new(1), "Ayla", ActorRole::Character, 100)
//!     .with_stats(Stats { strength: 8, technique: 4, ..Stats::default() })
//!     .with_action(Action::new("SLASH", ActionCategory::Attack), 1.0)
//!     .with_action(Action::new("RISING CUT", ActionCategory::Attack).as_combo(1), 1.0);
//!
//! assert!(hero.is_alive());
//! assert_eq!(hero.combo_actions().len(), 1);
//! ```

pub mod components;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::action::{Action, ActionId};
use crate::config::CombatConfig;
use crate::error::CombatError;
use crate::status::{StatusFlags, StatusLedger};

pub use components::{ActionEntry, Health, Stats};

/// Unique identifier for an actor.
///
/// Actor IDs order numerically; rosters and timelines iterate in this order
/// and use it to break ties.
///
/// # Example
///
/// ```
/// use fray_core::entity::ActorId;
///
/// let a = ActorId::new(1);
/// let b = ActorId::new(2);
/// assert!(a < b);
/// assert_eq!(b.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates a new `ActorId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// Which side of the fight an actor is on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// Player-controlled hero.
    Character,
    /// Hostile creature.
    Enemy,
}

impl ActorRole {
    /// The opposing role.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Character => Self::Enemy,
            Self::Enemy => Self::Character,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character => write!(f, "Character"),
            Self::Enemy => write!(f, "Enemy"),
        }
    }
}

/// A combatant.
///
/// `health`, `stats` and `status` are public so observers can read them
/// after any resolution step without a particular call pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    name: String,
    role: ActorRole,
    level: u32,
    xp: u64,
    /// Current and maximum health.
    pub health: Health,
    /// Base attributes.
    pub stats: Stats,
    /// Afflictions, owned exclusively by this actor.
    pub status: StatusLedger,
    actions: Vec<ActionEntry>,
    combo_step: usize,
    critical_miss_pending: bool,
}

impl Actor {
    /// Creates a level 1 actor at full health with default stats and no
    /// actions.
    #[must_use]
    pub fn new(id: ActorId, name: &str, role: ActorRole, max_health: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            role,
            level: 1,
            xp: 0,
            health: Health::new(max_health),
            stats: Stats::default(),
            status: StatusLedger::new(),
            actions: Vec::new(),
            combo_step: 0,
            critical_miss_pending: false,
        }
    }

    /// Sets base attributes.
    #[must_use]
    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    /// Sets the starting level (minimum 1).
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Adds an action to the pool.
    #[must_use]
    pub fn with_action(mut self, action: Action, weight: f64) -> Self {
        self.add_action(action, weight);
        self
    }

    /// Validates `action` and adds it to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] if [`Action::validate`]
    /// rejects the action; the pool is left unchanged.
    pub fn try_add_action(&mut self, action: Action, weight: f64) -> Result<(), CombatError> {
        action.validate()?;
        self.add_action(action, weight);
        Ok(())
    }

    /// Adds an action to the pool. Negative or non-finite weights count as 0.
    ///
    /// The action is not validated here; [`CombatSession::resolve_turn`]
    /// rejects a pool holding an invalid action before the turn starts.
    ///
    /// [`CombatSession::resolve_turn`]: crate::session::CombatSession::resolve_turn
    pub fn add_action(&mut self, action: Action, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.actions.push(ActionEntry { action, weight });
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// The actor's identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which side the actor fights on.
    #[must_use]
    pub fn role(&self) -> ActorRole {
        self.role
    }

    /// Current level, starting at 1.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// XP accumulated toward the next level.
    #[must_use]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    // =========================================================================
    // Condition
    // =========================================================================

    /// Returns true while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }

    /// Returns true if the ledger forbids acting this turn.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.status.is_stunned()
    }

    /// Ledger flags plus `DEFEATED` at zero health.
    #[must_use]
    pub fn status_flags(&self) -> StatusFlags {
        let mut flags = self.status.flags();
        flags.set(StatusFlags::DEFEATED, !self.is_alive());
        flags
    }

    /// Returns true if the previous action was a critical miss and its
    /// penalty has not been paid yet.
    #[must_use]
    pub fn critical_miss_pending(&self) -> bool {
        self.critical_miss_pending
    }

    pub(crate) fn set_critical_miss_pending(&mut self, pending: bool) {
        self.critical_miss_pending = pending;
    }

    // =========================================================================
    // Action Pool
    // =========================================================================

    /// All pool entries in insertion order.
    #[must_use]
    pub fn action_entries(&self) -> &[ActionEntry] {
        &self.actions
    }

    /// All actions in insertion order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().map(|entry| &entry.action)
    }

    /// Looks up an action by ID.
    #[must_use]
    pub fn action(&self, id: &ActionId) -> Option<&Action> {
        self.actions().find(|action| action.id() == id)
    }

    /// Combo members ordered by combo order, then pool position.
    #[must_use]
    pub fn combo_actions(&self) -> Vec<&Action> {
        let mut combo: Vec<&Action> = self.actions().filter(|a| a.is_combo()).collect();
        combo.sort_by_key(|a| a.combo_order().unwrap_or(u32::MAX));
        combo
    }

    /// Index of the next unconsumed entry in the combo chain.
    #[must_use]
    pub fn combo_step(&self) -> usize {
        self.combo_step
    }

    /// Consumes one chain entry. Wraps to the start once `chain_len` entries
    /// have been consumed.
    pub(crate) fn advance_combo(&mut self, chain_len: usize) {
        self.combo_step += 1;
        if self.combo_step >= chain_len {
            self.combo_step = 0;
        }
    }

    /// Returns the combo chain to its first entry.
    pub fn reset_combo(&mut self) {
        self.combo_step = 0;
    }

    /// Picks an action by pool weight.
    ///
    /// Falls back to the first action when no weight is positive. Returns
    /// `None` for an empty pool.
    pub fn select_weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Action> {
        match WeightedIndex::<f64>::new(self.actions.iter().map(|entry| entry.weight)) {
            Ok(index) => self.actions.get(index.sample(rng)).map(|e| &e.action),
            Err(_) => self.actions.first().map(|e| &e.action),
        }
    }

    /// The action used when the combo selector makes no selection.
    ///
    /// Characters take their first non-combo action (or their first action
    /// if every action is a combo member). Enemies pick by weight.
    pub fn default_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Action> {
        match self.role {
            ActorRole::Character => self
                .actions()
                .find(|a| !a.is_combo())
                .or_else(|| self.actions().next()),
            ActorRole::Enemy => self.select_weighted(rng),
        }
    }

    /// Roll bonus from stats plus the action's own bonus.
    #[must_use]
    pub fn roll_bonus(&self, action: Option<&Action>, config: &CombatConfig) -> i32 {
        let from_stats = self
            .stats
            .technique
            .checked_div(config.technique_per_roll_bonus)
            .unwrap_or(0)
            + self
                .stats
                .intelligence
                .checked_div(config.intelligence_per_roll_bonus)
                .unwrap_or(0);
        let from_action = action.map_or(0, |a| a.advanced().roll_bonus);
        i32::try_from(from_stats)
            .unwrap_or(i32::MAX)
            .saturating_add(from_action)
    }

    // =========================================================================
    // Progression
    // =========================================================================

    /// XP required to advance from the current level.
    #[must_use]
    pub fn xp_to_next_level(&self, config: &CombatConfig) -> u64 {
        let level = u64::from(self.level);
        level * level * u64::from(config.xp_base.max(1))
    }

    /// Adds XP and levels up as many times as it pays for.
    ///
    /// Each level-up spends its threshold, so leftover XP carries over.
    /// Returns the number of levels gained.
    pub fn grant_xp(&mut self, amount: u32, config: &CombatConfig) -> u32 {
        self.xp += u64::from(amount);
        let mut gained = 0;
        loop {
            let needed = self.xp_to_next_level(config);
            if self.xp < needed {
                break;
            }
            self.xp -= needed;
            self.level += 1;
            gained += 1;
        }
        if gained > 0 {
            info!(actor = %self.id, level = self.level, gained, "level up");
        }
        gained
    }
}
