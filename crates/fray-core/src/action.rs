//! Action definitions.
//!
//! An [`Action`] is an immutable value describing something an actor can do:
//! its category, timing, damage scaling, status flags, combo membership and
//! the outcome triggers it subscribes to. Content sources build actions once
//! (directly or via `serde`) and hand them to actors; nothing in the combat
//! pipeline mutates an action after construction.
//!
//! # Example
//!
//! ```
//! use fray_core::action::{Action, ActionCategory, ActionFlags, TriggerCondition};
//!
//! let flurry = Action::new("FLURRY", ActionCategory::Attack)
//!     .with_length(0.8)
//!     .with_multi_hit(3, 0.5)
//!     .with_flags(ActionFlags::CAUSES_BLEED)
//!     .as_combo(2)
//!     .with_triggers([TriggerCondition::OnKill]);
//!
//! assert!(flurry.is_combo());
//! assert_eq!(flurry.combo_order(), Some(2));
//! assert_eq!(flurry.multi_hit_count(), 3);
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CombatError;
use crate::event::CombatEventKind;

// =============================================================================
// Identification
// =============================================================================

/// Identifier of an action, by its registered name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(String);

impl ActionId {
    /// Creates a new `ActionId` from a string.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Returns the action ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Classification
// =============================================================================

/// What an action does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    /// Physical damage.
    Attack,
    /// Restores health.
    Heal,
    /// Improves an ally.
    Buff,
    /// Hinders an opponent.
    Debuff,
    /// Interacts with the environment.
    Interact,
    /// Repositions.
    Move,
    /// Consumes an item.
    UseItem,
    /// Magical damage.
    Spell,
}

impl ActionCategory {
    /// Returns true for categories that roll damage against the target.
    #[must_use]
    pub const fn deals_damage(self) -> bool {
        matches!(self, Self::Attack | Self::Spell)
    }
}

/// Who an action is aimed at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetMode {
    /// The acting actor.
    #[serde(rename = "Self")]
    SelfTarget,
    /// One chosen target.
    #[default]
    Single,
    /// Every opponent.
    Multi,
    /// The surroundings rather than an actor.
    Environment,
}

bitflags! {
    /// Side effects and combo membership of an action.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActionFlags: u8 {
        /// A landed hit applies bleed stacks.
        const CAUSES_BLEED = 1 << 0;
        /// A landed hit applies poison stacks.
        const CAUSES_POISON = 1 << 1;
        /// A landed hit stuns the target.
        const CAUSES_STUN = 1 << 2;
        /// A landed hit weakens the target.
        const CAUSES_WEAKEN = 1 << 3;
        /// The action is a member of its owner's combo chain.
        const IS_COMBO = 1 << 4;
        /// A landed hit sets the target burning.
        const CAUSES_BURN = 1 << 5;
    }
}

// =============================================================================
// Triggers
// =============================================================================

/// A condition under which an outcome handler bound to an action fires.
///
/// The set is closed: a misspelled condition is a compile or parse error,
/// never a silently dead trigger.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerCondition {
    /// Fires on [`CombatEventKind::HitLanded`].
    OnHit,
    /// Fires on [`CombatEventKind::Missed`].
    OnMiss,
    /// Fires on [`CombatEventKind::CriticalHit`].
    OnCritical,
    /// Fires on [`CombatEventKind::ComboTriggered`].
    OnCombo,
    /// Fires on [`CombatEventKind::EnemyDied`].
    OnKill,
    /// Fires on a hit (regular or critical) that leaves the target at or
    /// below this fraction of its maximum health.
    ///
    /// Only [`CombatEventKind::HitLanded`] is checked, so a critical hit,
    /// which also emits `CriticalHit`, fires the threshold once.
    HealthBelow(f64),
}

impl TriggerCondition {
    /// The event kind this condition listens for, if it maps to exactly one.
    ///
    /// Health thresholds are evaluated against hits and return `None`.
    #[must_use]
    pub const fn event_kind(self) -> Option<CombatEventKind> {
        match self {
            Self::OnHit => Some(CombatEventKind::HitLanded),
            Self::OnMiss => Some(CombatEventKind::Missed),
            Self::OnCritical => Some(CombatEventKind::CriticalHit),
            Self::OnCombo => Some(CombatEventKind::ComboTriggered),
            Self::OnKill => Some(CombatEventKind::EnemyDied),
            Self::HealthBelow(_) => None,
        }
    }

    /// Evaluates the condition against an event kind and the target's health
    /// ratio at the moment of the event.
    #[must_use]
    pub fn matches(self, kind: CombatEventKind, target_ratio: Option<f64>) -> bool {
        match self {
            Self::HealthBelow(fraction) => {
                kind == CombatEventKind::HitLanded
                    && target_ratio.is_some_and(|ratio| ratio <= fraction)
            }
            other => other.event_kind() == Some(kind),
        }
    }
}

// =============================================================================
// Action
// =============================================================================

/// Less common numeric properties of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedProperties {
    /// Number of hits per use. Values below 1 are treated as 1.
    pub multi_hit_count: u32,
    /// Fraction of full damage dealt by each hit of a multi-hit action.
    pub multi_hit_damage_percent: f64,
    /// Flat healing for heal actions.
    pub heal_amount: u32,
    /// Bonus added to the attack roll.
    pub roll_bonus: i32,
}

impl Default for AdvancedProperties {
    fn default() -> Self {
        Self {
            multi_hit_count: 1,
            multi_hit_damage_percent: 1.0,
            heal_amount: 0,
            roll_bonus: 0,
        }
    }
}

/// An immutable action definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    category: ActionCategory,
    #[serde(default)]
    target: TargetMode,
    #[serde(default = "default_length")]
    length: f64,
    #[serde(default = "default_damage_multiplier")]
    damage_multiplier: f64,
    #[serde(default)]
    flags: ActionFlags,
    #[serde(default)]
    combo_order: Option<u32>,
    #[serde(default)]
    advanced: AdvancedProperties,
    #[serde(default)]
    triggers: Vec<TriggerCondition>,
}

fn default_length() -> f64 {
    1.0
}

fn default_damage_multiplier() -> f64 {
    1.0
}

impl Action {
    /// Creates an action with unit length and damage multiplier.
    #[must_use]
    pub fn new(id: &str, category: ActionCategory) -> Self {
        Self {
            id: ActionId::new(id),
            category,
            target: match category {
                ActionCategory::Heal | ActionCategory::Buff => TargetMode::SelfTarget,
                _ => TargetMode::Single,
            },
            length: default_length(),
            damage_multiplier: default_damage_multiplier(),
            flags: ActionFlags::empty(),
            combo_order: None,
            advanced: AdvancedProperties::default(),
            triggers: Vec::new(),
        }
    }

    /// Sets the target mode.
    #[must_use]
    pub fn with_target(mut self, target: TargetMode) -> Self {
        self.target = target;
        self
    }

    /// Sets the base timing length.
    #[must_use]
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Sets the strength-to-damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Adds side-effect flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ActionFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Marks the action as a combo member at the given position.
    #[must_use]
    pub fn as_combo(mut self, order: u32) -> Self {
        self.flags |= ActionFlags::IS_COMBO;
        self.combo_order = Some(order);
        self
    }

    /// Makes the action strike `count` times at `percent` of full damage each.
    #[must_use]
    pub fn with_multi_hit(mut self, count: u32, percent: f64) -> Self {
        self.advanced.multi_hit_count = count.max(1);
        self.advanced.multi_hit_damage_percent = percent;
        self
    }

    /// Sets the flat heal amount.
    #[must_use]
    pub fn with_heal_amount(mut self, amount: u32) -> Self {
        self.advanced.heal_amount = amount;
        self
    }

    /// Sets the attack roll bonus.
    #[must_use]
    pub fn with_roll_bonus(mut self, bonus: i32) -> Self {
        self.advanced.roll_bonus = bonus;
        self
    }

    /// Replaces the trigger conditions.
    #[must_use]
    pub fn with_triggers(mut self, triggers: impl IntoIterator<Item = TriggerCondition>) -> Self {
        self.triggers = triggers.into_iter().collect();
        self
    }

    /// Checks timing and multipliers for values the resolver cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] for a length that is not a
    /// positive finite number, a negative or non-finite damage multiplier or
    /// multi-hit percentage, or a health threshold outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), CombatError> {
        // 0.0 is the "no action" duration on the timeline.
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(CombatError::InvalidArgument(format!(
                "action {}: length must be positive and finite, got {}",
                self.id, self.length
            )));
        }
        let checks = [
            ("damage_multiplier", self.damage_multiplier),
            (
                "multi_hit_damage_percent",
                self.advanced.multi_hit_damage_percent,
            ),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(CombatError::InvalidArgument(format!(
                    "action {}: {name} must be finite and non-negative, got {value}",
                    self.id
                )));
            }
        }
        for condition in &self.triggers {
            if let TriggerCondition::HealthBelow(fraction) = condition {
                if !(0.0..=1.0).contains(fraction) {
                    return Err(CombatError::InvalidArgument(format!(
                        "action {}: health threshold {fraction} outside [0, 1]",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// The action's identifier.
    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// The action's category.
    #[must_use]
    pub fn category(&self) -> ActionCategory {
        self.category
    }

    /// The action's target mode.
    #[must_use]
    pub fn target(&self) -> TargetMode {
        self.target
    }

    /// Base timing length before modifiers.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Strength-to-damage multiplier.
    #[must_use]
    pub fn damage_multiplier(&self) -> f64 {
        self.damage_multiplier
    }

    /// Side-effect flags.
    #[must_use]
    pub fn flags(&self) -> ActionFlags {
        self.flags
    }

    /// Returns true if the action belongs to a combo chain.
    #[must_use]
    pub fn is_combo(&self) -> bool {
        self.flags.contains(ActionFlags::IS_COMBO)
    }

    /// Position in the combo chain, if any.
    #[must_use]
    pub fn combo_order(&self) -> Option<u32> {
        self.combo_order
    }

    /// Advanced numeric properties.
    #[must_use]
    pub fn advanced(&self) -> &AdvancedProperties {
        &self.advanced
    }

    /// Hits per use, never less than 1.
    #[must_use]
    pub fn multi_hit_count(&self) -> u32 {
        self.advanced.multi_hit_count.max(1)
    }

    /// Trigger conditions this action subscribes to.
    #[must_use]
    pub fn triggers(&self) -> &[TriggerCondition] {
        &self.triggers
    }
}
