//! Hit, damage and healing resolution.
//!
//! # Hit rule
//!
//! The attack total is the stored combo roll's raw value plus the action's
//! roll bonus. A natural 1 always misses (a critical miss). Otherwise the
//! attack lands when the total reaches the target's defense,
//! `armor + agility / 2`, and is critical on a natural 20 or a total at the
//! critical threshold.
//!
//! # Damage formula
//!
//! ```text
//! strength × action multiplier × (1 + combo amplifier)
//!          × roll scaling (critical, high or mid bracket)
//!          × weaken multiplier (if the attacker is weakened)
//!          − target armor, never below 1
//! ```
//!
//! # Clamping
//!
//! [`apply_damage`] and [`apply_healing`] keep health inside `[0, max]`.
//! Multi-hit actions apply each hit separately so each is clamped on its
//! own; the sequence stops as soon as the target is defeated.

use knuckle::ComboRoll;
use tracing::debug;

use crate::action::Action;
use crate::config::CombatConfig;
use crate::entity::Actor;

/// Health before and after a single change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HealthChange {
    /// Health before the change.
    pub before: u32,
    /// Health after the change.
    pub after: u32,
}

impl HealthChange {
    /// Absolute amount of health gained or lost.
    #[must_use]
    pub fn amount(&self) -> u32 {
        self.before.abs_diff(self.after)
    }

    /// Returns true if this change took a living actor to zero.
    #[must_use]
    pub fn defeated(&self) -> bool {
        self.before > 0 && self.after == 0
    }
}

/// Whether an attack connected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HitOutcome {
    /// The attack connected.
    Hit {
        /// The hit is critical.
        critical: bool,
    },
    /// The attack did not connect.
    Miss {
        /// The die showed a natural 1.
        critical: bool,
    },
}

impl HitOutcome {
    /// Returns true for a hit.
    #[must_use]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns true for a critical hit or a critical miss.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        match self {
            Self::Hit { critical } | Self::Miss { critical } => critical,
        }
    }
}

/// Attack total for the hit check: raw roll plus the action's bonus.
#[must_use]
pub fn attack_total(roll: &ComboRoll, action: &Action) -> i32 {
    roll.raw.saturating_add(action.advanced().roll_bonus)
}

/// Target defense: `armor + agility / 2`.
#[must_use]
pub fn defense(target: &Actor) -> i32 {
    let value = target.stats.armor.saturating_add(target.stats.agility / 2);
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Decides whether an attack with the given roll connects.
#[must_use]
pub fn resolve_hit(
    target: &Actor,
    action: &Action,
    roll: &ComboRoll,
    config: &CombatConfig,
) -> HitOutcome {
    if roll.is_natural_min() {
        return HitOutcome::Miss { critical: true };
    }
    let total = attack_total(roll, action);
    if total >= defense(target) {
        HitOutcome::Hit {
            critical: roll.is_natural_max() || total >= config.critical_hit_threshold,
        }
    } else {
        HitOutcome::Miss { critical: false }
    }
}

/// Damage multiplier from the attack total.
#[must_use]
pub fn roll_scaling(total: i32, critical: bool, config: &CombatConfig) -> f64 {
    if critical {
        config.critical_multiplier
    } else if total >= config.high_roll_threshold {
        config.high_roll_multiplier
    } else if total >= config.mid_roll_threshold {
        config.mid_roll_multiplier
    } else {
        1.0
    }
}

/// Full damage of one use of `action` before multi-hit splitting.
///
/// `chain_step` is the combo chain index the action was selected at, if it
/// was selected as a combo; each step amplifies damage further.
#[must_use]
pub fn compute_damage(
    source: &Actor,
    target: &Actor,
    action: &Action,
    roll: &ComboRoll,
    critical: bool,
    chain_step: Option<usize>,
    config: &CombatConfig,
) -> u32 {
    #[allow(clippy::cast_precision_loss)]
    let amplifier = chain_step.map_or(0.0, |step| (step + 1) as f64 * config.combo_amplifier_per_step);
    let mut damage = f64::from(source.stats.strength) * action.damage_multiplier() * (1.0 + amplifier);
    damage *= roll_scaling(attack_total(roll, action), critical, config);
    if source.status.is_weakened() {
        damage *= config.weaken_damage_multiplier;
    }
    let dealt = to_points(damage).saturating_sub(target.stats.armor).max(1);
    debug!(
        source = %source.id(),
        target = %target.id(),
        action = %action.id(),
        critical,
        dealt,
        "damage computed"
    );
    dealt
}

/// Damage of each hit of a multi-hit action; full damage for single hits.
#[must_use]
pub fn per_hit_damage(full: u32, action: &Action) -> u32 {
    if action.multi_hit_count() > 1 {
        to_points(f64::from(full) * action.advanced().multi_hit_damage_percent).max(1)
    } else {
        full
    }
}

/// Healing from a heal action.
#[must_use]
pub fn compute_healing(action: &Action) -> u32 {
    action.advanced().heal_amount
}

/// Lowers `actor`'s health by `amount`, stopping at 0.
pub fn apply_damage(actor: &mut Actor, amount: u32) -> HealthChange {
    let before = actor.health.current;
    actor.health.damage(amount);
    HealthChange {
        before,
        after: actor.health.current,
    }
}

/// Raises `actor`'s health by `amount`, stopping at max.
pub fn apply_healing(actor: &mut Actor, amount: u32) -> HealthChange {
    let before = actor.health.current;
    actor.health.heal(amount);
    HealthChange {
        before,
        after: actor.health.current,
    }
}

/// Applies up to `count` hits of `per_hit` damage, one at a time.
///
/// Stops after the hit that defeats the target, so the returned vector may be
/// shorter than `count`. An already defeated target takes no hits.
pub fn apply_multi_hit(target: &mut Actor, per_hit: u32, count: u32) -> Vec<HealthChange> {
    let mut changes = Vec::new();
    for _ in 0..count {
        if !target.is_alive() {
            break;
        }
        changes.push(apply_damage(target, per_hit));
    }
    changes
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_points(value: f64) -> u32 {
    // `as` saturates; NaN becomes 0.
    value.max(0.0).floor() as u32
}
