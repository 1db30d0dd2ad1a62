//! Per-actor status effect ledger.
//!
//! The [`StatusLedger`] records five independent afflictions:
//!
//! - **Poison / bleed**: an additive stack count, a damage-per-stack value
//!   that each application overwrites, and a shared timer. The bleed marker
//!   only changes how the affliction is reported; both decay identically.
//! - **Burn**: its own additive stack count and damage-per-stack value, with
//!   no timer. Each tick burns off one stack.
//! - **Stun**: while its counter is above zero the actor cannot act.
//! - **Weaken**: while its counter is above zero outgoing damage is reduced.
//!
//! # Decay
//!
//! [`StatusLedger::tick`] is called once per turn by the owner of the turn
//! loop. It deals `stacks × damage_per_stack`, then decrements every active
//! timer by one. Poison stacks stay as they are until the shared timer reaches
//! zero, at which point all stacks clear together. Burn deals
//! `burn_stacks × burn_damage_per_stack` and then loses one stack.
//!
//! # Flags and counters
//!
//! Each "is active" flag is derived from its counter, so a flag can never
//! disagree with its remaining-turn count. Poison is active exactly when both
//! its stack count and its timer are non-zero; the ledger never leaves one set
//! without the other.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StatusDefaults;

bitflags! {
    /// Readable snapshot of an actor's afflictions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Carries poison stacks.
        const POISONED = 1 << 0;
        /// The poison stacks are bleed.
        const BLEEDING = 1 << 1;
        /// Cannot act.
        const STUNNED = 1 << 2;
        /// Deals reduced damage.
        const WEAKENED = 1 << 3;
        /// Health is zero.
        const DEFEATED = 1 << 4;
        /// Carries burn stacks.
        const BURNING = 1 << 5;
    }
}

/// A single affliction to apply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Poison stacks with their own damage and timer.
    Poison {
        /// Stacks to add.
        stacks: u32,
        /// Damage each stack deals per tick.
        damage_per_stack: u32,
        /// Timer to refresh to.
        turns: u32,
    },
    /// Bleed stacks; shares poison's stack pool.
    Bleed {
        /// Stacks to add.
        stacks: u32,
        /// Damage each stack deals per tick.
        damage_per_stack: u32,
        /// Timer to refresh to.
        turns: u32,
    },
    /// Stun for a number of turns.
    Stun {
        /// Turns the actor cannot act.
        turns: u32,
    },
    /// Weaken for a number of turns.
    Weaken {
        /// Turns outgoing damage is reduced.
        turns: u32,
    },
    /// Burn stacks; one burns off per tick.
    Burn {
        /// Stacks to add.
        stacks: u32,
        /// Damage each stack deals per tick.
        damage_per_stack: u32,
    },
}

impl StatusEffect {
    /// Default poison from configuration.
    #[must_use]
    pub fn poison(defaults: &StatusDefaults) -> Self {
        Self::Poison {
            stacks: defaults.poison_stacks,
            damage_per_stack: defaults.poison_damage_per_stack,
            turns: defaults.affliction_turns,
        }
    }

    /// Default bleed from configuration.
    #[must_use]
    pub fn bleed(defaults: &StatusDefaults) -> Self {
        Self::Bleed {
            stacks: defaults.bleed_stacks,
            damage_per_stack: defaults.bleed_damage_per_stack,
            turns: defaults.affliction_turns,
        }
    }

    /// Default stun from configuration.
    #[must_use]
    pub fn stun(defaults: &StatusDefaults) -> Self {
        Self::Stun {
            turns: defaults.stun_turns,
        }
    }

    /// Default weaken from configuration.
    #[must_use]
    pub fn weaken(defaults: &StatusDefaults) -> Self {
        Self::Weaken {
            turns: defaults.weaken_turns,
        }
    }

    /// Default burn from configuration.
    #[must_use]
    pub fn burn(defaults: &StatusDefaults) -> Self {
        Self::Burn {
            stacks: defaults.burn_stacks,
            damage_per_stack: defaults.burn_damage_per_stack,
        }
    }

    /// Configured base chance that an action flag applies this effect.
    #[must_use]
    pub fn base_chance(self, defaults: &StatusDefaults) -> f64 {
        match self {
            Self::Poison { .. } => defaults.poison_chance,
            Self::Bleed { .. } => defaults.bleed_chance,
            Self::Stun { .. } => defaults.stun_chance,
            Self::Weaken { .. } => defaults.weaken_chance,
            Self::Burn { .. } => defaults.burn_chance,
        }
    }

    /// The stack count or turn count carried by the effect.
    #[must_use]
    pub fn magnitude(self) -> u32 {
        match self {
            Self::Poison { stacks, .. } | Self::Bleed { stacks, .. } | Self::Burn { stacks, .. } => {
                stacks
            }
            Self::Stun { turns } | Self::Weaken { turns } => turns,
        }
    }
}

/// What a single end-of-turn tick did.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StatusTick {
    /// Poison, bleed and burn damage owed by the actor this tick.
    pub damage: u32,
    /// Afflictions that ran out during this tick.
    pub expired: StatusFlags,
}

/// Stacking and timed afflictions owned by one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLedger {
    poison_stacks: u32,
    damage_per_stack: u32,
    bleeding: bool,
    poison_turns: u32,
    stun_turns: u32,
    weaken_turns: u32,
    #[serde(default)]
    burn_stacks: u32,
    #[serde(default)]
    burn_damage_per_stack: u32,
}

impl StatusLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Application
    // =========================================================================

    /// Adds poison stacks with the configured `affliction_turns` timer.
    ///
    /// Stacks add to whatever is already present, `damage_per_stack`
    /// replaces the previous value, and `bleeding` marks the stacks as bleed
    /// (it is never unset here).
    pub fn apply_poison(
        &mut self,
        stacks: u32,
        damage_per_stack: u32,
        bleeding: bool,
        defaults: &StatusDefaults,
    ) {
        self.apply_poison_for(stacks, damage_per_stack, bleeding, defaults.affliction_turns);
    }

    /// Adds poison stacks and refreshes the shared timer to at least `turns`.
    ///
    /// Applying zero stacks to a clean ledger, or with zero turns, leaves the
    /// ledger untouched.
    pub fn apply_poison_for(
        &mut self,
        stacks: u32,
        damage_per_stack: u32,
        bleeding: bool,
        turns: u32,
    ) {
        let total = self.poison_stacks.saturating_add(stacks);
        if total == 0 || turns == 0 {
            return;
        }
        self.poison_stacks = total;
        self.damage_per_stack = damage_per_stack;
        self.bleeding |= bleeding;
        self.poison_turns = self.poison_turns.max(turns);
        debug!(
            stacks = self.poison_stacks,
            damage_per_stack,
            bleeding = self.bleeding,
            turns = self.poison_turns,
            "poison applied"
        );
    }

    /// Stuns for at least `turns` more turns. Re-application refreshes, it
    /// does not add.
    pub fn apply_stun(&mut self, turns: u32) {
        self.stun_turns = self.stun_turns.max(turns);
    }

    /// Weakens for at least `turns` more turns. Re-application refreshes, it
    /// does not add.
    pub fn apply_weaken(&mut self, turns: u32) {
        self.weaken_turns = self.weaken_turns.max(turns);
    }

    /// Adds burn stacks. `damage_per_stack` replaces the previous value.
    ///
    /// Applying zero stacks to a ledger that is not burning leaves it
    /// untouched.
    pub fn apply_burn(&mut self, stacks: u32, damage_per_stack: u32) {
        let total = self.burn_stacks.saturating_add(stacks);
        if total == 0 {
            return;
        }
        self.burn_stacks = total;
        self.burn_damage_per_stack = damage_per_stack;
        debug!(stacks = self.burn_stacks, damage_per_stack, "burn applied");
    }

    /// Applies one [`StatusEffect`].
    pub fn apply(&mut self, effect: StatusEffect) {
        match effect {
            StatusEffect::Poison {
                stacks,
                damage_per_stack,
                turns,
            } => self.apply_poison_for(stacks, damage_per_stack, false, turns),
            StatusEffect::Bleed {
                stacks,
                damage_per_stack,
                turns,
            } => self.apply_poison_for(stacks, damage_per_stack, true, turns),
            StatusEffect::Stun { turns } => self.apply_stun(turns),
            StatusEffect::Weaken { turns } => self.apply_weaken(turns),
            StatusEffect::Burn {
                stacks,
                damage_per_stack,
            } => self.apply_burn(stacks, damage_per_stack),
        }
    }

    // =========================================================================
    // Decay
    // =========================================================================

    /// Runs one end-of-turn tick.
    ///
    /// Returns the damage the owner should take; the ledger does not touch
    /// health itself.
    pub fn tick(&mut self) -> StatusTick {
        let mut tick = StatusTick::default();

        if self.is_poisoned() {
            tick.damage = self.poison_stacks.saturating_mul(self.damage_per_stack);
            self.poison_turns -= 1;
            if self.poison_turns == 0 {
                tick.expired |= if self.bleeding {
                    StatusFlags::POISONED | StatusFlags::BLEEDING
                } else {
                    StatusFlags::POISONED
                };
                self.clear_poison();
            }
        }

        if self.is_burning() {
            tick.damage = tick
                .damage
                .saturating_add(self.burn_stacks.saturating_mul(self.burn_damage_per_stack));
            self.burn_stacks -= 1;
            if self.burn_stacks == 0 {
                tick.expired |= StatusFlags::BURNING;
                self.clear_burn();
            }
        }

        if self.stun_turns > 0 {
            self.stun_turns -= 1;
            if self.stun_turns == 0 {
                tick.expired |= StatusFlags::STUNNED;
            }
        }

        if self.weaken_turns > 0 {
            self.weaken_turns -= 1;
            if self.weaken_turns == 0 {
                tick.expired |= StatusFlags::WEAKENED;
            }
        }

        tick
    }

    /// Removes all poison and bleed stacks.
    pub fn clear_poison(&mut self) {
        self.poison_stacks = 0;
        self.damage_per_stack = 0;
        self.bleeding = false;
        self.poison_turns = 0;
    }

    /// Removes all burn stacks.
    pub fn clear_burn(&mut self) {
        self.burn_stacks = 0;
        self.burn_damage_per_stack = 0;
    }

    /// Removes every affliction.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    // =========================================================================
    // Readout
    // =========================================================================

    /// Current poison/bleed stack count.
    #[must_use]
    pub fn poison_stacks(&self) -> u32 {
        self.poison_stacks
    }

    /// Damage each stack deals per tick.
    #[must_use]
    pub fn damage_per_stack(&self) -> u32 {
        self.damage_per_stack
    }

    /// Turns left on the shared poison timer.
    #[must_use]
    pub fn poison_turns(&self) -> u32 {
        self.poison_turns
    }

    /// Returns true while poison or bleed stacks are active.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poison_stacks > 0 && self.poison_turns > 0
    }

    /// Returns true if the active stacks are bleed.
    #[must_use]
    pub fn is_bleeding(&self) -> bool {
        self.bleeding && self.is_poisoned()
    }

    /// Current burn stack count.
    #[must_use]
    pub fn burn_stacks(&self) -> u32 {
        self.burn_stacks
    }

    /// Damage each burn stack deals per tick.
    #[must_use]
    pub fn burn_damage_per_stack(&self) -> u32 {
        self.burn_damage_per_stack
    }

    /// Returns true while burn stacks remain.
    #[must_use]
    pub fn is_burning(&self) -> bool {
        self.burn_stacks > 0
    }

    /// Returns true while the stun counter is above zero.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun_turns > 0
    }

    /// Turns of stun remaining.
    #[must_use]
    pub fn stun_turns(&self) -> u32 {
        self.stun_turns
    }

    /// Returns true while the weaken counter is above zero.
    #[must_use]
    pub fn is_weakened(&self) -> bool {
        self.weaken_turns > 0
    }

    /// Turns of weaken remaining.
    #[must_use]
    pub fn weaken_turns(&self) -> u32 {
        self.weaken_turns
    }

    /// Snapshot of active afflictions.
    #[must_use]
    pub fn flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::empty();
        flags.set(StatusFlags::POISONED, self.is_poisoned());
        flags.set(StatusFlags::BLEEDING, self.is_bleeding());
        flags.set(StatusFlags::STUNNED, self.is_stunned());
        flags.set(StatusFlags::WEAKENED, self.is_weakened());
        flags.set(StatusFlags::BURNING, self.is_burning());
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn defaults() -> StatusDefaults {
        StatusDefaults::default()
    }

    mod poison_tests {
        use super::*;

        #[test]
        fn stacks_add_and_damage_per_stack_overwrites() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison(2, 3, false, &defaults());
            ledger.apply_poison(3, 5, false, &defaults());
            assert_eq!(ledger.poison_stacks(), 5);
            assert_eq!(ledger.damage_per_stack(), 5);
        }

        #[test]
        fn bleed_flag_is_sticky_until_clear() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison(1, 2, true, &defaults());
            ledger.apply_poison(1, 2, false, &defaults());
            assert!(ledger.is_bleeding());
            ledger.clear_poison();
            assert!(!ledger.is_bleeding());
            assert!(!ledger.flags().contains(StatusFlags::BLEEDING));
        }

        #[test]
        fn one_tick_deals_stacks_times_damage_and_keeps_stacks() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison(5, 3, false, &defaults());
            let tick = ledger.tick();
            assert_eq!(tick.damage, 15);
            assert_eq!(ledger.poison_stacks(), 5);
            assert_eq!(ledger.poison_turns(), defaults().affliction_turns - 1);
        }

        #[test]
        fn stacks_clear_when_shared_timer_runs_out() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison_for(4, 2, true, 2);
            assert_eq!(ledger.tick().damage, 8);
            let last = ledger.tick();
            assert_eq!(last.damage, 8);
            assert!(last.expired.contains(StatusFlags::POISONED | StatusFlags::BLEEDING));
            assert_eq!(ledger.poison_stacks(), 0);
            assert_eq!(ledger.tick().damage, 0);
        }

        #[test]
        fn reapplication_refreshes_timer_to_max() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison_for(1, 1, false, 5);
            ledger.apply_poison_for(1, 1, false, 2);
            assert_eq!(ledger.poison_turns(), 5);
        }

        #[test]
        fn apply_poison_uses_configured_duration() {
            let mut tuned = defaults();
            tuned.affliction_turns = 6;
            let mut ledger = StatusLedger::new();
            ledger.apply_poison(1, 1, false, &tuned);
            assert_eq!(ledger.poison_turns(), 6);
        }

        #[test]
        fn zero_stacks_on_clean_ledger_is_a_no_op() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison(0, 9, true, &defaults());
            assert_eq!(ledger, StatusLedger::new());
            assert!(!ledger.is_poisoned());
        }
    }

    mod burn_tests {
        use super::*;

        #[test]
        fn burn_loses_one_stack_per_tick() {
            let mut ledger = StatusLedger::new();
            ledger.apply_burn(2, 4);
            assert!(ledger.flags().contains(StatusFlags::BURNING));

            assert_eq!(ledger.tick().damage, 8);
            assert_eq!(ledger.burn_stacks(), 1);
            let last = ledger.tick();
            assert_eq!(last.damage, 4);
            assert!(last.expired.contains(StatusFlags::BURNING));
            assert!(!ledger.is_burning());
            assert_eq!(ledger.burn_damage_per_stack(), 0);
            assert_eq!(ledger.tick().damage, 0);
        }

        #[test]
        fn burn_and_poison_tick_independently() {
            let mut ledger = StatusLedger::new();
            ledger.apply_poison_for(2, 3, false, 1);
            ledger.apply(StatusEffect::burn(&defaults()));
            let tick = ledger.tick();
            assert_eq!(tick.damage, 2 * 3 + 3);
            assert_eq!(tick.expired, StatusFlags::POISONED | StatusFlags::BURNING);
            assert!(ledger.flags().is_empty());
        }

        #[test]
        fn burn_stacks_add_and_damage_overwrites() {
            let mut ledger = StatusLedger::new();
            ledger.apply_burn(1, 2);
            ledger.apply_burn(2, 5);
            assert_eq!(ledger.burn_stacks(), 3);
            assert_eq!(ledger.burn_damage_per_stack(), 5);
            ledger.apply_burn(0, 9);
            assert_eq!(ledger.burn_damage_per_stack(), 9);
            ledger.clear_all();
            ledger.apply_burn(0, 9);
            assert_eq!(ledger, StatusLedger::new());
        }
    }

    mod timed_effect_tests {
        use super::*;

        #[test]
        fn weaken_refreshes_rather_than_stacks() {
            let mut ledger = StatusLedger::new();
            ledger.apply_weaken(3);
            ledger.apply_weaken(2);
            assert_eq!(ledger.weaken_turns(), 3);
            ledger.apply_weaken(5);
            assert_eq!(ledger.weaken_turns(), 5);
        }

        #[test]
        fn stun_flag_follows_counter() {
            let mut ledger = StatusLedger::new();
            ledger.apply_stun(1);
            assert!(ledger.is_stunned());
            assert!(ledger.flags().contains(StatusFlags::STUNNED));

            let tick = ledger.tick();
            assert!(tick.expired.contains(StatusFlags::STUNNED));
            assert_eq!(ledger.stun_turns(), 0);
            assert!(!ledger.is_stunned());
            assert!(!ledger.flags().contains(StatusFlags::STUNNED));
        }

        #[test]
        fn zero_turn_weaken_does_not_activate() {
            let mut ledger = StatusLedger::new();
            ledger.apply_weaken(0);
            assert!(!ledger.is_weakened());
        }

        #[test]
        fn apply_dispatches_by_effect() {
            let defaults = StatusDefaults::default();
            let mut ledger = StatusLedger::new();
            ledger.apply(StatusEffect::bleed(&defaults));
            ledger.apply(StatusEffect::stun(&defaults));
            ledger.apply(StatusEffect::weaken(&defaults));
            assert_eq!(
                ledger.flags(),
                StatusFlags::POISONED
                    | StatusFlags::BLEEDING
                    | StatusFlags::STUNNED
                    | StatusFlags::WEAKENED
            );
            ledger.clear_all();
            assert!(ledger.flags().is_empty());
        }
    }

    proptest! {
        #[test]
        fn poison_stacks_are_additive(applications in prop::collection::vec((0u32..20, 0u32..10), 1..10)) {
            let mut ledger = StatusLedger::new();
            let mut expected = 0u32;
            for (stacks, dps) in &applications {
                ledger.apply_poison(*stacks, *dps, false, &defaults());
                expected += stacks;
            }
            prop_assert_eq!(ledger.poison_stacks(), expected);
        }

        #[test]
        fn weaken_duration_is_running_max(turns in prop::collection::vec(0u32..50, 1..10)) {
            let mut ledger = StatusLedger::new();
            for t in &turns {
                ledger.apply_weaken(*t);
            }
            prop_assert_eq!(ledger.weaken_turns(), *turns.iter().max().unwrap());
            prop_assert_eq!(ledger.is_weakened(), ledger.weaken_turns() > 0);
        }

        #[test]
        fn flags_never_diverge_from_counters(stun in 0u32..5, weaken in 0u32..5, ticks in 0usize..8) {
            let mut ledger = StatusLedger::new();
            ledger.apply_stun(stun);
            ledger.apply_weaken(weaken);
            for _ in 0..ticks {
                ledger.tick();
                prop_assert_eq!(ledger.flags().contains(StatusFlags::STUNNED), ledger.stun_turns() > 0);
                prop_assert_eq!(ledger.flags().contains(StatusFlags::WEAKENED), ledger.weaken_turns() > 0);
            }
        }
    }
}
