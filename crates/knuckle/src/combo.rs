//! Tiered d20 rolls for combo selection.
//!
//! A combo roll is `d20 + bonus`. The raw total decides the tier:
//!
//! | raw      | tier   | success | combo |
//! |----------|--------|---------|-------|
//! | ≤ 5      | Fail   | no      | no    |
//! | 6 ..= 13 | Normal | yes     | no    |
//! | ≥ 14     | Combo  | yes     | yes   |
//!
//! The reported `roll` is the raw total clamped to a minimum of 1, so a large
//! negative bonus never produces a zero or negative result. Classification
//! always uses the unclamped raw value.
//!
//! A continuation roll (used to extend an active combo chain) draws the same
//! way but only succeeds in the Combo tier.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::D20;

/// Highest raw total that still fails.
pub const FAIL_MAX: i32 = 5;

/// Lowest raw total that reaches the combo tier.
pub const COMBO_MIN: i32 = 14;

// =============================================================================
// Roll Tier
// =============================================================================

/// Outcome bracket of a combo roll.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollTier {
    /// Raw total of 5 or less.
    Fail,
    /// Raw total from 6 to 13.
    Normal,
    /// Raw total of 14 or more.
    Combo,
}

impl RollTier {
    /// Classifies a raw (bonus-applied, unclamped) total.
    #[must_use]
    pub const fn classify(raw: i32) -> Self {
        if raw <= FAIL_MAX {
            Self::Fail
        } else if raw < COMBO_MIN {
            Self::Normal
        } else {
            Self::Combo
        }
    }
}

impl fmt::Display for RollTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "Fail"),
            Self::Normal => write!(f, "Normal"),
            Self::Combo => write!(f, "Combo"),
        }
    }
}

// =============================================================================
// Combo Roll
// =============================================================================

/// Result of a tiered combo roll.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboRoll {
    /// Effective roll, clamped to at least 1.
    pub roll: u32,
    /// Raw total `natural + bonus` before clamping.
    pub raw: i32,
    /// The face shown on the d20.
    pub natural: u32,
    /// Bonus added to the natural face.
    pub bonus: i32,
    /// Tier the raw total falls into.
    pub tier: RollTier,
    /// Whether the roll succeeded.
    pub success: bool,
    /// Whether the roll triggers (or continues) a combo.
    pub combo_triggered: bool,
}

impl ComboRoll {
    /// Builds the result of a combo-action roll from a known d20 face.
    ///
    /// Fail gives no success; Normal succeeds without a combo; Combo does both.
    #[must_use]
    pub fn action(natural: u32, bonus: i32) -> Self {
        let raw = raw_total(natural, bonus);
        let tier = RollTier::classify(raw);
        Self {
            roll: clamp_roll(raw),
            raw,
            natural,
            bonus,
            tier,
            success: tier != RollTier::Fail,
            combo_triggered: tier == RollTier::Combo,
        }
    }

    /// Builds the result of a combo-continue roll from a known d20 face.
    ///
    /// Only the Combo tier counts as success here, and success is exactly
    /// what keeps the chain going.
    #[must_use]
    pub fn continuation(natural: u32, bonus: i32) -> Self {
        let raw = raw_total(natural, bonus);
        let tier = RollTier::classify(raw);
        let success = tier == RollTier::Combo;
        Self {
            roll: clamp_roll(raw),
            raw,
            natural,
            bonus,
            tier,
            success,
            combo_triggered: success,
        }
    }

    /// Returns true if the d20 showed its highest face.
    #[must_use]
    pub const fn is_natural_max(&self) -> bool {
        self.natural == D20
    }

    /// Returns true if the d20 showed a 1.
    #[must_use]
    pub const fn is_natural_min(&self) -> bool {
        self.natural == 1
    }

    /// Returns true if this roll permits selecting a combo action.
    ///
    /// A natural 20 qualifies regardless of the bonus.
    #[must_use]
    pub fn qualifies_for_combo(&self) -> bool {
        self.combo_triggered || self.is_natural_max()
    }
}

fn raw_total(natural: u32, bonus: i32) -> i32 {
    i32::try_from(natural).map_or(i32::MAX, |n| n.saturating_add(bonus))
}

fn clamp_roll(raw: i32) -> u32 {
    u32::try_from(raw.max(1)).unwrap_or(1)
}

fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=D20)
}

/// Rolls `d20 + bonus` to decide whether an action can open a combo.
///
/// # Example
///
/// ```
/// use knuckle::{roll_combo_action, RollTier};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(5);
/// let result = roll_combo_action(&mut rng, -100);
/// assert_eq!(result.roll, 1);
/// assert_eq!(result.tier, RollTier::Fail);
/// ```
pub fn roll_combo_action<R: Rng + ?Sized>(rng: &mut R, bonus: i32) -> ComboRoll {
    let result = ComboRoll::action(roll_d20(rng), bonus);
    debug!(
        natural = result.natural,
        bonus,
        raw = result.raw,
        tier = %result.tier,
        "combo action roll"
    );
    result
}

/// Rolls `d20 + bonus` to decide whether an active combo chain continues.
pub fn roll_combo_continue<R: Rng + ?Sized>(rng: &mut R, bonus: i32) -> ComboRoll {
    let result = ComboRoll::continuation(roll_d20(rng), bonus);
    debug!(
        natural = result.natural,
        bonus,
        raw = result.raw,
        success = result.success,
        "combo continue roll"
    );
    result
}
