//! # Knuckle
//!
//! Seedable dice engine for turn-based combat.
//!
//! Knuckle provides the random substrate the combat core draws on:
//!
//! - **Uniform rolls**: [`roll`] and [`roll_many`] over any [`rand::Rng`],
//!   plus [`roll_chance`] for percentile checks
//! - **Tiered combo rolls**: [`roll_combo_action`] and [`roll_combo_continue`]
//!   classify `d20 + bonus` into Fail / Normal / Combo tiers
//! - **Deterministic replay**: [`Dice`] wraps a seeded `ChaCha8Rng` so the same
//!   seed reproduces the same sequence of rolls on every platform
//!
//! ## Quick Start
//!
//! ```
//! use knuckle::{Dice, RollTier};
//!
//! let mut dice = Dice::new_with_seed(42);
//!
//! let damage = dice.roll_many(3, 6).unwrap();
//! assert!((3..=18).contains(&damage));
//!
//! let combo = dice.roll_combo_action(2);
//! assert!(combo.roll >= 1);
//! if combo.tier == RollTier::Combo {
//!     assert!(combo.combo_triggered);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod combo;
pub mod dice;
pub mod error;
pub mod roll;

// Re-exports for convenience
pub use combo::{roll_combo_action, roll_combo_continue, ComboRoll, RollTier};
pub use dice::Dice;
pub use error::DiceError;
pub use roll::{roll, roll_chance, roll_many};

/// Number of faces on the die used for combo and hit rolls.
pub const D20: u32 = 20;
