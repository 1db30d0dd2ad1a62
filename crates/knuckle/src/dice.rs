//! Seedable dice source.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combo::{roll_combo_action, roll_combo_continue, ComboRoll};
use crate::error::DiceError;
use crate::roll::{roll, roll_chance, roll_many};

/// A dice source backed by a `ChaCha8Rng`.
///
/// Two `Dice` created with the same seed produce the same sequence of rolls.
/// A seeded source remembers its seed so [`Dice::reset`] can replay from the
/// start.
///
/// # Example
///
/// ```
/// use knuckle::Dice;
///
/// let mut a = Dice::new_with_seed(42);
/// let mut b = Dice::new_with_seed(42);
/// assert_eq!(a.roll(20).unwrap(), b.roll(20).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Dice {
    rng: ChaCha8Rng,
    /// Original seed for replay
    seed: Option<u64>,
}

impl Dice {
    /// Creates a deterministic dice source from a seed.
    #[must_use]
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Creates a dice source seeded from operating-system entropy.
    ///
    /// The sequence is not reproducible; [`Dice::seed`] returns `None`.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            seed: None,
        }
    }

    /// Returns the seed this source was created with, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Restarts the sequence from the original seed.
    ///
    /// Has no effect on an entropy-seeded source.
    pub fn reset(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
    }

    /// Mutable access to the underlying generator.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Rolls one die. See [`roll`].
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::InvalidSides`] if `sides` is 0.
    pub fn roll(&mut self, sides: u32) -> Result<u32, DiceError> {
        roll(&mut self.rng, sides)
    }

    /// Rolls and sums several dice. See [`roll_many`].
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::InvalidSides`] if `sides` is 0.
    pub fn roll_many(&mut self, count: u32, sides: u32) -> Result<u64, DiceError> {
        roll_many(&mut self.rng, count, sides)
    }

    /// Rolls a d100 against a probability. See [`roll_chance`].
    pub fn roll_chance(&mut self, chance: f64) -> bool {
        roll_chance(&mut self.rng, chance)
    }

    /// Rolls a combo-action check. See [`roll_combo_action`].
    pub fn roll_combo_action(&mut self, bonus: i32) -> ComboRoll {
        roll_combo_action(&mut self.rng, bonus)
    }

    /// Rolls a combo-continue check. See [`roll_combo_continue`].
    pub fn roll_combo_continue(&mut self, bonus: i32) -> ComboRoll {
        roll_combo_continue(&mut self.rng, bonus)
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_entropy()
    }
}
