//! Uniform dice rolls.
//!
//! Both functions are generic over the random source so callers can pass a
//! seeded generator for replay or a thread-local one for casual use. The
//! underlying draw is `Rng::gen_range`, which is uniform and unbiased over
//! the inclusive range.

use rand::Rng;
use tracing::trace;

use crate::error::DiceError;

const PERCENTILE_SIDES: u32 = 100;

/// Rolls a single die with `sides` faces.
///
/// Returns a value in `[1, sides]`.
///
/// # Errors
///
/// Returns [`DiceError::InvalidSides`] if `sides` is 0.
///
/// # Example
///
/// ```
/// use knuckle::roll;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let face = roll(&mut rng, 6).unwrap();
/// assert!((1..=6).contains(&face));
/// assert!(roll(&mut rng, 0).is_err());
/// ```
pub fn roll<R: Rng + ?Sized>(rng: &mut R, sides: u32) -> Result<u32, DiceError> {
    if sides < 1 {
        return Err(DiceError::InvalidSides { sides });
    }
    let face = rng.gen_range(1..=sides);
    trace!(sides, face, "rolled die");
    Ok(face)
}

/// Rolls `count` dice with `sides` faces each and returns their sum.
///
/// The result lies in `[count, count * sides]`. A `count` of 0 rolls nothing
/// and returns 0. The sum is widened to `u64` so large pools cannot overflow.
///
/// # Errors
///
/// Returns [`DiceError::InvalidSides`] if `sides` is 0, even when `count` is 0.
pub fn roll_many<R: Rng + ?Sized>(rng: &mut R, count: u32, sides: u32) -> Result<u64, DiceError> {
    if sides < 1 {
        return Err(DiceError::InvalidSides { sides });
    }
    let mut total = 0u64;
    for _ in 0..count {
        total += u64::from(rng.gen_range(1..=sides));
    }
    Ok(total)
}

/// Rolls a d100 against `chance`, a probability in `[0, 1]`.
///
/// Succeeds when the face is at most `chance × 100`. A chance of 0 or less
/// (or NaN) always fails and a chance of 1 or more always succeeds; neither
/// consumes a draw.
///
/// # Example
///
/// ```
/// use knuckle::roll_chance;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(3);
/// assert!(roll_chance(&mut rng, 1.0));
/// assert!(!roll_chance(&mut rng, 0.0));
/// ```
pub fn roll_chance<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    if chance.is_nan() || chance <= 0.0 {
        return false;
    }
    if chance >= 1.0 {
        return true;
    }
    let face = rng.gen_range(1..=PERCENTILE_SIDES);
    let success = f64::from(face) <= chance * f64::from(PERCENTILE_SIDES);
    trace!(chance, face, success, "rolled chance");
    success
}
