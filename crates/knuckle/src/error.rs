//! Error types for the dice engine.

use thiserror::Error;

/// Contract violations raised by the dice engine.
///
/// These are programmer errors: a die with no faces cannot be rolled, so the
/// call fails at the call site rather than producing a silent default.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiceError {
    /// The requested die has fewer than one face.
    #[error("invalid die: sides must be at least 1, got {sides}")]
    InvalidSides {
        /// The rejected side count.
        sides: u32,
    },
}
