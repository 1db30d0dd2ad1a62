//! Error types for the combat core.
//!
//! Lookups on unknown keys are not errors anywhere in this crate: they return
//! `None`, `false` or zero. [`CombatError`] is reserved for contract
//! violations and for operations that cannot proceed without a present entity.

use thiserror::Error;

use knuckle::DiceError;

use crate::state::GameState;

/// Errors produced by the combat core.
#[derive(Debug, Error)]
pub enum CombatError {
    /// A caller passed a value outside the operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation required an entity that does not exist.
    #[error("{what} not found: {key}")]
    StateNotFound {
        /// Kind of entity that was looked up.
        what: &'static str,
        /// Key that was looked up.
        key: String,
    },

    /// An outcome handler reported a failure during trigger dispatch.
    #[error("outcome handler `{handler}` failed: {source}")]
    HandlerFailure {
        /// Name of the failing handler.
        handler: String,
        /// What the handler reported.
        #[source]
        source: anyhow::Error,
    },

    /// A combat turn was requested outside the Combat state.
    #[error("combat turns require the Combat state, current state is {state}")]
    NotInCombat {
        /// The state the machine was in.
        state: GameState,
    },
}

impl CombatError {
    /// Shorthand for [`CombatError::StateNotFound`].
    pub(crate) fn not_found(what: &'static str, key: impl ToString) -> Self {
        Self::StateNotFound {
            what,
            key: key.to_string(),
        }
    }

    /// Returns true for handler failures.
    #[must_use]
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::HandlerFailure { .. })
    }
}

impl From<DiceError> for CombatError {
    fn from(err: DiceError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
