//! # Fray Core
//!
//! Turn-based combat core for Fray.
//!
//! This crate resolves combat turns between characters and enemies: it picks
//! actions from dice tiers and combo chains, times them on a speed-based
//! timeline, applies damage, healing and afflictions, and routes the
//! resulting events to outcome handlers.
//!
//! ## Architecture
//!
//! Components, leaf first:
//!
//! - **Dice**: the [`knuckle`] crate (uniform and tiered combo rolls)
//! - **Status ledger**: per-actor stacking and timed afflictions ([`status`])
//! - **Resolver**: action speed, hit checks, damage and healing ([`resolver`])
//! - **Selector**: combo chain selection from dice tiers ([`selector`])
//! - **Trigger dispatcher**: conditional outcome handlers ([`trigger`])
//! - **Game state machine**: coarse mode gating ([`state`])
//!
//! [`session::CombatSession`] wires them into the turn pipeline and owns
//! every piece of per-fight state.
//!
//! ## Usage
//!
//! ```
//! use fray_core::{Action, ActionCategory, ActorRole, CombatConfig, CombatSession, GameState};
//!
//! let mut session = CombatSession::new(CombatConfig::default(), 42).unwrap();
//! let hero = session.roster_mut().spawn("Ayla", ActorRole::Character, 30);
//! session
//!     .roster_mut()
//!     .get_mut(hero)
//!     .unwrap()
//!     .add_action(Action::new("SLASH", ActionCategory::Attack), 1.0);
//! session.roster_mut().spawn("Slime", ActorRole::Enemy, 10);
//!
//! session.begin();
//! assert!(session.state().is_in(GameState::Combat));
//! let report = session.resolve_turn(hero, None).unwrap();
//! assert_eq!(report.action.unwrap().as_str(), "SLASH");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the dice engine
pub use knuckle;

pub mod action;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod resolver;
pub mod roster;
pub mod selector;
pub mod session;
pub mod state;
pub mod status;
pub mod timeline;
pub mod trigger;
pub mod usage;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use action::{Action, ActionCategory, ActionFlags, ActionId, TargetMode, TriggerCondition};
pub use config::{CombatConfig, StatusDefaults};
pub use entity::{Actor, ActorId, ActorRole, Health, Stats};
pub use error::CombatError;
pub use event::{CombatEvent, CombatEventKind, EventLog};
pub use roster::Roster;
pub use session::{CombatSession, SkipReason, TurnReport};
pub use state::{GameState, GameStateMachine};
pub use status::{StatusEffect, StatusFlags, StatusLedger};
pub use trigger::{OutcomeContext, OutcomeHandler, TriggerDispatcher};
pub use usage::ActionUsageTracker;
