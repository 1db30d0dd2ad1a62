//! Combo action selection.
//!
//! Each turn the selector draws one tiered d20 roll for the acting actor and
//! decides whether the actor performs the next entry of its combo chain.
//!
//! # Rules
//!
//! - With no chain in progress the selector draws a combo-action roll; with a
//!   chain in progress it draws a combo-continue roll.
//! - A roll in the Combo tier (or a natural 20, whatever the bonus) selects
//!   the lowest combo-order entry not yet consumed, and consumes it.
//! - A Fail or Normal roll selects nothing. If a chain was in progress it is
//!   broken and returns to its first entry.
//! - When the last entry is consumed the chain returns to its first entry.
//!
//! "No selection" is a normal outcome: the caller then uses the actor's
//! default action.
//!
//! The roll is stored per actor so later steps of the same turn (hit and
//! damage resolution) reuse it instead of rolling again.

use std::collections::HashMap;

use knuckle::{ComboRoll, Dice};
use tracing::debug;

use crate::action::ActionId;
use crate::config::CombatConfig;
use crate::entity::{Actor, ActorId};

/// Result of a selection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The roll that decided the selection.
    pub roll: ComboRoll,
    /// The chosen combo action, or `None` for "no selection".
    pub action: Option<ActionId>,
    /// Chain index of the chosen action.
    pub chain_step: Option<usize>,
}

/// Picks combo actions from dice tiers and remembers each actor's last roll.
#[derive(Debug, Clone, Default)]
pub struct ActionSelector {
    stored_rolls: HashMap<ActorId, ComboRoll>,
}

impl ActionSelector {
    /// Creates a selector with no stored rolls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a roll for `actor` and selects its next combo action, if any.
    ///
    /// The stat-derived roll bonus comes from [`Actor::roll_bonus`].
    pub fn select_action(
        &mut self,
        actor: &mut Actor,
        dice: &mut Dice,
        config: &CombatConfig,
    ) -> Selection {
        let bonus = actor.roll_bonus(None, config);
        let chain_active = actor.combo_step() > 0;
        let roll = if chain_active {
            dice.roll_combo_continue(bonus)
        } else {
            dice.roll_combo_action(bonus)
        };
        self.stored_rolls.insert(actor.id(), roll);
        Self::select_with_roll(actor, roll)
    }

    /// Applies the selection rules to an already drawn roll.
    ///
    /// Does not touch stored rolls; useful for replaying a known roll.
    pub fn select_with_roll(actor: &mut Actor, roll: ComboRoll) -> Selection {
        let chain_active = actor.combo_step() > 0;
        let chain: Vec<ActionId> = actor
            .combo_actions()
            .into_iter()
            .map(|a| a.id().clone())
            .collect();

        if chain.is_empty() || !roll.qualifies_for_combo() {
            if chain_active {
                debug!(actor = %actor.id(), raw = roll.raw, "combo chain broken");
                actor.reset_combo();
            }
            return Selection {
                roll,
                action: None,
                chain_step: None,
            };
        }

        // The step can exceed the chain if the pool shrank since last turn.
        if actor.combo_step() >= chain.len() {
            actor.reset_combo();
        }
        let step = actor.combo_step();
        let action = chain[step].clone();
        actor.advance_combo(chain.len());
        debug!(actor = %actor.id(), action = %action, step, "combo action selected");

        Selection {
            roll,
            action: Some(action),
            chain_step: Some(step),
        }
    }

    /// The last roll drawn for `actor`, if any.
    #[must_use]
    pub fn stored_roll(&self, actor: ActorId) -> Option<ComboRoll> {
        self.stored_rolls.get(&actor).copied()
    }

    /// Forgets every stored roll.
    pub fn clear_stored_rolls(&mut self) {
        self.stored_rolls.clear();
    }
}
