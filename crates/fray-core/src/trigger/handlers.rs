//! Built-in outcome handlers.
//!
//! Each handler checks that the actors it needs are present before changing
//! anything, so a failure never leaves a half-applied effect behind.

use anyhow::{anyhow, Context};
use tracing::debug;

use super::{OutcomeContext, OutcomeHandler};
use crate::event::{CombatEvent, CombatEventKind};
use crate::resolver::apply_damage;
use crate::status::StatusEffect;

/// Grants XP to the event's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantXp {
    /// XP per invocation.
    pub amount: u32,
}

impl OutcomeHandler for GrantXp {
    fn name(&self) -> &str {
        "grant_xp"
    }

    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        let config = ctx.config();
        let actor = ctx
            .actor_mut(event.source)
            .ok_or_else(|| anyhow!("source actor {} is not in the roster", event.source))?;
        actor.grant_xp(self.amount, config);
        Ok(())
    }
}

/// Grants XP to the event's source only during its first `uses` uses of the
/// event's action.
///
/// Usage is recorded before dispatch, so the very first use reads as 1.
/// Events without an action are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantXpForFirstUses {
    /// XP per qualifying invocation.
    pub amount: u32,
    /// How many uses still pay out.
    pub uses: u32,
}

impl OutcomeHandler for GrantXpForFirstUses {
    fn name(&self) -> &str {
        "grant_xp_for_first_uses"
    }

    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        let Some(action) = event.action.as_ref() else {
            return Ok(());
        };
        let count = ctx.usage().usage_count(event.source, action);
        if count == 0 || count > self.uses {
            debug!(actor = %event.source, action = %action, count, "first-use bonus spent");
            return Ok(());
        }
        GrantXp {
            amount: self.amount,
        }
        .process(event, ctx)
    }
}

/// Applies an affliction to the event's target and reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStatus {
    /// The affliction to apply.
    pub effect: StatusEffect,
}

impl OutcomeHandler for ApplyStatus {
    fn name(&self) -> &str {
        "apply_status"
    }

    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        let target = event.target.context("event has no target")?;
        let actor = ctx
            .actor_mut(target)
            .ok_or_else(|| anyhow!("target actor {target} is not in the roster"))?;
        actor.status.apply(self.effect);
        ctx.emit(event.follow_up(CombatEventKind::StatusApplied, self.effect.magnitude()));
        Ok(())
    }
}

/// Deals flat extra damage to the event's target.
///
/// Reports [`CombatEventKind::EnemyDied`] if the extra damage defeats the
/// target. A target that is already down is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusDamage {
    /// Damage per invocation, not reduced by armor.
    pub amount: u32,
}

impl OutcomeHandler for BonusDamage {
    fn name(&self) -> &str {
        "bonus_damage"
    }

    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        let target = event.target.context("event has no target")?;
        let actor = ctx
            .actor_mut(target)
            .ok_or_else(|| anyhow!("target actor {target} is not in the roster"))?;
        if !actor.is_alive() {
            return Ok(());
        }
        let change = apply_damage(actor, self.amount);
        if change.defeated() {
            ctx.emit(event.follow_up(CombatEventKind::EnemyDied, change.amount()));
        }
        Ok(())
    }
}

/// Re-emits the event as another kind, chaining one trigger into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEvent {
    /// Kind of the follow-up event.
    pub kind: CombatEventKind,
}

impl OutcomeHandler for ChainEvent {
    fn name(&self) -> &str {
        "chain_event"
    }

    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        ctx.emit(event.follow_up(self.kind, event.amount));
        Ok(())
    }
}
