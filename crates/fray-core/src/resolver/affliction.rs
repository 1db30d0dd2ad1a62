//! Affliction application from action flags.
//!
//! A landed hit from an action carrying `CAUSES_*` flags does not apply its
//! afflictions outright. Each flagged effect gets its own percentile roll
//! against
//!
//! ```text
//! base_chance + attacker.intelligence × bonus − target.intelligence × resistance
//! ```
//!
//! clamped to `[0, 1]`, with the base chance and both per-point factors taken
//! from [`StatusDefaults`].

use knuckle::Dice;
use tracing::debug;

use crate::action::ActionFlags;
use crate::config::StatusDefaults;
use crate::entity::Actor;
use crate::status::StatusEffect;

/// Afflictions an action's flags would apply, in a fixed order: poison,
/// bleed, burn, stun, weaken.
#[must_use]
pub fn flag_effects(flags: ActionFlags, defaults: &StatusDefaults) -> Vec<StatusEffect> {
    let table = [
        (ActionFlags::CAUSES_POISON, StatusEffect::poison(defaults)),
        (ActionFlags::CAUSES_BLEED, StatusEffect::bleed(defaults)),
        (ActionFlags::CAUSES_BURN, StatusEffect::burn(defaults)),
        (ActionFlags::CAUSES_STUN, StatusEffect::stun(defaults)),
        (ActionFlags::CAUSES_WEAKEN, StatusEffect::weaken(defaults)),
    ];
    table
        .into_iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, effect)| effect)
        .collect()
}

/// Probability that `effect` lands when `source` hits `target`.
#[must_use]
pub fn status_application_chance(
    effect: StatusEffect,
    source: &Actor,
    target: &Actor,
    defaults: &StatusDefaults,
) -> f64 {
    let bonus = f64::from(source.stats.intelligence) * defaults.intelligence_chance_bonus;
    let resistance = f64::from(target.stats.intelligence) * defaults.intelligence_resistance;
    (effect.base_chance(defaults) + bonus - resistance).clamp(0.0, 1.0)
}

/// Rolls every flagged affliction and returns the ones that land.
pub fn roll_flag_effects(
    flags: ActionFlags,
    source: &Actor,
    target: &Actor,
    defaults: &StatusDefaults,
    dice: &mut Dice,
) -> Vec<StatusEffect> {
    flag_effects(flags, defaults)
        .into_iter()
        .filter(|effect| {
            let chance = status_application_chance(*effect, source, target, defaults);
            let landed = dice.roll_chance(chance);
            debug!(
                source = %source.id(),
                target = %target.id(),
                effect = ?effect,
                chance,
                landed,
                "affliction roll"
            );
            landed
        })
        .collect()
}
