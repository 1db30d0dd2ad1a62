//! Action timing.
//!
//! An action's duration on the turn timeline starts at its base length and
//! is scaled by the actor's agility, by weaken, and by a pending critical
//! miss penalty. Stun is not a speed modifier: a stunned actor does not act
//! at all, and the turn loop checks that before asking for a speed.

use crate::action::Action;
use crate::config::CombatConfig;
use crate::entity::Actor;

/// Duration multiplier from agility: `max(floor, 1 - agility × factor)`.
#[must_use]
pub fn agility_multiplier(actor: &Actor, config: &CombatConfig) -> f64 {
    let reduction = f64::from(actor.stats.agility) * config.agility_speed_factor;
    (1.0 - reduction).max(config.min_speed_multiplier)
}

/// Effective duration of `action` when performed by `actor`.
///
/// Returns 0.0 when there is no action, meaning "nothing to perform".
///
/// # Example
///
/// ```
/// use fray_core::action::{Action, ActionCategory};
/// use fray_core::config::CombatConfig;
/// use fray_core::entity::{Actor, ActorId, ActorRole};
/// use fray_core::resolver::calculate_actual_action_speed;
///
/// let config = CombatConfig::default();
/// let actor = Actor::new(ActorId::new(1), "Idle", ActorRole::Character, 10);
/// assert_eq!(calculate_actual_action_speed(&actor, None, &config), 0.0);
///
/// let swing = Action::new("SWING", ActionCategory::Attack).with_length(2.0);
/// assert_eq!(calculate_actual_action_speed(&actor, Some(&swing), &config), 2.0);
/// ```
#[must_use]
pub fn calculate_actual_action_speed(
    actor: &Actor,
    action: Option<&Action>,
    config: &CombatConfig,
) -> f64 {
    let Some(action) = action else {
        return 0.0;
    };
    let mut speed = action.length() * agility_multiplier(actor, config);
    if actor.status.is_weakened() {
        speed *= config.weaken_speed_multiplier;
    }
    if actor.critical_miss_pending() {
        speed *= config.critical_miss_speed_multiplier;
    }
    speed
}
