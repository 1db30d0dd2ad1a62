//! Speed and damage resolution.
//!
//! Resolvers turn a selected action into numbers: how long it takes on the
//! turn timeline, whether it connects, how much it deals or restores, which
//! afflictions it leaves behind, and what the target's health looks like
//! afterwards. They are free functions
//! over actors and configuration; all mutation goes through
//! [`apply_damage`], [`apply_healing`] and [`apply_multi_hit`], which clamp
//! health to `[0, max]`.
//!
//! # Invariants
//!
//! - Health never leaves `[0, max]`
//! - Each hit of a multi-hit action is clamped separately
//! - A missing action has a speed of 0.0, not an error

mod affliction;
mod damage;
mod speed;

pub use affliction::{flag_effects, roll_flag_effects, status_application_chance};
pub use damage::{
    apply_damage, apply_healing, apply_multi_hit, attack_total, compute_damage,
    compute_healing, defense, per_hit_damage, resolve_hit, roll_scaling, HealthChange,
    HitOutcome,
};
pub use speed::{agility_multiplier, calculate_actual_action_speed};
