//! Combat tuning configuration.
//!
//! Every numeric knob the resolver, ledger and progression code read lives
//! in [`CombatConfig`]. The struct is `#[serde(default)]`, so a JSON document
//! only needs the fields it overrides.
//!
//! # Example
//!
//! ```
//! use fray_core::config::CombatConfig;
//!
//! let config = CombatConfig::from_json(r#"{ "critical_multiplier": 3.0 }"#).unwrap();
//! assert_eq!(config.critical_multiplier, 3.0);
//! assert_eq!(config.weaken_damage_multiplier, 0.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// Default afflictions applied by action flags and status handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDefaults {
    /// Stacks added by a poisoning hit.
    pub poison_stacks: u32,
    /// Damage per poison stack per turn.
    pub poison_damage_per_stack: u32,
    /// Stacks added by a bleeding hit.
    pub bleed_stacks: u32,
    /// Damage per bleed stack per turn.
    pub bleed_damage_per_stack: u32,
    /// Turns a poison or bleed timer runs after application.
    pub affliction_turns: u32,
    /// Turns a stunning hit skips.
    pub stun_turns: u32,
    /// Turns a weakening hit lasts.
    pub weaken_turns: u32,
    /// Stacks added by a burning hit.
    pub burn_stacks: u32,
    /// Damage per burn stack per turn.
    pub burn_damage_per_stack: u32,
    /// Chance in `[0, 1]` that a poisoning hit applies poison.
    pub poison_chance: f64,
    /// Chance that a bleeding hit applies bleed.
    pub bleed_chance: f64,
    /// Chance that a stunning hit stuns.
    pub stun_chance: f64,
    /// Chance that a weakening hit weakens.
    pub weaken_chance: f64,
    /// Chance that a burning hit sets the target alight.
    pub burn_chance: f64,
    /// Chance added per point of attacker intelligence.
    pub intelligence_chance_bonus: f64,
    /// Chance removed per point of target intelligence.
    pub intelligence_resistance: f64,
}

impl Default for StatusDefaults {
    fn default() -> Self {
        Self {
            poison_stacks: 1,
            poison_damage_per_stack: 3,
            bleed_stacks: 1,
            bleed_damage_per_stack: 3,
            affliction_turns: 3,
            stun_turns: 1,
            weaken_turns: 2,
            burn_stacks: 1,
            burn_damage_per_stack: 3,
            poison_chance: 0.35,
            bleed_chance: 0.3,
            stun_chance: 0.15,
            weaken_chance: 0.25,
            burn_chance: 0.2,
            intelligence_chance_bonus: 0.01,
            intelligence_resistance: 0.005,
        }
    }
}

/// Tunables for a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Outgoing damage multiplier while weakened.
    pub weaken_damage_multiplier: f64,
    /// Action duration multiplier while weakened.
    pub weaken_speed_multiplier: f64,
    /// Damage multiplier on a critical hit.
    pub critical_multiplier: f64,
    /// Attack total at or above which a hit is critical.
    pub critical_hit_threshold: i32,
    /// Attack total for the high damage bracket.
    pub high_roll_threshold: i32,
    /// Damage multiplier for the high bracket.
    pub high_roll_multiplier: f64,
    /// Attack total for the mid damage bracket.
    pub mid_roll_threshold: i32,
    /// Damage multiplier for the mid bracket.
    pub mid_roll_multiplier: f64,
    /// Extra damage fraction per consumed combo step.
    pub combo_amplifier_per_step: f64,
    /// Duration reduction per point of agility.
    pub agility_speed_factor: f64,
    /// Floor for the agility duration multiplier.
    pub min_speed_multiplier: f64,
    /// Duration multiplier on the action after a critical miss.
    pub critical_miss_speed_multiplier: f64,
    /// Timeline cost of a skipped (stunned or empty) turn.
    pub skipped_turn_duration: f64,
    /// Technique points per point of roll bonus.
    pub technique_per_roll_bonus: u32,
    /// Intelligence points per point of roll bonus.
    pub intelligence_per_roll_bonus: u32,
    /// XP curve base: level `n` needs `n² × xp_base`.
    pub xp_base: u32,
    /// Maximum depth of trigger-generated follow-up events.
    pub max_chain_depth: u8,
    /// Times closer than this are treated as simultaneous on the timeline.
    pub timeline_tie_buffer: f64,
    /// Afflictions applied by flags and handlers.
    pub status: StatusDefaults,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            weaken_damage_multiplier: 0.5,
            weaken_speed_multiplier: 1.25,
            critical_multiplier: 2.0,
            critical_hit_threshold: 20,
            high_roll_threshold: 15,
            high_roll_multiplier: 1.5,
            mid_roll_threshold: 10,
            mid_roll_multiplier: 1.25,
            combo_amplifier_per_step: 0.1,
            agility_speed_factor: 0.05,
            min_speed_multiplier: 0.5,
            critical_miss_speed_multiplier: 2.0,
            skipped_turn_duration: 1.0,
            technique_per_roll_bonus: 2,
            intelligence_per_roll_bonus: 10,
            xp_base: 100,
            max_chain_depth: 8,
            timeline_tie_buffer: 0.01,
            status: StatusDefaults::default(),
        }
    }
}

impl CombatConfig {
    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] if the JSON is malformed or
    /// the resulting values fail [`CombatConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CombatError::InvalidArgument(format!("combat config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every multiplier is finite and non-negative, that status
    /// chances are probabilities and that divisors are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] naming the first bad field.
    pub fn validate(&self) -> Result<(), CombatError> {
        let multipliers = [
            ("weaken_damage_multiplier", self.weaken_damage_multiplier),
            ("weaken_speed_multiplier", self.weaken_speed_multiplier),
            ("critical_multiplier", self.critical_multiplier),
            ("high_roll_multiplier", self.high_roll_multiplier),
            ("mid_roll_multiplier", self.mid_roll_multiplier),
            ("combo_amplifier_per_step", self.combo_amplifier_per_step),
            ("agility_speed_factor", self.agility_speed_factor),
            ("min_speed_multiplier", self.min_speed_multiplier),
            (
                "critical_miss_speed_multiplier",
                self.critical_miss_speed_multiplier,
            ),
            ("skipped_turn_duration", self.skipped_turn_duration),
            ("timeline_tie_buffer", self.timeline_tie_buffer),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value < 0.0 {
                return Err(CombatError::InvalidArgument(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        let status = &self.status;
        let chances = [
            ("status.poison_chance", status.poison_chance),
            ("status.bleed_chance", status.bleed_chance),
            ("status.stun_chance", status.stun_chance),
            ("status.weaken_chance", status.weaken_chance),
            ("status.burn_chance", status.burn_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(CombatError::InvalidArgument(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        let modifiers = [
            (
                "status.intelligence_chance_bonus",
                status.intelligence_chance_bonus,
            ),
            ("status.intelligence_resistance", status.intelligence_resistance),
        ];
        for (name, value) in modifiers {
            if !value.is_finite() || value < 0.0 {
                return Err(CombatError::InvalidArgument(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.technique_per_roll_bonus == 0 || self.intelligence_per_roll_bonus == 0 {
            return Err(CombatError::InvalidArgument(
                "roll bonus divisors must be at least 1".to_string(),
            ));
        }
        if self.xp_base == 0 {
            return Err(CombatError::InvalidArgument(
                "xp_base must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
