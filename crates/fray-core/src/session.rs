//! The combat session and its turn pipeline.
//!
//! A [`CombatSession`] owns everything one fight needs: the roster, the dice,
//! the selector, the game state machine, the usage tracker, the trigger
//! dispatcher, the turn timeline and the event log. Nothing is global, so two
//! sessions never observe each other.
//!
//! # Turn pipeline
//!
//! [`CombatSession::resolve_turn`] runs one actor's turn:
//!
//! 1. **GATE**: the state machine must be in [`GameState::Combat`]
//! 2. **STUN**: a stunned actor loses the turn
//! 3. **SELECT**: a combo roll picks a chain action, or the actor falls back
//!    to its default action
//! 4. **TIME**: the action's effective duration moves the actor's slot on the
//!    timeline
//! 5. **USAGE**: the use is recorded
//! 6. **APPLY**: hit check, damage (per hit for multi-hit actions), healing
//!    and afflictions from the action's flags
//! 7. **DISPATCH**: the turn's events go to the trigger dispatcher, follow-ups
//!    included
//! 8. **TICK**: the acting actor's afflictions tick once
//!
//! # Determinism
//!
//! All randomness comes from the session's [`Dice`]. Given the same seed,
//! roster and sequence of calls, a session produces identical reports.
//!
//! # Example
//!
//! ```
//! use fray_core::action::{Action, ActionCategory};
//! use fray_core::config::CombatConfig;
//! use fray_core::entity::ActorRole;
//! use fray_core::session::CombatSession;
//!
//! let mut session = CombatSession::new(CombatConfig::default(), 7).unwrap();
//! let punch = Action::new("PUNCH", ActionCategory::Attack);
//! let hero = session.roster_mut().spawn("Ayla", ActorRole::Character, 40);
//! session.roster_mut().get_mut(hero).unwrap().add_action(punch.clone(), 1.0);
//! let rat = session.roster_mut().spawn("Rat", ActorRole::Enemy, 5);
//! session.roster_mut().get_mut(rat).unwrap().add_action(punch, 1.0);
//!
//! session.begin();
//! let mut turns = 0;
//! while !session.is_over() && turns < 200 {
//!     session.next_turn().unwrap();
//!     turns += 1;
//! }
//! assert!(session.is_over());
//! ```

use std::fmt;

use knuckle::{ComboRoll, Dice};
use tracing::{debug, info};

use crate::action::{Action, ActionCategory, ActionId, TargetMode};
use crate::config::CombatConfig;
use crate::entity::{Actor, ActorId, ActorRole, Health};
use crate::error::CombatError;
use crate::event::{CombatEvent, CombatEventKind, EventLog};
use crate::resolver::{
    apply_damage, apply_healing, apply_multi_hit, calculate_actual_action_speed,
    compute_damage, compute_healing, per_hit_damage, resolve_hit, roll_flag_effects, HealthChange,
    HitOutcome,
};
use crate::roster::Roster;
use crate::selector::{ActionSelector, Selection};
use crate::state::{GameState, GameStateMachine, StateTransition};
use crate::status::StatusTick;
use crate::timeline::TurnTimeline;
use crate::trigger::{DispatchReport, OutcomeContext, TriggerDispatcher};
use crate::usage::ActionUsageTracker;

// =============================================================================
// Turn Report
// =============================================================================

/// Why an actor did not act.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The actor is stunned.
    Stunned,
    /// The actor is already defeated.
    Defeated,
    /// The actor has no actions.
    NoAction,
}

/// Everything one turn did.
#[derive(Debug)]
pub struct TurnReport {
    /// The acting actor.
    pub actor: ActorId,
    /// The action performed, if any.
    pub action: Option<ActionId>,
    /// The selection roll.
    pub roll: Option<ComboRoll>,
    /// Chain index when the action came from the combo chain.
    pub chain_step: Option<usize>,
    /// Hit check result per affected actor.
    pub outcomes: Vec<(ActorId, HitOutcome)>,
    /// Every individual damage application.
    pub hits: Vec<HealthChange>,
    /// Total damage dealt by the action.
    pub damage: u32,
    /// Total healing done by the action.
    pub healing: u32,
    /// Effective duration of the action on the timeline.
    pub duration: f64,
    /// The acting actor's end-of-turn affliction tick.
    pub status_tick: StatusTick,
    /// Events dispatched this turn, follow-ups included, in delivery order.
    pub events: Vec<CombatEvent>,
    /// Handler failures during dispatch.
    pub failures: Vec<CombatError>,
    /// Follow-up events dropped for exceeding the chain depth.
    pub dropped_events: usize,
    /// Set when the actor lost the turn.
    pub skipped: Option<SkipReason>,
}

impl TurnReport {
    fn new(actor: ActorId) -> Self {
        Self {
            actor,
            action: None,
            roll: None,
            chain_step: None,
            outcomes: Vec::new(),
            hits: Vec::new(),
            damage: 0,
            healing: 0,
            duration: 0.0,
            status_tick: StatusTick::default(),
            events: Vec::new(),
            failures: Vec::new(),
            dropped_events: 0,
            skipped: None,
        }
    }

    /// Returns true if the actor lost the turn.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Returns true if the action came from the combo chain.
    #[must_use]
    pub fn was_combo(&self) -> bool {
        self.chain_step.is_some()
    }

    /// Counts dispatched events of one kind.
    #[must_use]
    pub fn count_of(&self, kind: CombatEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    fn absorb(&mut self, dispatch: DispatchReport) {
        self.events.extend(dispatch.dispatched);
        self.failures.extend(dispatch.failures);
        self.dropped_events += dispatch.dropped;
    }
}

// =============================================================================
// Session
// =============================================================================

/// One fight: the actors, the dice and every piece of per-fight state.
pub struct CombatSession {
    roster: Roster,
    dice: Dice,
    selector: ActionSelector,
    state: GameStateMachine,
    usage: ActionUsageTracker,
    dispatcher: TriggerDispatcher,
    timeline: TurnTimeline,
    events: EventLog,
    config: CombatConfig,
}

impl fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSession")
            .field("actors", &self.roster.len())
            .field("state", &self.state.current())
            .field("seed", &self.dice.seed())
            .field("dispatcher", &self.dispatcher)
            .field("clock", &self.timeline.clock())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl CombatSession {
    /// Creates a session with seeded dice.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] if the configuration is
    /// invalid.
    pub fn new(config: CombatConfig, seed: u64) -> Result<Self, CombatError> {
        Self::with_dice(config, Dice::new_with_seed(seed))
    }

    /// Creates a session around existing dice.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidArgument`] if the configuration is
    /// invalid.
    pub fn with_dice(config: CombatConfig, dice: Dice) -> Result<Self, CombatError> {
        config.validate()?;
        Ok(Self {
            roster: Roster::new(),
            dice,
            selector: ActionSelector::new(),
            state: GameStateMachine::new(),
            usage: ActionUsageTracker::new(),
            dispatcher: TriggerDispatcher::new(),
            timeline: TurnTimeline::new(config.timeline_tie_buffer),
            events: EventLog::new(),
            config,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The actors in the fight.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable access to the actors.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// The session dice.
    pub fn dice_mut(&mut self) -> &mut Dice {
        &mut self.dice
    }

    /// The selector and its stored rolls.
    #[must_use]
    pub fn selector(&self) -> &ActionSelector {
        &self.selector
    }

    /// The game state machine.
    #[must_use]
    pub fn state(&self) -> &GameStateMachine {
        &self.state
    }

    /// Mutable access to the game state machine.
    pub fn state_mut(&mut self) -> &mut GameStateMachine {
        &mut self.state
    }

    /// Per-actor action usage counts.
    #[must_use]
    pub fn usage(&self) -> &ActionUsageTracker {
        &self.usage
    }

    /// The trigger dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &TriggerDispatcher {
        &self.dispatcher
    }

    /// Mutable access to the trigger dispatcher, for registering handlers.
    pub fn dispatcher_mut(&mut self) -> &mut TriggerDispatcher {
        &mut self.dispatcher
    }

    /// The turn timeline.
    #[must_use]
    pub fn timeline(&self) -> &TurnTimeline {
        &self.timeline
    }

    /// Every event recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        self.events.take_events()
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Enters [`GameState::Combat`] and puts every living actor on the
    /// timeline at the current time.
    pub fn begin(&mut self) -> StateTransition {
        self.timeline.clear();
        self.selector.clear_stored_rolls();
        let living: Vec<ActorId> = self
            .roster
            .iter()
            .filter(|a| a.is_alive())
            .map(Actor::id)
            .collect();
        for id in &living {
            self.timeline.add(*id, 0.0);
        }
        info!(actors = living.len(), "combat begins");
        self.state.transition_to_state(GameState::Combat)
    }

    /// Leaves combat for `next`, clearing stored rolls, the timeline and
    /// every actor's combo chain.
    pub fn end(&mut self, next: GameState) -> StateTransition {
        self.selector.clear_stored_rolls();
        self.timeline.clear();
        let ids: Vec<ActorId> = self.roster.iter().map(Actor::id).collect();
        for id in ids {
            if let Some(actor) = self.roster.get_mut(id) {
                actor.reset_combo();
            }
        }
        info!(next = %next, "combat ends");
        self.state.transition_to_state(next)
    }

    /// Returns true once one side has no living actors.
    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.roster.any_living(ActorRole::Character) || !self.roster.any_living(ActorRole::Enemy)
    }

    /// Resolves the turn of whoever is next on the timeline, targeting
    /// automatically.
    ///
    /// Returns `Ok(None)` when the fight is over or nobody is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::NotInCombat`] outside [`GameState::Combat`].
    pub fn next_turn(&mut self) -> Result<Option<TurnReport>, CombatError> {
        if !self.state.is_in(GameState::Combat) {
            return Err(CombatError::NotInCombat {
                state: self.state.current(),
            });
        }
        if self.is_over() {
            return Ok(None);
        }
        let Some(actor) = self.timeline.next_actor() else {
            return Ok(None);
        };
        self.resolve_turn(actor, None).map(Some)
    }

    // =========================================================================
    // Turn Pipeline
    // =========================================================================

    /// Resolves one turn for `actor_id`.
    ///
    /// `target` overrides automatic targeting for single-target actions.
    /// Without it, attacks go to the lowest-ID living opponent and heals to
    /// the actor itself.
    ///
    /// # Errors
    ///
    /// - [`CombatError::NotInCombat`] outside [`GameState::Combat`]
    /// - [`CombatError::StateNotFound`] if the actor or the explicit target
    ///   is not in the roster
    ///
    /// Both are checked before anything changes. Handler failures are not
    /// errors; they are listed in [`TurnReport::failures`].
    pub fn resolve_turn(
        &mut self,
        actor_id: ActorId,
        target: Option<ActorId>,
    ) -> Result<TurnReport, CombatError> {
        // GATE
        if !self.state.is_in(GameState::Combat) {
            return Err(CombatError::NotInCombat {
                state: self.state.current(),
            });
        }
        if let Some(target) = target.filter(|t| !self.roster.contains(*t)) {
            return Err(CombatError::not_found("target", target));
        }
        let actor = self
            .roster
            .get_mut(actor_id)
            .ok_or_else(|| CombatError::not_found("actor", actor_id))?;

        let mut report = TurnReport::new(actor_id);
        if !actor.is_alive() {
            self.timeline.remove(actor_id);
            report.skipped = Some(SkipReason::Defeated);
            return Ok(report);
        }
        actor.actions().try_for_each(Action::validate)?;

        // STUN
        if actor.is_stunned() {
            debug!(actor = %actor_id, turns = actor.status.stun_turns(), "stunned, turn lost");
            report.skipped = Some(SkipReason::Stunned);
            self.timeline.schedule(actor_id, self.config.skipped_turn_duration);
            self.finish_turn(&mut report, Vec::new());
            return Ok(report);
        }

        // SELECT
        let selection = self.selector.select_action(actor, &mut self.dice, &self.config);
        let chosen = match &selection.action {
            Some(id) => actor.action(id).cloned(),
            None => actor.default_action(self.dice.rng_mut()).cloned(),
        };
        report.roll = Some(selection.roll);
        report.chain_step = selection.chain_step;
        let Some(action) = chosen else {
            debug!(actor = %actor_id, "no action available");
            report.skipped = Some(SkipReason::NoAction);
            self.timeline.schedule(actor_id, self.config.skipped_turn_duration);
            self.finish_turn(&mut report, Vec::new());
            return Ok(report);
        };
        report.action = Some(action.id().clone());

        // TIME
        let duration = calculate_actual_action_speed(actor, Some(&action), &self.config);
        actor.set_critical_miss_pending(false);
        let role = actor.role();
        self.timeline.schedule(actor_id, duration);
        report.duration = duration;

        // USAGE
        let uses = self.usage.record_action_usage(actor_id, action.id());
        debug!(actor = %actor_id, action = %action.id(), uses, duration, "action chosen");

        // APPLY
        let mut events = Vec::new();
        if let Some(step) = selection.chain_step {
            events.push(
                CombatEvent::new(CombatEventKind::ComboTriggered, actor_id)
                    .with_action(action.id().clone())
                    .with_amount(u32::try_from(step + 1).unwrap_or(u32::MAX)),
            );
        }
        for target_id in self.targets_for(actor_id, role, &action, target) {
            self.perform(actor_id, target_id, &action, &selection, &mut report, &mut events);
        }

        // DISPATCH + TICK
        self.finish_turn(&mut report, events);
        Ok(report)
    }

    fn targets_for(
        &self,
        actor_id: ActorId,
        role: ActorRole,
        action: &Action,
        explicit: Option<ActorId>,
    ) -> Vec<ActorId> {
        match action.target() {
            TargetMode::SelfTarget => vec![actor_id],
            TargetMode::Environment => Vec::new(),
            TargetMode::Multi => self.roster.living(role.opponent()).collect(),
            TargetMode::Single => explicit
                .or_else(|| {
                    if action.category() == ActionCategory::Heal {
                        Some(actor_id)
                    } else {
                        self.roster.first_living(role.opponent())
                    }
                })
                .into_iter()
                .collect(),
        }
    }

    fn perform(
        &mut self,
        source_id: ActorId,
        target_id: ActorId,
        action: &Action,
        selection: &Selection,
        report: &mut TurnReport,
        events: &mut Vec<CombatEvent>,
    ) {
        let event = |kind: CombatEventKind, amount: u32| {
            CombatEvent::new(kind, source_id)
                .with_target(target_id)
                .with_action(action.id().clone())
                .with_amount(amount)
        };

        let (Some(source), Some(target)) = (self.roster.get(source_id), self.roster.get(target_id))
        else {
            return;
        };
        if !target.is_alive() {
            debug!(target = %target_id, "target already defeated");
            return;
        }

        if action.category() == ActionCategory::Heal {
            let Some(target) = self.roster.get_mut(target_id) else {
                return;
            };
            let change = apply_healing(target, compute_healing(action));
            report.healing += change.amount();
            events.push(event(CombatEventKind::HealApplied, change.amount()));
            return;
        }

        let damaging = action.category().deals_damage();
        let outcome = if target_id == source_id || !damaging {
            HitOutcome::Hit { critical: false }
        } else {
            resolve_hit(target, action, &selection.roll, &self.config)
        };
        report.outcomes.push((target_id, outcome));

        let critical = match outcome {
            HitOutcome::Miss { critical } => {
                events.push(event(CombatEventKind::Missed, 0));
                if critical {
                    debug!(actor = %source_id, "critical miss");
                    if let Some(source) = self.roster.get_mut(source_id) {
                        source.set_critical_miss_pending(true);
                    }
                }
                return;
            }
            HitOutcome::Hit { critical } => critical,
        };

        let per_hit = damaging.then(|| {
            let full = compute_damage(
                source,
                target,
                action,
                &selection.roll,
                critical,
                selection.chain_step,
                &self.config,
            );
            per_hit_damage(full, action)
        });

        let Some(target) = self.roster.get_mut(target_id) else {
            return;
        };
        if let Some(per_hit) = per_hit {
            let max = target.health.max;
            let hits = apply_multi_hit(target, per_hit, action.multi_hit_count());
            for change in &hits {
                let after = Health {
                    current: change.after,
                    max,
                };
                report.damage += change.amount();
                events.push(
                    event(CombatEventKind::HitLanded, change.amount()).with_target_health(after),
                );
                if critical {
                    events.push(
                        event(CombatEventKind::CriticalHit, change.amount())
                            .with_target_health(after),
                    );
                }
                if change.defeated() {
                    events.push(event(CombatEventKind::EnemyDied, 0).with_target_health(after));
                }
            }
            report.hits.extend(hits);
        }

        let landed = match (self.roster.get(source_id), self.roster.get(target_id)) {
            (Some(source), Some(target)) if target.is_alive() => roll_flag_effects(
                action.flags(),
                source,
                target,
                &self.config.status,
                &mut self.dice,
            ),
            _ => Vec::new(),
        };
        if let Some(target) = self.roster.get_mut(target_id) {
            for effect in landed {
                target.status.apply(effect);
                events.push(event(CombatEventKind::StatusApplied, effect.magnitude()));
            }
        }
    }

    /// Dispatches the turn's events, ticks the acting actor's afflictions,
    /// records everything and drops defeated actors from the timeline.
    fn finish_turn(&mut self, report: &mut TurnReport, events: Vec<CombatEvent>) {
        let dispatch = self.dispatch(events);
        report.absorb(dispatch);

        let mut tick_events = Vec::new();
        if let Some(actor) = self.roster.get_mut(report.actor).filter(|a| a.is_alive()) {
            let tick = actor.status.tick();
            if tick.damage > 0 {
                let change = apply_damage(actor, tick.damage);
                let id = report.actor;
                tick_events.push(
                    CombatEvent::new(CombatEventKind::StatusTick, id)
                        .with_target(id)
                        .with_amount(change.amount()),
                );
                if change.defeated() {
                    tick_events.push(CombatEvent::new(CombatEventKind::EnemyDied, id).with_target(id));
                }
            }
            report.status_tick = tick;
        }
        let dispatch = self.dispatch(tick_events);
        report.absorb(dispatch);

        self.events.extend(report.events.iter().cloned());
        let fallen: Vec<ActorId> = self
            .roster
            .iter()
            .filter(|a| !a.is_alive())
            .map(Actor::id)
            .collect();
        for id in fallen {
            self.timeline.remove(id);
        }

        info!(
            actor = %report.actor,
            action = ?report.action.as_ref().map(ActionId::as_str),
            damage = report.damage,
            healing = report.healing,
            events = report.events.len(),
            failures = report.failures.len(),
            skipped = ?report.skipped,
            "turn resolved"
        );
    }

    fn dispatch(&mut self, events: Vec<CombatEvent>) -> DispatchReport {
        if events.is_empty() {
            return DispatchReport::default();
        }
        let mut ctx = OutcomeContext::new(&mut self.roster, &self.usage, &self.config);
        self.dispatcher
            .dispatch_cascade(events, &mut ctx, self.config.max_chain_depth)
    }
}
