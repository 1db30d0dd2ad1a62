//! Outcome trigger dispatch.
//!
//! Outcome handlers are bound to actions together with the
//! [`TriggerCondition`]s they listen for. When a [`CombatEvent`] is dispatched,
//! every binding whose conditions match the event fires exactly once, even if
//! several of its conditions match.
//!
//! # Architecture
//!
//! - [`OutcomeHandler`]: the single capability a handler implements,
//!   "process this outcome given access to source and target"
//! - [`OutcomeContext`]: what a handler may touch (roster, usage counts,
//!   configuration) plus a queue for follow-up events
//! - [`TriggerDispatcher`]: bindings keyed by action, plus global bindings
//!   that see every event
//!
//! # Scoping
//!
//! An event carrying an action reaches the bindings registered for that
//! action, then the global bindings. An event without an action (a status
//! tick, for instance) reaches only the global bindings.
//!
//! # Failure isolation
//!
//! Handlers return `anyhow::Result<()>`. A failing handler is recorded as a
//! [`CombatError::HandlerFailure`] in the [`DispatchReport`], any follow-up
//! events it queued are discarded, and the remaining handlers still run.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fray_core::action::{ActionId, TriggerCondition};
//! use fray_core::config::CombatConfig;
//! use fray_core::entity::ActorRole;
//! use fray_core::event::{CombatEvent, CombatEventKind};
//! use fray_core::roster::Roster;
//! use fray_core::trigger::{GrantXp, OutcomeContext, TriggerDispatcher};
//! use fray_core::usage::ActionUsageTracker;
//!
//! let mut roster = Roster::new();
//! let hero = roster.spawn("Ayla", ActorRole::Character, 50);
//! let slime = roster.spawn("Slime", ActorRole::Enemy, 10);
//!
//! let mut dispatcher = TriggerDispatcher::new();
//! dispatcher.register(
//!     ActionId::new("SLASH"),
//!     [TriggerCondition::OnKill],
//!     Arc::new(GrantXp { amount: 150 }),
//! );
//!
//! let usage = ActionUsageTracker::new();
//! let config = CombatConfig::default();
//! let mut ctx = OutcomeContext::new(&mut roster, &usage, &config);
//! let event = CombatEvent::new(CombatEventKind::EnemyDied, hero)
//!     .with_target(slime)
//!     .with_action(ActionId::new("SLASH"));
//!
//! let report = dispatcher.dispatch(&event, &mut ctx);
//! assert_eq!(report.invoked, 1);
//! assert_eq!(roster.get(hero).unwrap().level(), 2);
//! ```

mod handlers;

pub use handlers::{ApplyStatus, BonusDamage, ChainEvent, GrantXp, GrantXpForFirstUses};

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::{Action, ActionId, TriggerCondition};
use crate::config::CombatConfig;
use crate::entity::{Actor, ActorId};
use crate::error::CombatError;
use crate::event::CombatEvent;
use crate::roster::Roster;
use crate::usage::ActionUsageTracker;

// =============================================================================
// Handler Capability
// =============================================================================

/// Something that reacts to a combat outcome.
///
/// # Implementation Guidelines
///
/// 1. **Validate before mutating**: check that the actors you need exist
///    before changing any of them, so a failure leaves no partial update.
/// 2. **Queue, don't recurse**: report follow-up outcomes with
///    [`OutcomeContext::emit`]; the dispatcher delivers them later.
/// 3. **Be deterministic**: handlers have no access to randomness.
pub trait OutcomeHandler: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Reacts to `event`.
    ///
    /// # Errors
    ///
    /// Any error is reported as a handler failure; it never aborts dispatch.
    fn process(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()>;
}

/// What a handler may read and change while processing an outcome.
pub struct OutcomeContext<'a> {
    roster: &'a mut Roster,
    usage: &'a ActionUsageTracker,
    config: &'a CombatConfig,
    pending: Vec<CombatEvent>,
    current_depth: u8,
}

impl<'a> OutcomeContext<'a> {
    /// Creates a context over a roster, usage counts and configuration.
    pub fn new(
        roster: &'a mut Roster,
        usage: &'a ActionUsageTracker,
        config: &'a CombatConfig,
    ) -> Self {
        Self {
            roster,
            usage,
            config,
            pending: Vec::new(),
            current_depth: 0,
        }
    }

    /// Read access to every actor.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        self.roster
    }

    /// Looks up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.roster.get(id)
    }

    /// Looks up an actor mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.roster.get_mut(id)
    }

    /// Usage counts for the session.
    #[must_use]
    pub fn usage(&self) -> &'a ActionUsageTracker {
        self.usage
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &'a CombatConfig {
        self.config
    }

    /// Queues a follow-up event one level deeper than the event being
    /// processed.
    pub fn emit(&mut self, mut event: CombatEvent) {
        event.depth = self.current_depth.saturating_add(1);
        self.pending.push(event);
    }

    /// Follow-up events queued so far.
    #[must_use]
    pub fn pending_events(&self) -> &[CombatEvent] {
        &self.pending
    }

    fn take_pending(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl fmt::Debug for OutcomeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeContext")
            .field("actors", &self.roster.len())
            .field("pending", &self.pending.len())
            .field("current_depth", &self.current_depth)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Dispatch Report
// =============================================================================

/// Aggregate result of dispatching one or more events.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Handler invocations, successful or not.
    pub invoked: usize,
    /// One [`CombatError::HandlerFailure`] per failed invocation.
    pub failures: Vec<CombatError>,
    /// Every event delivered, in delivery order, including follow-ups.
    pub dispatched: Vec<CombatEvent>,
    /// Follow-up events discarded for exceeding the depth limit.
    pub dropped: usize,
}

impl DispatchReport {
    /// Returns true if no handler failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.failures.extend(other.failures);
        self.dispatched.extend(other.dispatched);
        self.dropped += other.dropped;
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

struct Binding {
    conditions: Vec<TriggerCondition>,
    handler: Arc<dyn OutcomeHandler>,
}

impl Binding {
    fn fires_on(&self, event: &CombatEvent, target_ratio: Option<f64>) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.matches(event.kind, target_ratio))
    }
}

/// Routes combat events to the outcome handlers subscribed to them.
#[derive(Default)]
pub struct TriggerDispatcher {
    by_action: BTreeMap<ActionId, Vec<Binding>>,
    global: Vec<Binding>,
}

impl fmt::Debug for TriggerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerDispatcher")
            .field("actions", &self.by_action.keys().collect::<Vec<_>>())
            .field("bindings", &self.binding_count())
            .finish()
    }
}

impl TriggerDispatcher {
    /// Creates a dispatcher with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `action` under the given conditions.
    ///
    /// Registering with no conditions is accepted but can never fire.
    pub fn register(
        &mut self,
        action: ActionId,
        conditions: impl IntoIterator<Item = TriggerCondition>,
        handler: Arc<dyn OutcomeHandler>,
    ) {
        let conditions: Vec<TriggerCondition> = conditions.into_iter().collect();
        debug!(action = %action, handler = handler.name(), ?conditions, "trigger registered");
        self.by_action.entry(action).or_default().push(Binding {
            conditions,
            handler,
        });
    }

    /// Binds `handler` to `action` under the action's own trigger conditions.
    ///
    /// Returns false (and registers nothing) if the action has none.
    pub fn register_action(&mut self, action: &Action, handler: Arc<dyn OutcomeHandler>) -> bool {
        if action.triggers().is_empty() {
            return false;
        }
        self.register(action.id().clone(), action.triggers().iter().copied(), handler);
        true
    }

    /// Binds `handler` to every event matching the conditions, whatever the
    /// action.
    pub fn register_global(
        &mut self,
        conditions: impl IntoIterator<Item = TriggerCondition>,
        handler: Arc<dyn OutcomeHandler>,
    ) {
        self.global.push(Binding {
            conditions: conditions.into_iter().collect(),
            handler,
        });
    }

    /// Every condition subscribed for `action`; empty for unknown actions.
    #[must_use]
    pub fn subscribed_conditions(&self, action: &ActionId) -> Vec<TriggerCondition> {
        self.by_action
            .get(action)
            .map(|bindings| {
                bindings
                    .iter()
                    .flat_map(|b| b.conditions.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.by_action.values().map(Vec::len).sum::<usize>() + self.global.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binding_count() == 0
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.by_action.clear();
        self.global.clear();
    }

    /// Delivers one event to every matching binding.
    ///
    /// Follow-up events queued by handlers stay in `ctx` for the caller (see
    /// [`TriggerDispatcher::dispatch_cascade`] for automatic delivery).
    pub fn dispatch(&self, event: &CombatEvent, ctx: &mut OutcomeContext<'_>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let target_ratio = event.target_ratio().or_else(|| {
            event
                .target
                .and_then(|t| ctx.roster.health(t))
                .map(|h| h.ratio())
        });
        ctx.current_depth = event.depth;

        let scoped = event
            .action
            .as_ref()
            .and_then(|action| self.by_action.get(action))
            .map_or(&[][..], Vec::as_slice);

        for binding in scoped.iter().chain(self.global.iter()) {
            if !binding.fires_on(event, target_ratio) {
                continue;
            }
            report.invoked += 1;
            let queued = ctx.pending.len();
            if let Err(source) = binding.handler.process(event, ctx) {
                ctx.pending.truncate(queued);
                warn!(
                    handler = binding.handler.name(),
                    kind = %event.kind,
                    error = %source,
                    "outcome handler failed"
                );
                report.failures.push(CombatError::HandlerFailure {
                    handler: binding.handler.name().to_string(),
                    source,
                });
            }
        }
        report.dispatched.push(event.clone());
        report
    }

    /// Delivers events breadth-first, including the follow-ups handlers
    /// queue, until nothing is left.
    ///
    /// Follow-ups deeper than `max_depth` are dropped with a warning, which
    /// bounds handler chains that feed each other.
    pub fn dispatch_cascade(
        &self,
        events: impl IntoIterator<Item = CombatEvent>,
        ctx: &mut OutcomeContext<'_>,
        max_depth: u8,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut queue: VecDeque<CombatEvent> = events.into_iter().collect();
        while let Some(event) = queue.pop_front() {
            report.absorb(self.dispatch(&event, ctx));
            for follow in ctx.take_pending() {
                if follow.depth > max_depth {
                    warn!(kind = %follow.kind, depth = follow.depth, "follow-up event dropped");
                    report.dropped += 1;
                } else {
                    queue.push_back(follow);
                }
            }
        }
        report
    }
}
