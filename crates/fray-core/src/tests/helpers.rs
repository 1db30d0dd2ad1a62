//! Test helper functions for setting up sessions and fighters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::action::{Action, ActionCategory};
use crate::config::CombatConfig;
use crate::entity::{Actor, ActorId, ActorRole, Stats};
use crate::event::CombatEvent;
use crate::session::{CombatSession, TurnReport};
use crate::trigger::{OutcomeContext, OutcomeHandler};

// =============================================================================
// Setup
// =============================================================================

/// Routes `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A session with default configuration and the given seed, not yet in
/// combat.
pub fn combat_session(seed: u64) -> CombatSession {
    init_tracing();
    CombatSession::new(CombatConfig::default(), seed).expect("default config is valid")
}

/// A session with the given configuration and seed, not yet in combat.
pub fn combat_session_with(config: CombatConfig, seed: u64) -> CombatSession {
    init_tracing();
    CombatSession::new(config, seed).expect("test config is valid")
}

/// Default configuration in which every flagged affliction always lands.
pub fn certain_afflictions() -> CombatConfig {
    let mut config = CombatConfig::default();
    config.status.poison_chance = 1.0;
    config.status.bleed_chance = 1.0;
    config.status.stun_chance = 1.0;
    config.status.weaken_chance = 1.0;
    config.status.burn_chance = 1.0;
    config
}

/// An attack that only misses on a natural 1.
pub fn sure_strike(id: &str) -> Action {
    Action::new(id, ActionCategory::Attack).with_roll_bonus(100)
}

/// Adds an actor with the given strength and single action.
pub fn spawn_fighter(
    session: &mut CombatSession,
    name: &str,
    role: ActorRole,
    max_health: u32,
    strength: u32,
    action: Action,
) -> ActorId {
    let id = session.roster_mut().spawn(name, role, max_health);
    let actor = session.roster_mut().get_mut(id).expect("just spawned");
    actor.stats = Stats {
        strength,
        ..Stats::default()
    };
    actor.add_action(action, 1.0);
    id
}

/// Adds an actor with no actions.
pub fn spawn_dummy(session: &mut CombatSession, name: &str, role: ActorRole, max_health: u32) -> ActorId {
    session.roster_mut().spawn(name, role, max_health)
}

/// Current health of an actor.
pub fn hp(session: &CombatSession, id: ActorId) -> u32 {
    session.roster().health(id).expect("actor exists").current
}

/// Mutable access to an actor.
pub fn actor_mut(session: &mut CombatSession, id: ActorId) -> &mut Actor {
    session.roster_mut().get_mut(id).expect("actor exists")
}

/// Resolves `actor`'s turns against `target` until `done` accepts a report
/// or `max_turns` run out.
pub fn run_until(
    session: &mut CombatSession,
    actor: ActorId,
    target: ActorId,
    max_turns: usize,
    done: impl Fn(&TurnReport) -> bool,
) -> Option<TurnReport> {
    for _ in 0..max_turns {
        let report = session.resolve_turn(actor, Some(target)).expect("turn resolves");
        if done(&report) {
            return Some(report);
        }
    }
    None
}

// =============================================================================
// Test Handlers
// =============================================================================

/// Counts invocations and remembers the events it saw.
#[derive(Default)]
pub struct CountingHandler {
    calls: AtomicUsize,
    seen: std::sync::Mutex<Vec<CombatEvent>>,
}

impl CountingHandler {
    /// Creates a shared counter.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Events seen so far.
    pub fn seen(&self) -> Vec<CombatEvent> {
        self.seen.lock().expect("not poisoned").clone()
    }
}

impl OutcomeHandler for CountingHandler {
    fn name(&self) -> &str {
        "counting"
    }

    fn process(&self, event: &CombatEvent, _ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("not poisoned").push(event.clone());
        Ok(())
    }
}

/// Always fails.
pub struct FailingHandler;

impl OutcomeHandler for FailingHandler {
    fn name(&self) -> &str {
        "failing"
    }

    fn process(&self, _event: &CombatEvent, _ctx: &mut OutcomeContext<'_>) -> anyhow::Result<()> {
        anyhow::bail!("handler exploded")
    }
}
