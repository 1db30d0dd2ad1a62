//! Combat events and the per-session event log.
//!
//! A [`CombatEvent`] is produced once for each qualifying occurrence during a
//! turn (a hit, a miss, a defeat, ...), handed to the trigger dispatcher, and
//! then recorded in the [`EventLog`] so callers can drain it after the turn.
//! Events are plain values; nothing refers back into them after dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::ActionId;
use crate::entity::{ActorId, Health};

/// The closed set of things that can happen during a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatEventKind {
    /// A hit connected. Emitted once per hit of a multi-hit action.
    HitLanded,
    /// The attack roll failed to connect.
    Missed,
    /// A hit was critical. Emitted alongside its `HitLanded`.
    CriticalHit,
    /// The action was chosen from the actor's combo chain.
    ComboTriggered,
    /// The target's health reached zero.
    EnemyDied,
    /// Health was restored.
    HealApplied,
    /// An affliction was applied to the target.
    StatusApplied,
    /// Poison or bleed dealt damage at end of turn.
    StatusTick,
}

impl fmt::Display for CombatEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HitLanded => "HitLanded",
            Self::Missed => "Missed",
            Self::CriticalHit => "CriticalHit",
            Self::ComboTriggered => "ComboTriggered",
            Self::EnemyDied => "EnemyDied",
            Self::HealApplied => "HealApplied",
            Self::StatusApplied => "StatusApplied",
            Self::StatusTick => "StatusTick",
        };
        f.write_str(name)
    }
}

/// Something that happened during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// What happened.
    pub kind: CombatEventKind,
    /// The actor that caused it.
    pub source: ActorId,
    /// The actor it happened to, if any.
    pub target: Option<ActorId>,
    /// The action responsible, if any. Status ticks carry none.
    pub action: Option<ActionId>,
    /// Damage, healing or stacks involved; 0 when not meaningful.
    pub amount: u32,
    /// The target's health right after the occurrence. Health thresholds
    /// are checked against this snapshot, so each hit of a multi-hit action
    /// sees its own result.
    pub target_health: Option<Health>,
    /// 0 for events produced by the turn itself, `n` for events produced by
    /// a trigger handler reacting to a depth `n - 1` event.
    pub depth: u8,
}

impl CombatEvent {
    /// Creates a depth-0 event with no target, action or amount.
    #[must_use]
    pub fn new(kind: CombatEventKind, source: ActorId) -> Self {
        Self {
            kind,
            source,
            target: None,
            action: None,
            amount: 0,
            target_health: None,
            depth: 0,
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the responsible action.
    #[must_use]
    pub fn with_action(mut self, action: ActionId) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the amount.
    #[must_use]
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Records the target's health as it stood right after the occurrence.
    #[must_use]
    pub fn with_target_health(mut self, health: Health) -> Self {
        self.target_health = Some(health);
        self
    }

    /// Target health ratio recorded on the event, if any.
    #[must_use]
    pub fn target_ratio(&self) -> Option<f64> {
        self.target_health.map(|h| h.ratio())
    }

    /// Derives a follow-up event one level deeper, keeping source, target
    /// and action.
    #[must_use]
    pub fn follow_up(&self, kind: CombatEventKind, amount: u32) -> Self {
        Self {
            kind,
            source: self.source,
            target: self.target,
            action: self.action.clone(),
            amount,
            target_health: None,
            depth: self.depth.saturating_add(1),
        }
    }
}

/// Ordered record of events produced by a session.
///
/// Drain it with [`EventLog::take_events`] after each turn, or let it grow
/// for a full replay log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CombatEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn record(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    /// Appends several events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = CombatEvent>) {
        self.events.extend(events);
    }

    /// Drains and returns all recorded events in recording order.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Counts recorded events of one kind.
    #[must_use]
    pub fn count_of(&self, kind: CombatEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Discards all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
