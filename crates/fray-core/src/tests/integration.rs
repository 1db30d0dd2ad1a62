//! Integration tests for the full turn pipeline.
//!
//! These tests drive [`CombatSession`] end to end:
//! - Health clamping through damage, healing and multi-hit actions
//! - Affliction application, ticking and stun skips
//! - Trigger dispatch, follow-up chains and failure isolation
//! - Combo chains, timing and state gating

use std::sync::Arc;

use crate::action::{Action, ActionCategory, ActionFlags, ActionId, TriggerCondition};
use crate::config::CombatConfig;
use crate::entity::{ActorId, ActorRole};
use crate::error::CombatError;
use crate::event::CombatEventKind;
use crate::resolver::{apply_damage, HitOutcome};
use crate::session::{CombatSession, SkipReason};
use crate::state::GameState;
use crate::status::StatusFlags;
use crate::trigger::{BonusDamage, ChainEvent, GrantXp, GrantXpForFirstUses};

use super::helpers::{
    actor_mut, certain_afflictions, combat_session, combat_session_with, hp, run_until, spawn_dummy,
    spawn_fighter, sure_strike, CountingHandler, FailingHandler,
};

fn duel(seed: u64, action: Action, strength: u32, enemy_hp: u32) -> (CombatSession, ActorId, ActorId) {
    duel_with(CombatConfig::default(), seed, action, strength, enemy_hp)
}

fn duel_with(
    config: CombatConfig,
    seed: u64,
    action: Action,
    strength: u32,
    enemy_hp: u32,
) -> (CombatSession, ActorId, ActorId) {
    let mut session = combat_session_with(config, seed);
    let hero = spawn_fighter(&mut session, "Hero", ActorRole::Character, 100, strength, action);
    let foe = spawn_dummy(&mut session, "Foe", ActorRole::Enemy, enemy_hp);
    session.begin();
    (session, hero, foe)
}

// =============================================================================
// Health
// =============================================================================

mod health_tests {
    use super::*;

    #[test]
    fn damage_then_heal_scenario() {
        let mend = Action::new("MEND", ActionCategory::Heal).with_heal_amount(10);
        let mut session = combat_session(3);
        let hero = spawn_fighter(&mut session, "Hero", ActorRole::Character, 100, 0, mend);
        spawn_dummy(&mut session, "Foe", ActorRole::Enemy, 10);
        session.begin();

        apply_damage(actor_mut(&mut session, hero), 20);
        assert_eq!(hp(&session, hero), 80);

        let report = session.resolve_turn(hero, None).unwrap();
        assert_eq!(report.healing, 10);
        assert_eq!(hp(&session, hero), 90);

        session.resolve_turn(hero, None).unwrap();
        let report = session.resolve_turn(hero, None).unwrap();
        assert_eq!(report.healing, 0);
        assert_eq!(hp(&session, hero), 100);
    }

    #[test]
    fn multi_hit_applies_each_hit_separately() {
        let flurry = sure_strike("FLURRY").with_multi_hit(3, 0.5);
        let (mut session, hero, foe) = duel(5, flurry, 10, 1_000);

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        assert_eq!(report.hits.len(), 3);
        assert_eq!(report.count_of(CombatEventKind::HitLanded), 3);
        let first = report.hits[0].amount();
        assert!(report.hits.iter().all(|h| h.amount() == first));
        assert_eq!(report.damage, first * 3);
        assert_eq!(hp(&session, foe), 1_000 - report.damage);
    }

    #[test]
    fn multi_hit_stops_at_defeat() {
        // A +100 bonus makes every landed hit critical: 10 x 2 x 0.5 per hit.
        let flurry = sure_strike("FLURRY").with_multi_hit(5, 0.5);
        let (mut session, hero, foe) = duel(5, flurry, 10, 15);

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        assert_eq!(report.hits.len(), 2);
        assert_eq!(hp(&session, foe), 0);
        assert_eq!(report.count_of(CombatEventKind::EnemyDied), 1);
        assert!(session.roster().status_flags(foe).unwrap().contains(StatusFlags::DEFEATED));
        assert!(!session.timeline().contains(foe));
    }
}

// =============================================================================
// Afflictions
// =============================================================================

mod status_tests {
    use super::*;

    #[test]
    fn poison_ticks_once_per_turn_and_keeps_stacks() {
        let mut session = combat_session(1);
        spawn_dummy(&mut session, "Hero", ActorRole::Character, 100);
        let foe = spawn_dummy(&mut session, "Foe", ActorRole::Enemy, 100);
        let defaults = session.config().status.clone();
        actor_mut(&mut session, foe).status.apply_poison(5, 3, false, &defaults);
        session.begin();

        let report = session.resolve_turn(foe, None).unwrap();
        assert_eq!(report.skipped, Some(SkipReason::NoAction));
        assert_eq!(report.status_tick.damage, 15);
        assert_eq!(hp(&session, foe), 85);
        assert_eq!(session.roster().get(foe).unwrap().status.poison_stacks(), 5);

        let ticks: Vec<_> = report
            .events
            .iter()
            .filter(|e| e.kind == CombatEventKind::StatusTick)
            .collect();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].amount, 15);
        assert_eq!(ticks[0].action, None);
    }

    #[test]
    fn poison_expires_with_its_timer() {
        let mut session = combat_session(1);
        spawn_dummy(&mut session, "Hero", ActorRole::Character, 100);
        let foe = spawn_dummy(&mut session, "Foe", ActorRole::Enemy, 100);
        let defaults = session.config().status.clone();
        actor_mut(&mut session, foe).status.apply_poison(2, 4, true, &defaults);
        session.begin();

        for _ in 0..3 {
            session.resolve_turn(foe, None).unwrap();
        }
        assert_eq!(hp(&session, foe), 100 - 3 * 8);
        let ledger = &session.roster().get(foe).unwrap().status;
        assert_eq!(ledger.poison_stacks(), 0);
        assert!(!ledger.is_bleeding());

        session.resolve_turn(foe, None).unwrap();
        assert_eq!(hp(&session, foe), 100 - 3 * 8);
    }

    #[test]
    fn stunned_actor_loses_exactly_one_turn() {
        let (mut session, hero, foe) = duel(2, sure_strike("SLASH"), 5, 1_000);
        actor_mut(&mut session, hero).status.apply_stun(1);

        let report = session.resolve_turn(hero, Some(foe)).unwrap();
        assert_eq!(report.skipped, Some(SkipReason::Stunned));
        assert_eq!(hp(&session, foe), 1_000);
        assert_eq!(session.usage().usage_count(hero, &ActionId::new("SLASH")), 0);
        assert!(!session.roster().get(hero).unwrap().is_stunned());

        let report = session.resolve_turn(hero, Some(foe)).unwrap();
        assert!(!report.is_skipped());
        assert_eq!(session.usage().usage_count(hero, &ActionId::new("SLASH")), 1);
    }

    #[test]
    fn action_flags_afflict_on_hit() {
        let venom = sure_strike("VENOM").with_flags(ActionFlags::CAUSES_POISON | ActionFlags::CAUSES_STUN);
        let (mut session, hero, foe) = duel_with(certain_afflictions(), 9, venom, 1, 1_000);

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        assert_eq!(report.count_of(CombatEventKind::StatusApplied), 2);
        let flags = session.roster().status_flags(foe).unwrap();
        assert!(flags.contains(StatusFlags::POISONED | StatusFlags::STUNNED));

        let skipped = session.resolve_turn(foe, None).unwrap();
        assert_eq!(skipped.skipped, Some(SkipReason::Stunned));
        let poison = session.config().status.poison_damage_per_stack;
        assert_eq!(skipped.status_tick.damage, poison);
    }

    #[test]
    fn default_affliction_chances_land_some_hits_only() {
        let venom = sure_strike("VENOM").with_flags(ActionFlags::CAUSES_POISON);
        let (mut session, hero, foe) = duel(12, venom, 1, 100_000);

        let mut hits = 0;
        let mut applied = 0;
        for _ in 0..120 {
            let report = session.resolve_turn(hero, Some(foe)).unwrap();
            hits += report.hits.len();
            applied += report.count_of(CombatEventKind::StatusApplied);
        }
        assert!(hits > 90);
        assert!(applied > 0, "poison never landed in {hits} hits");
        assert!(applied < hits, "poison landed on all {hits} hits");
    }

    #[test]
    fn zero_affliction_chance_never_lands() {
        let mut config = CombatConfig::default();
        config.status.stun_chance = 0.0;
        let bash = sure_strike("BASH").with_flags(ActionFlags::CAUSES_STUN);
        let (mut session, hero, foe) = duel_with(config, 13, bash, 1, 100_000);

        for _ in 0..30 {
            let report = session.resolve_turn(hero, Some(foe)).unwrap();
            assert_eq!(report.count_of(CombatEventKind::StatusApplied), 0);
        }
        assert!(!session.roster().get(foe).unwrap().is_stunned());
    }

    #[test]
    fn burning_hit_sets_target_alight_until_stacks_burn_off() {
        let torch = sure_strike("TORCH").with_flags(ActionFlags::CAUSES_BURN);
        let (mut session, hero, foe) = duel_with(certain_afflictions(), 15, torch, 1, 1_000);

        run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        let flags = session.roster().status_flags(foe).unwrap();
        assert!(flags.contains(StatusFlags::BURNING));
        let before = hp(&session, foe);

        let report = session.resolve_turn(foe, None).unwrap();
        let burn = session.config().status.burn_damage_per_stack;
        assert_eq!(report.status_tick.damage, burn);
        assert!(report.status_tick.expired.contains(StatusFlags::BURNING));
        assert_eq!(hp(&session, foe), before - burn);
        assert!(!session.roster().get(foe).unwrap().status.is_burning());
    }
}

// =============================================================================
// Triggers
// =============================================================================

mod trigger_tests {
    use super::*;

    #[test]
    fn on_kill_fires_once_and_grants_xp() {
        let (mut session, hero, foe) = duel(4, sure_strike("SLASH"), 50, 10);
        let kills = CountingHandler::shared();
        session
            .dispatcher_mut()
            .register(ActionId::new("SLASH"), [TriggerCondition::OnKill], kills.clone());
        session
            .dispatcher_mut()
            .register_global([TriggerCondition::OnKill], Arc::new(GrantXp { amount: 100 }));

        run_until(&mut session, hero, foe, 50, |r| {
            r.count_of(CombatEventKind::EnemyDied) > 0
        })
        .expect("the foe falls within 50 turns");
        assert_eq!(kills.calls(), 1);
        assert!(kills.seen().iter().all(|e| e.kind == CombatEventKind::EnemyDied));
        assert_eq!(session.roster().get(hero).unwrap().level(), 2);

        // Swinging at the fallen foe produces nothing further.
        session.resolve_turn(hero, Some(foe)).unwrap();
        assert_eq!(kills.calls(), 1);
        assert!(session.is_over());
    }

    #[test]
    fn health_threshold_fires_per_hit_that_crosses_it() {
        // Every landed hit is critical: 30 x 2 x 0.5 leaves 70, 40, then 10.
        let flurry = sure_strike("FLURRY").with_multi_hit(3, 0.5);
        let (mut session, hero, foe) = duel(5, flurry, 30, 100);
        let bloodied = CountingHandler::shared();
        session.dispatcher_mut().register(
            ActionId::new("FLURRY"),
            [TriggerCondition::HealthBelow(0.5)],
            bloodied.clone(),
        );

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        let afters: Vec<u32> = report.hits.iter().map(|h| h.after).collect();
        assert_eq!(afters, vec![70, 40, 10]);
        assert_eq!(report.count_of(CombatEventKind::CriticalHit), 3);
        assert_eq!(bloodied.calls(), 2);
        let seen: Vec<u32> = bloodied
            .seen()
            .iter()
            .filter_map(|e| e.target_health.map(|h| h.current))
            .collect();
        assert_eq!(seen, vec![40, 10]);
    }

    #[test]
    fn first_use_xp_is_gated_by_usage() {
        let (mut session, hero, foe) = duel(6, sure_strike("SLASH"), 1, 100_000);
        session.dispatcher_mut().register(
            ActionId::new("SLASH"),
            [TriggerCondition::OnHit, TriggerCondition::OnMiss],
            Arc::new(GrantXpForFirstUses { amount: 10, uses: 2 }),
        );

        for _ in 0..5 {
            session.resolve_turn(hero, Some(foe)).unwrap();
        }
        assert_eq!(session.usage().usage_count(hero, &ActionId::new("SLASH")), 5);
        assert_eq!(session.roster().get(hero).unwrap().xp(), 20);
    }

    #[test]
    fn bonus_damage_kill_reaches_on_kill_handlers() {
        let (mut session, hero, foe) = duel(8, sure_strike("SLASH"), 1, 50);
        let kills = CountingHandler::shared();
        session.dispatcher_mut().register(
            ActionId::new("SLASH"),
            [TriggerCondition::OnHit],
            Arc::new(BonusDamage { amount: 1_000 }),
        );
        session
            .dispatcher_mut()
            .register(ActionId::new("SLASH"), [TriggerCondition::OnKill], kills.clone());

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        assert_eq!(hp(&session, foe), 0);
        assert_eq!(kills.calls(), 1);
        let died = report
            .events
            .iter()
            .find(|e| e.kind == CombatEventKind::EnemyDied)
            .expect("defeat reported");
        assert_eq!(died.depth, 1);
    }

    #[test]
    fn failing_handler_is_isolated() {
        let (mut session, hero, foe) = duel(10, sure_strike("SLASH"), 5, 1_000);
        let after = CountingHandler::shared();
        let any_swing = [TriggerCondition::OnHit, TriggerCondition::OnMiss];
        session.dispatcher_mut().register_global(any_swing, Arc::new(FailingHandler));
        session.dispatcher_mut().register_global(any_swing, after.clone());

        let report = session.resolve_turn(hero, Some(foe)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            CombatError::HandlerFailure { handler, .. } if handler == "failing"
        ));
        assert_eq!(after.calls(), 1);
        assert_eq!(hp(&session, foe), 1_000 - report.damage);
    }

    #[test]
    fn runaway_chains_are_cut() {
        let (mut session, hero, foe) = duel(12, sure_strike("SLASH"), 1, 100_000);
        session.dispatcher_mut().register(
            ActionId::new("SLASH"),
            [TriggerCondition::OnHit],
            Arc::new(ChainEvent {
                kind: CombatEventKind::HitLanded,
            }),
        );

        let report = run_until(&mut session, hero, foe, 50, |r| !r.hits.is_empty())
            .expect("a hit lands within 50 turns");
        let depth = usize::from(session.config().max_chain_depth);
        assert_eq!(report.count_of(CombatEventKind::HitLanded), depth + 1);
        assert_eq!(report.dropped_events, 1);
    }

    #[test]
    fn session_log_collects_every_turn() {
        let (mut session, hero, foe) = duel(13, sure_strike("SLASH"), 1, 100_000);
        let first = session.resolve_turn(hero, Some(foe)).unwrap();
        let second = session.resolve_turn(hero, Some(foe)).unwrap();

        let logged = session.take_events();
        assert_eq!(logged.len(), first.events.len() + second.events.len());
        assert!(session.events().is_empty());
    }
}

// =============================================================================
// Selection, Timing and State
// =============================================================================

mod flow_tests {
    use super::*;

    #[test]
    fn combo_chain_runs_in_order() {
        let mut session = combat_session(21);
        let hero = spawn_fighter(
            &mut session,
            "Hero",
            ActorRole::Character,
            100,
            1,
            sure_strike("JAB"),
        );
        {
            let actor = actor_mut(&mut session, hero);
            actor.add_action(sure_strike("FINISHER").as_combo(2), 1.0);
            actor.add_action(sure_strike("OPENER").as_combo(1), 1.0);
        }
        let foe = spawn_dummy(&mut session, "Foe", ActorRole::Enemy, 100_000);
        let combos = CountingHandler::shared();
        session
            .dispatcher_mut()
            .register(ActionId::new("OPENER"), [TriggerCondition::OnCombo], combos.clone());
        session.begin();

        let mut openers = 0;
        let mut saw_combo = false;
        for _ in 0..60 {
            let report = session.resolve_turn(hero, Some(foe)).unwrap();
            let action = report.action.clone().unwrap();
            match report.chain_step {
                Some(0) => {
                    assert_eq!(action.as_str(), "OPENER");
                    openers += 1;
                    saw_combo = true;
                }
                Some(1) => assert_eq!(action.as_str(), "FINISHER"),
                Some(step) => panic!("unexpected chain step {step}"),
                None => assert_eq!(action.as_str(), "JAB"),
            }
            assert_eq!(report.count_of(CombatEventKind::ComboTriggered), usize::from(report.was_combo()));
        }
        assert!(saw_combo);
        assert_eq!(combos.calls(), openers);
    }

    #[test]
    fn critical_miss_doubles_next_duration_once() {
        let (mut session, hero, foe) = duel(14, sure_strike("SLASH").with_length(1.5), 1, 100_000);
        actor_mut(&mut session, hero).set_critical_miss_pending(true);

        let slowed = session.resolve_turn(hero, Some(foe)).unwrap();
        assert!((slowed.duration - 3.0).abs() < 1e-9);

        // Clear any penalty the slowed turn's own roll may have set.
        actor_mut(&mut session, hero).set_critical_miss_pending(false);
        let normal = session.resolve_turn(hero, Some(foe)).unwrap();
        assert!((normal.duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn natural_one_sets_critical_miss_penalty() {
        let (mut session, hero, foe) = duel(15, sure_strike("SLASH"), 1, 100_000);
        for _ in 0..400 {
            let report = session.resolve_turn(hero, Some(foe)).unwrap();
            let critical_miss = report
                .outcomes
                .iter()
                .any(|(_, o)| *o == HitOutcome::Miss { critical: true });
            assert_eq!(
                session.roster().get(hero).unwrap().critical_miss_pending(),
                critical_miss
            );
        }
    }

    #[test]
    fn agile_actor_takes_more_turns() {
        let mut session = combat_session(16);
        let hero = spawn_fighter(&mut session, "Quick", ActorRole::Character, 100_000, 1, sure_strike("JAB"));
        actor_mut(&mut session, hero).stats.agility = 10;
        let foe = spawn_fighter(&mut session, "Slow", ActorRole::Enemy, 100_000, 1, sure_strike("BITE"));
        session.begin();

        let mut quick_turns = 0;
        let mut slow_turns = 0;
        for _ in 0..30 {
            let report = session.next_turn().unwrap().expect("fight continues");
            if report.actor == hero {
                quick_turns += 1;
            } else {
                assert_eq!(report.actor, foe);
                slow_turns += 1;
            }
        }
        assert!(quick_turns > slow_turns, "{quick_turns} vs {slow_turns}");
    }

    #[test]
    fn fight_runs_to_completion() {
        let mut session = combat_session(17);
        let hero = spawn_fighter(&mut session, "Hero", ActorRole::Character, 60, 8, sure_strike("SLASH"));
        spawn_fighter(&mut session, "Wolf", ActorRole::Enemy, 30, 6, sure_strike("BITE"));
        spawn_fighter(&mut session, "Rat", ActorRole::Enemy, 20, 4, sure_strike("GNAW"));
        session.state_mut().set_current_player(hero);
        session.begin();

        let mut turns = 0;
        while session.next_turn().unwrap().is_some() {
            turns += 1;
            assert!(turns < 500, "fight never ended");
        }
        assert!(session.is_over());

        let outcome = if session.roster().get(hero).unwrap().is_alive() {
            GameState::DungeonCompletion
        } else {
            GameState::Death
        };
        session.end(outcome);
        assert_eq!(session.state().current(), outcome);
        assert_eq!(session.state().current_player(), Some(hero));
    }

    #[test]
    fn turns_are_gated_on_combat_state() {
        let mut session = combat_session(18);
        let hero = spawn_fighter(&mut session, "Hero", ActorRole::Character, 10, 1, sure_strike("SLASH"));
        spawn_dummy(&mut session, "Foe", ActorRole::Enemy, 10);

        session.state_mut().transition_to_state(GameState::Inventory);
        assert!(matches!(
            session.resolve_turn(hero, None),
            Err(CombatError::NotInCombat { state: GameState::Inventory })
        ));
        assert_eq!(session.usage().total_for(hero), 0);
        assert!(session.events().is_empty());

        session.begin();
        assert!(session.resolve_turn(hero, None).is_ok());
        assert_eq!(session.state().previous(), Some(GameState::Inventory));
    }

    #[test]
    fn invalid_action_length_fails_before_the_turn() {
        for length in [0.0, -2.0, f64::NAN] {
            let blink = sure_strike("BLINK").with_length(length);
            let (mut session, hero, foe) = duel(20, blink, 1, 10);
            let slot = session.timeline().next_time(hero);

            assert!(matches!(
                session.resolve_turn(hero, Some(foe)),
                Err(CombatError::InvalidArgument(_))
            ));
            assert_eq!(session.usage().total_for(hero), 0);
            assert_eq!(session.timeline().next_time(hero), slot);
            assert!(session.events().is_empty());
            assert_eq!(hp(&session, foe), 10);
        }
    }

    #[test]
    fn defeated_actor_cannot_act() {
        let (mut session, hero, foe) = duel(19, sure_strike("SLASH"), 1, 10);
        apply_damage(actor_mut(&mut session, hero), 1_000);
        let report = session.resolve_turn(hero, Some(foe)).unwrap();
        assert_eq!(report.skipped, Some(SkipReason::Defeated));
        assert!(!session.timeline().contains(hero));
    }
}
