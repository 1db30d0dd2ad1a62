//! Coarse game mode tracking.
//!
//! The [`GameStateMachine`] holds exactly one current [`GameState`]. Any state
//! may follow any other; the machine records every transition but never
//! rejects one. Validation of "sensible" transitions is the caller's job.
//!
//! The combat session consults the machine before resolving a turn: turns
//! only run in [`GameState::Combat`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::entity::ActorId;

/// Game modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Title menu.
    #[default]
    MainMenu,
    /// Main loop between activities.
    GameLoop,
    /// A fight is in progress.
    Combat,
    /// Inventory screen.
    Inventory,
    /// Creating a new character.
    CharacterCreation,
    /// Choosing a starting weapon.
    WeaponSelection,
    /// Choosing a dungeon.
    DungeonSelection,
    /// Inside a dungeon.
    Dungeon,
    /// A dungeon was cleared.
    DungeonCompletion,
    /// The player died.
    Death,
    /// Settings screen.
    Settings,
    /// Character sheet.
    CharacterInfo,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A recorded state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State before the change.
    pub from: GameState,
    /// State after the change.
    pub to: GameState,
}

/// Holds the current game state and the tracked player.
#[derive(Debug, Clone, Default)]
pub struct GameStateMachine {
    current: GameState,
    player: Option<ActorId>,
    history: Vec<StateTransition>,
}

impl GameStateMachine {
    /// Creates a machine in [`GameState::MainMenu`] with no player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> GameState {
        self.current
    }

    /// Returns true if the machine is in `state`.
    #[must_use]
    pub fn is_in(&self, state: GameState) -> bool {
        self.current == state
    }

    /// The state before the most recent transition.
    #[must_use]
    pub fn previous(&self) -> Option<GameState> {
        self.history.last().map(|t| t.from)
    }

    /// Every transition, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Moves to `next` unconditionally and records the transition.
    ///
    /// Transitioning to the current state is allowed and recorded too.
    pub fn transition_to_state(&mut self, next: GameState) -> StateTransition {
        let transition = StateTransition {
            from: self.current,
            to: next,
        };
        self.current = next;
        self.history.push(transition);
        info!(from = %transition.from, to = %transition.to, "game state transition");
        transition
    }

    /// Attaches or replaces the tracked player. Does not change the state.
    pub fn set_current_player(&mut self, player: ActorId) {
        self.player = Some(player);
    }

    /// Detaches the tracked player. Does not change the state.
    pub fn clear_current_player(&mut self) {
        self.player = None;
    }

    /// The tracked player, if any.
    #[must_use]
    pub fn current_player(&self) -> Option<ActorId> {
        self.player
    }
}
