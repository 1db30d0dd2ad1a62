//! Roster of actors taking part in a combat session.
//!
//! Actors are stored in a `BTreeMap` keyed by [`ActorId`] so every pass over
//! the roster visits actors in the same order on every run. Spawned actors
//! receive monotonically increasing IDs.
//!
//! # Example
//!
//! ```
//! use fray_core::entity::ActorRole;
//! use fray_core::roster::Roster;
//!
//! let mut roster = Roster::new();
//! let hero = roster.spawn("Ayla", ActorRole::Character, 100);
//! let imp = roster.spawn("Imp", ActorRole::Enemy, 30);
//!
//! assert!(hero < imp);
//! assert_eq!(roster.first_living(ActorRole::Enemy), Some(imp));
//! ```

use std::collections::BTreeMap;

use crate::entity::{Actor, ActorId, ActorRole, Health};
use crate::status::StatusFlags;

/// Ordered collection of actors.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    actors: BTreeMap<ActorId, Actor>,
    next_id: u64,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh actor with the next free ID and returns that ID.
    pub fn spawn(&mut self, name: &str, role: ActorRole, max_health: u32) -> ActorId {
        let id = self.allocate_id();
        self.actors.insert(id, Actor::new(id, name, role, max_health));
        id
    }

    /// Inserts a prepared actor under its own ID.
    ///
    /// Returns the actor previously stored under that ID, if any.
    pub fn insert(&mut self, actor: Actor) -> Option<Actor> {
        let id = actor.id();
        self.next_id = self.next_id.max(id.as_u64() + 1);
        self.actors.insert(id, actor)
    }

    /// Removes an actor. Returns `None` if it was not present.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    /// Looks up an actor.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Looks up an actor mutably.
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Returns true if the actor is present.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Number of actors, living or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Actors in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// IDs of living actors with the given role, in ID order.
    pub fn living(&self, role: ActorRole) -> impl Iterator<Item = ActorId> + '_ {
        self.actors
            .values()
            .filter(move |a| a.role() == role && a.is_alive())
            .map(Actor::id)
    }

    /// Lowest-ID living actor with the given role.
    #[must_use]
    pub fn first_living(&self, role: ActorRole) -> Option<ActorId> {
        self.living(role).next()
    }

    /// Returns true if at least one living actor has the given role.
    #[must_use]
    pub fn any_living(&self, role: ActorRole) -> bool {
        self.first_living(role).is_some()
    }

    /// Health of an actor, for observers.
    #[must_use]
    pub fn health(&self, id: ActorId) -> Option<Health> {
        self.get(id).map(|a| a.health)
    }

    /// Status flags of an actor, for observers.
    #[must_use]
    pub fn status_flags(&self, id: ActorId) -> Option<StatusFlags> {
        self.get(id).map(Actor::status_flags)
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        id
    }
}
