//! Battlefield state the scripting engine reads and mutates.
//!
//! This is the engine's view of the spacecraft collaborator: identity,
//! team membership, hull and shield integrity, and an event inbox that
//! the piloting layer drains. Physics, weapons and AI live elsewhere.
//!
//! RULE: Spacecraft are never dropped from the arena. A destroyed or
//! removed spacecraft keeps its handle so that subject caches taken
//! earlier can still ask whether it is alive.

use crate::types::{SpacecraftHandle, SpacecraftId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Events delivered to a spacecraft's handler by script actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SpacecraftEvent {
    /// AI command forwarded verbatim, with formation context attached.
    Command {
        params: Value,
        lead:   SpacecraftId,
        index:  usize,
    },
    /// HUD state change for the piloted spacecraft.
    Hud { params: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id:   String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spacecraft {
    id:             SpacecraftId,
    name:           String,
    squad:          Option<String>,
    team:           Option<String>,
    hull:           f64,
    shield:         f64,
    alive:          bool,
    away:           bool,
    removed:        bool,
    firing_enabled: bool,
    inbox:          Vec<SpacecraftEvent>,
}

impl Spacecraft {
    pub fn new(id: impl Into<SpacecraftId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            squad: None,
            team: None,
            hull: 1.0,
            shield: 1.0,
            alive: true,
            away: false,
            removed: false,
            firing_enabled: true,
            inbox: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_squad(mut self, squad: impl Into<String>) -> Self {
        self.squad = Some(squad.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_hull(mut self, hull: f64) -> Self {
        self.set_hull_integrity(hull);
        self
    }

    pub fn with_shield(mut self, shield: f64) -> Self {
        self.set_shield_integrity(shield);
        self
    }

    pub fn id(&self) -> &str             { &self.id }
    pub fn display_name(&self) -> &str   { &self.name }
    pub fn squad(&self) -> Option<&str>  { self.squad.as_deref() }
    pub fn team(&self) -> Option<&str>   { self.team.as_deref() }
    pub fn is_alive(&self) -> bool       { self.alive }
    pub fn is_away(&self) -> bool        { self.away }
    pub fn is_removed(&self) -> bool     { self.removed }
    pub fn can_fire(&self) -> bool       { self.firing_enabled }

    /// Hull integrity as a fraction in [0, 1].
    pub fn hull_integrity(&self) -> f64 {
        self.hull
    }

    /// Clamps to [0, 1]. Dropping to zero destroys the spacecraft.
    pub fn set_hull_integrity(&mut self, hull: f64) {
        self.hull = hull.clamp(0.0, 1.0);
        if self.hull <= 0.0 {
            self.alive = false;
        }
    }

    /// Shield integrity as a fraction in [0, 1].
    pub fn shield_integrity(&self) -> f64 {
        self.shield
    }

    pub fn set_shield_integrity(&mut self, shield: f64) {
        self.shield = shield.clamp(0.0, 1.0);
    }

    pub fn set_team(&mut self, team: impl Into<String>) {
        self.team = Some(team.into());
    }

    pub fn set_away(&mut self, away: bool) {
        self.away = away;
    }

    pub fn destroy(&mut self) {
        self.hull = 0.0;
        self.alive = false;
    }

    pub fn disable_firing(&mut self) { self.firing_enabled = false; }
    pub fn enable_firing(&mut self)  { self.firing_enabled = true;  }

    pub fn handle_event(&mut self, event: SpacecraftEvent) {
        self.inbox.push(event);
    }

    /// Events received since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<SpacecraftEvent> {
        std::mem::take(&mut self.inbox)
    }

    pub fn pending_events(&self) -> &[SpacecraftEvent] {
        &self.inbox
    }
}

/// Arena of spacecraft plus the team roster and the piloted craft.
#[derive(Debug, Clone, Default)]
pub struct Battlefield {
    arena:   Vec<Spacecraft>,
    by_id:   HashMap<SpacecraftId, SpacecraftHandle>,
    teams:   Vec<Team>,
    piloted: Option<SpacecraftHandle>,
}

impl Battlefield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        if self.team(&id).is_none() {
            self.teams.push(Team { id, name: name.into() });
        }
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Adds a spacecraft to the arena. Returns `None` if the id is taken.
    pub fn spawn(&mut self, spacecraft: Spacecraft) -> Option<SpacecraftHandle> {
        if self.by_id.contains_key(spacecraft.id()) {
            return None;
        }
        let handle = SpacecraftHandle(self.arena.len());
        self.by_id.insert(spacecraft.id().to_string(), handle);
        self.arena.push(spacecraft);
        Some(handle)
    }

    pub fn set_piloted(&mut self, id: &str) -> bool {
        match self.by_id.get(id) {
            Some(handle) => {
                self.piloted = Some(*handle);
                true
            }
            None => false,
        }
    }

    pub fn piloted(&self) -> Option<&Spacecraft> {
        self.piloted.map(|h| &self.arena[h.0])
    }

    pub fn piloted_mut(&mut self) -> Option<&mut Spacecraft> {
        self.piloted.map(|h| &mut self.arena[h.0])
    }

    pub fn handle_of(&self, id: &str) -> Option<SpacecraftHandle> {
        self.by_id.get(id).copied()
    }

    /// Looks up a spacecraft that is still part of the live list.
    pub fn spacecraft(&self, id: &str) -> Option<&Spacecraft> {
        self.by_id
            .get(id)
            .map(|h| &self.arena[h.0])
            .filter(|sc| !sc.is_removed())
    }

    pub fn spacecraft_mut(&mut self, id: &str) -> Option<&mut Spacecraft> {
        let handle = *self.by_id.get(id)?;
        let sc = &mut self.arena[handle.0];
        (!sc.is_removed()).then_some(sc)
    }

    /// Resolves a handle, including removed spacecraft.
    pub fn get(&self, handle: SpacecraftHandle) -> &Spacecraft {
        &self.arena[handle.0]
    }

    pub fn get_mut(&mut self, handle: SpacecraftHandle) -> &mut Spacecraft {
        &mut self.arena[handle.0]
    }

    /// The live spacecraft list (destroyed wrecks included until removed).
    pub fn spacecrafts(&self) -> impl Iterator<Item = (SpacecraftHandle, &Spacecraft)> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, sc)| !sc.is_removed())
            .map(|(i, sc)| (SpacecraftHandle(i), sc))
    }

    pub fn destroy(&mut self, id: &str) -> bool {
        match self.spacecraft_mut(id) {
            Some(sc) => {
                sc.destroy();
                true
            }
            None => false,
        }
    }

    /// Drops a spacecraft from the live list. Its handle stays valid.
    pub fn remove_spacecraft(&mut self, id: &str) -> bool {
        match self.spacecraft_mut(id) {
            Some(sc) => {
                sc.removed = true;
                true
            }
            None => false,
        }
    }

    pub fn set_away(&mut self, id: &str, away: bool) -> bool {
        match self.spacecraft_mut(id) {
            Some(sc) => {
                sc.set_away(away);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
