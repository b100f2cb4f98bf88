//! Subject groups — the spacecraft a condition or action refers to.
//!
//! A group is described by spacecraft IDs, squad names and team IDs.
//! Resolution against the battlefield is cached. The cache is either
//! `Stale` (recompute on next use) or `Resolved`; it is refreshed only
//! on request or while it resolves to nothing.
//!
//! A resolved cache deliberately keeps handles to spacecraft that have
//! since been destroyed or removed: "is it dead" is exactly what the
//! destroyed and count conditions ask.

use crate::{
    battle::{Battlefield, Spacecraft},
    strings::list_join,
    types::{SpacecraftHandle, SpacecraftId},
};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Static selector as it appears in mission data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDescriptor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spacecrafts: Vec<SpacecraftId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub squads:      Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams:       Vec<String>,
}

impl SubjectDescriptor {
    pub fn is_empty(&self) -> bool {
        self.spacecrafts.is_empty() && self.squads.is_empty() && self.teams.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Stale,
    Resolved(Vec<SpacecraftHandle>),
}

#[derive(Debug, Clone)]
pub struct SubjectGroup {
    descriptor: SubjectDescriptor,
    cache:      Resolution,
    short:      OnceCell<String>,
}

impl SubjectGroup {
    pub fn new(descriptor: SubjectDescriptor) -> Self {
        Self {
            descriptor,
            cache: Resolution::Stale,
            short: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &SubjectDescriptor {
        &self.descriptor
    }

    pub fn uses_teams(&self) -> bool {
        !self.descriptor.teams.is_empty()
    }

    /// Whether `spacecraft` is selected by ID, squad or team.
    pub fn has(&self, spacecraft: &Spacecraft) -> bool {
        let d = &self.descriptor;
        d.spacecrafts.iter().any(|id| id == spacecraft.id())
            || spacecraft.squad().is_some_and(|squad| d.squads.iter().any(|s| s == squad))
            || spacecraft.team().is_some_and(|team| d.teams.iter().any(|t| t == team))
    }

    /// Marks the cache stale so the next `resolve` recomputes it.
    pub fn refresh(&mut self) {
        self.cache = Resolution::Stale;
    }

    /// Resolved spacecraft, recomputed only when stale or empty.
    pub fn resolve(&mut self, world: &Battlefield) -> &[SpacecraftHandle] {
        let needs_resolve = match &self.cache {
            Resolution::Stale => true,
            Resolution::Resolved(handles) => handles.is_empty(),
        };
        if needs_resolve {
            let handles = world
                .spacecrafts()
                .filter(|(_, sc)| self.has(sc))
                .map(|(h, _)| h)
                .collect();
            self.cache = Resolution::Resolved(handles);
        }
        match &self.cache {
            Resolution::Resolved(handles) => handles,
            Resolution::Stale => &[],
        }
    }

    /// The cache as last resolved, without touching it. Used where a
    /// locked view is required (objective display after the fact).
    pub fn cached(&self) -> &[SpacecraftHandle] {
        match &self.cache {
            Resolution::Resolved(handles) => handles,
            Resolution::Stale => &[],
        }
    }

    /// Whether the descriptor can denote more than one spacecraft.
    pub fn is_multi(&self) -> bool {
        let d = &self.descriptor;
        d.spacecrafts.len() > 1 || !d.squads.is_empty() || !d.teams.is_empty()
    }

    /// Full clause for objective text, e.g. "Alpha 1, the squad beta and the team empire".
    pub fn describe(&self, world: &Battlefield) -> String {
        let d = &self.descriptor;
        let mut parts: Vec<String> = d
            .spacecrafts
            .iter()
            .map(|id| {
                world
                    .handle_of(id)
                    .map(|h| world.get(h).display_name().to_string())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        parts.extend(d.squads.iter().map(|s| format!("the squad {s}")));
        parts.extend(d.teams.iter().map(|t| {
            let name = world.team(t).map(|team| team.name.as_str()).unwrap_or(t);
            format!("the team {name}")
        }));
        list_join(&parts)
    }

    /// Compact label for the HUD, computed once.
    pub fn short_string(&self, world: &Battlefield) -> &str {
        self.short.get_or_init(|| {
            let d = &self.descriptor;
            let total = d.spacecrafts.len() + d.squads.len() + d.teams.len();
            if total == 1 {
                if let Some(id) = d.spacecrafts.first() {
                    return world
                        .handle_of(id)
                        .map(|h| world.get(h).display_name().to_string())
                        .unwrap_or_else(|| id.clone());
                }
                if let Some(squad) = d.squads.first() {
                    return format!("squad {squad}");
                }
                if let Some(team) = d.teams.first() {
                    let name = world.team(team).map(|t| t.name.as_str()).unwrap_or(team);
                    return format!("team {name}");
                }
            }
            match (d.spacecrafts.len(), d.squads.len(), d.teams.len()) {
                (n, 0, 0) => format!("{n} spacecraft"),
                (0, n, 0) => format!("{n} squads"),
                (0, 0, n) => format!("{n} teams"),
                _ => format!("{total} groups"),
            }
        })
    }

    fn matching<'w>(
        &'w self,
        world: &'w Battlefield,
        present_only: bool,
    ) -> impl Iterator<Item = &'w Spacecraft> + 'w {
        self.cached()
            .iter()
            .map(move |h| world.get(*h))
            .filter(move |sc| sc.is_alive() && !(present_only && sc.is_away()))
    }

    /// Number of alive subjects in the locked cache, optionally ignoring
    /// those currently away from the battle.
    pub fn live_count(&self, world: &Battlefield, present_only: bool) -> usize {
        self.matching(world, present_only).count()
    }

    /// Lowest hull integrity in percent among matching subjects. Starts
    /// from 100, so an empty match reports 100.
    pub fn min_hull_integrity(&self, world: &Battlefield, present_only: bool) -> f64 {
        self.matching(world, present_only)
            .map(|sc| sc.hull_integrity() * 100.0)
            .fold(100.0, f64::min)
    }

    /// Highest hull integrity in percent among matching subjects, 0 if none.
    pub fn max_hull_integrity(&self, world: &Battlefield, present_only: bool) -> f64 {
        self.matching(world, present_only)
            .map(|sc| sc.hull_integrity() * 100.0)
            .fold(0.0, f64::max)
    }
}
