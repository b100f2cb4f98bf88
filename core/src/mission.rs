//! Mission — owns the scripted events and runs them tick by tick.
//!
//! ORDER WITHIN ONE TICK (fixed):
//!   1. Mission time advances by dt.
//!   2. Every event's trigger is ticked, in event order. A firing trigger
//!      runs its zero-delay actions immediately, so events later in the
//!      order already observe their effects this tick. Delayed actions
//!      are queued with due time `elapsed + delay`.
//!   3. Queued actions that are due are executed, earliest due first.
//!   4. Defeat is checked against the piloted spacecraft.
//!
//! A trigger is evaluated once per tick, so a cascade never re-enters an
//! event that was already ticked: one hop per tick.

use crate::{
    action::{Action, ActionContext},
    battle::{Battlefield, Spacecraft, Team},
    condition::{Condition, EvalContext},
    config::EngineConfig,
    descriptor::{EventDescriptor, MissionDescriptor},
    error::{ScriptError, ScriptResult},
    event::ScriptEvent,
    hud::{HudSink, MessageQueue},
    objective::{ObjectiveKind, ObjectiveState},
    trigger::Trigger,
    types::{Millis, SpacecraftHandle, Tick},
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionState {
    /// No objectives: free play.
    #[default]
    None,
    InProgress,
    Completed,
    Failed,
    /// The piloted spacecraft was destroyed during a mission with objectives.
    Defeat,
    /// The piloted spacecraft was destroyed during free play.
    Ended,
}

impl MissionState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Defeat | Self::Ended)
    }
}

/// A trigger and the actions bound to it.
#[derive(Debug, Clone)]
pub struct MissionEvent {
    name:    String,
    trigger: Trigger,
    actions: Vec<Action>,
}

impl MissionEvent {
    /// Binds `actions` to `trigger`, registering each as a fire handler.
    pub fn new(name: impl Into<String>, mut trigger: Trigger, actions: Vec<Action>) -> Self {
        for index in 0..actions.len() {
            trigger.add_fire_handler(index);
        }
        Self { name: name.into(), trigger, actions }
    }

    fn from_descriptor(name: String, descriptor: EventDescriptor) -> ScriptResult<Self> {
        let trigger = Trigger::from_descriptor(descriptor.trigger)?;
        let actions = descriptor
            .actions
            .into_iter()
            .map(Action::from_descriptor)
            .collect::<ScriptResult<Vec<_>>>()?;
        Ok(Self::new(name, trigger, actions))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Events named as the start of a time condition in this trigger.
    fn start_references(&self) -> impl Iterator<Item = &str> {
        self.trigger.conditions().iter().filter_map(|c| match c {
            Condition::Time(t) => t.params().start.as_deref(),
            _ => None,
        })
    }

    /// Re-resolves the condition subjects against `world`. A single
    /// trigger that already fired keeps the view it fired on.
    fn relock_subjects(&mut self, world: &Battlefield, teams_only: bool) {
        if self.trigger.is_single() && self.trigger.has_fired() {
            return;
        }
        let groups = self
            .trigger
            .conditions_mut()
            .iter_mut()
            .filter_map(Condition::subjects_mut)
            .filter(|g| !teams_only || g.uses_teams());
        for group in groups {
            group.refresh();
            group.resolve(world);
        }
    }
}

/// One queued execution of a delayed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingAction {
    due:    Millis,
    seq:    u64,
    event:  usize,
    action: usize,
}

pub struct Mission {
    name:         String,
    description:  Option<String>,
    config:       EngineConfig,
    world:        Battlefield,
    events:       Vec<MissionEvent>,
    fired_events: HashSet<String>,
    queue:        BinaryHeap<Reverse<PendingAction>>,
    next_seq:     u64,
    elapsed:      Millis,
    tick:         Tick,
    state:        MissionState,
    hud:          Box<dyn HudSink>,
    log:          Vec<ScriptEvent>,
}

impl Mission {
    /// Builds a mission from already constructed parts, with the headless HUD.
    pub fn new(name: impl Into<String>, world: Battlefield, mut events: Vec<MissionEvent>, config: EngineConfig) -> Self {
        let has_objectives = events
            .iter()
            .flat_map(|e| e.actions.iter())
            .any(|a| a.objective_kind().is_some());
        let hud: Box<dyn HudSink> = Box::new(MessageQueue::new(config.hud.clone()));
        for event in &mut events {
            event.relock_subjects(&world, false);
        }
        Self {
            name: name.into(),
            description: None,
            config,
            world,
            events,
            fired_events: HashSet::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            elapsed: 0,
            tick: 0,
            state: if has_objectives { MissionState::InProgress } else { MissionState::None },
            hud,
            log: Vec::new(),
        }
    }

    /// Replaces the HUD collaborator.
    pub fn with_hud(mut self, hud: Box<dyn HudSink>) -> Self {
        self.hud = hud;
        self
    }

    /// Builds a mission from mission data.
    ///
    /// The battlefield must be consistent (unique spacecraft, known teams)
    /// or loading fails. Events that fail to build are skipped with a
    /// warning, unless `config.strict_loading` is set.
    pub fn from_descriptor(descriptor: MissionDescriptor, config: EngineConfig) -> ScriptResult<Self> {
        let mut world = Battlefield::new();
        for team in &descriptor.teams {
            world.add_team(team.id.clone(), team.name.clone().unwrap_or_else(|| team.id.clone()));
        }
        for sc in &descriptor.spacecrafts {
            if let Some(team) = &sc.team {
                if world.team(team).is_none() {
                    return Err(ScriptError::UnknownTeam { name: team.clone() });
                }
            }
            let mut spacecraft = Spacecraft::new(sc.id.clone())
                .with_name(sc.name.clone().unwrap_or_else(|| sc.id.clone()))
                .with_hull(sc.hull)
                .with_shield(sc.shield);
            if let Some(squad) = &sc.squad {
                spacecraft = spacecraft.with_squad(squad.clone());
            }
            if let Some(team) = &sc.team {
                spacecraft = spacecraft.with_team(team.clone());
            }
            spacecraft.set_away(sc.away);
            if world.spawn(spacecraft).is_none() {
                return Err(ScriptError::DuplicateSpacecraft { id: sc.id.clone() });
            }
            if sc.piloted {
                world.set_piloted(&sc.id);
            }
        }

        let strict = config.strict_loading;
        let mut names = HashSet::new();
        let mut events = Vec::new();
        for (index, event) in descriptor.events.into_iter().enumerate() {
            let name = event.name.clone().unwrap_or_else(|| format!("event-{index}"));
            if !names.insert(name.clone()) {
                return Err(ScriptError::DuplicateEvent { name });
            }
            match MissionEvent::from_descriptor(name.clone(), event) {
                Ok(built) => events.push(built),
                Err(e) if strict => return Err(e),
                Err(e) => log::warn!("skipping event '{name}': {e}"),
            }
        }

        // Drop events whose timers wait for an event that does not exist,
        // until no dangling reference is left.
        loop {
            let known: HashSet<String> = events.iter().map(|e| e.name.clone()).collect();
            let dangling = events.iter().position(|e| e.start_references().any(|r| !known.contains(r)));
            let Some(index) = dangling else { break };
            let missing = events[index]
                .start_references()
                .find(|r| !known.contains(*r))
                .unwrap_or_default()
                .to_string();
            let err = ScriptError::UnknownEvent { name: missing };
            if strict {
                return Err(err);
            }
            log::warn!("skipping event '{}': {err}", events[index].name);
            events.remove(index);
        }

        let mut mission = Self::new(
            descriptor.name.unwrap_or_else(|| "untitled".into()),
            world,
            events,
            config,
        );
        mission.description = descriptor.description;
        log::info!(
            "mission '{}' loaded: {} spacecraft, {} events, state {:?}",
            mission.name,
            mission.world.len(),
            mission.events.len(),
            mission.state
        );
        Ok(mission)
    }

    // ── Queries ────────────────────────────────────────────

    pub fn name(&self) -> &str                   { &self.name }
    pub fn description(&self) -> Option<&str>   { self.description.as_deref() }
    pub fn config(&self) -> &EngineConfig        { &self.config }
    pub fn state(&self) -> MissionState          { self.state }
    pub fn elapsed(&self) -> Millis              { self.elapsed }
    pub fn current_tick(&self) -> Tick           { self.tick }
    pub fn world(&self) -> &Battlefield          { &self.world }
    pub fn is_finished(&self) -> bool            { self.state.is_finished() }
    pub fn events(&self) -> &[MissionEvent]      { &self.events }
    pub fn hud(&self) -> &dyn HudSink            { self.hud.as_ref() }

    /// Direct battlefield access for the simulation layer (damage,
    /// destruction, jumps). Spawning must go through `spawn_spacecraft`.
    pub fn world_mut(&mut self) -> &mut Battlefield {
        &mut self.world
    }

    pub fn spacecrafts(&self) -> impl Iterator<Item = (SpacecraftHandle, &Spacecraft)> {
        self.world.spacecrafts()
    }

    pub fn spacecraft(&self, id: &str) -> Option<&Spacecraft> {
        self.world.spacecraft(id)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.world.team(id)
    }

    pub fn piloted_spacecraft(&self) -> Option<&Spacecraft> {
        self.world.piloted()
    }

    pub fn event(&self, name: &str) -> Option<&MissionEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Downcasts the HUD collaborator, for tests and tooling.
    pub fn hud_as<T: 'static>(&self) -> Option<&T> {
        self.hud.as_any().downcast_ref::<T>()
    }

    /// Delayed executions not yet run.
    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    // ── Mission operations used by actions ─────────────────

    pub fn complete_mission(&mut self) {
        if self.state == MissionState::InProgress {
            self.set_state(MissionState::Completed);
        }
    }

    pub fn fail_mission(&mut self) {
        if self.state == MissionState::InProgress {
            self.set_state(MissionState::Failed);
        }
    }

    /// Re-resolves every condition group selecting by team.
    pub fn handle_teams_changed(&mut self) {
        for event in &mut self.events {
            event.relock_subjects(&self.world, true);
        }
        self.log.push(ScriptEvent::TeamsChanged { tick: self.tick });
    }

    /// Adds a spacecraft mid-mission and re-resolves every condition group.
    pub fn spawn_spacecraft(&mut self, spacecraft: Spacecraft) -> Option<SpacecraftHandle> {
        let handle = self.world.spawn(spacecraft)?;
        for event in &mut self.events {
            event.relock_subjects(&self.world, false);
        }
        Some(handle)
    }

    /// Schedules action `action` of event `event` to run `delay` ms from now.
    fn queue_action(&mut self, event: usize, action: usize, delay: Millis) {
        let due = self.elapsed + delay;
        self.queue.push(Reverse(PendingAction { due, seq: self.next_seq, event, action }));
        self.next_seq += 1;
        let event_ref = &self.events[event];
        log::debug!("queued '{}' of event '{}' due at {due} ms", event_ref.actions[action].type_name(), event_ref.name);
        self.log.push(ScriptEvent::ActionQueued {
            tick:   self.tick,
            event:  event_ref.name.clone(),
            action: event_ref.actions[action].type_name().to_string(),
            due_ms: due,
        });
    }

    // ── Tick ───────────────────────────────────────────────

    /// Advances the mission by `dt` ms and returns what happened.
    pub fn tick(&mut self, dt: Millis) -> Vec<ScriptEvent> {
        self.tick += 1;
        self.elapsed += dt;

        for index in 0..self.events.len() {
            let fired = {
                let ctx = EvalContext { world: &self.world, fired_events: &self.fired_events };
                self.events[index].trigger.tick(&ctx, dt)
            };
            if self.events[index].trigger.take_newly_impossible() {
                log::debug!("event '{}' can no longer fire", self.events[index].name);
                self.log.push(ScriptEvent::TriggerImpossible {
                    tick:  self.tick,
                    event: self.events[index].name.clone(),
                });
            }
            if fired {
                self.fire(index);
            }
        }

        self.drain_due_actions();
        self.check_piloted();
        std::mem::take(&mut self.log)
    }

    fn fire(&mut self, index: usize) {
        let event = &self.events[index];
        let fire_count = event.trigger.fire_count();
        log::info!("tick={} event '{}' fired (#{fire_count})", self.tick, event.name);
        self.fired_events.insert(event.name.clone());
        self.log.push(ScriptEvent::TriggerFired {
            tick: self.tick,
            event: event.name.clone(),
            fire_count,
        });
        let handlers = event.trigger.fire_handlers().to_vec();
        for action in handlers {
            self.add_to_execution_queue(index, action);
        }
    }

    /// Fire handler of an action: run now, or queue if delayed.
    fn add_to_execution_queue(&mut self, event: usize, action: usize) {
        let delay = self.events[event].actions[action].delay();
        if delay > 0 {
            self.queue_action(event, action, delay);
        } else {
            self.execute_action(event, action);
        }
    }

    fn drain_due_actions(&mut self) {
        while self.queue.peek().is_some_and(|Reverse(p)| p.due <= self.elapsed) {
            if let Some(Reverse(pending)) = self.queue.pop() {
                self.execute_action(pending.event, pending.action);
            }
        }
    }

    fn execute_action(&mut self, event: usize, action: usize) {
        self.log.push(ScriptEvent::ActionExecuted {
            tick:   self.tick,
            event:  self.events[event].name.clone(),
            action: self.events[event].actions[action].type_name().to_string(),
        });
        let (completed, failed, teams_changed) = {
            let mut ctx = ActionContext::new(
                self.tick,
                &mut self.world,
                &mut *self.hud,
                &self.config,
                &mut self.log,
            );
            self.events[event].actions[action].execute(&mut ctx);
            (ctx.completion_requested(), ctx.failure_requested(), ctx.teams_changed())
        };
        if completed {
            self.complete_mission();
        }
        if failed {
            self.fail_mission();
        }
        if teams_changed {
            self.handle_teams_changed();
        }
    }

    fn check_piloted(&mut self) {
        let piloted_dead = self.world.piloted().is_some_and(|sc| !sc.is_alive());
        if !piloted_dead {
            return;
        }
        match self.state {
            MissionState::InProgress => self.set_state(MissionState::Defeat),
            MissionState::None       => self.set_state(MissionState::Ended),
            _ => {}
        }
    }

    fn set_state(&mut self, to: MissionState) {
        let from = self.state;
        self.state = to;
        log::info!("tick={} mission '{}': {from:?} -> {to:?}", self.tick, self.name);
        self.log.push(ScriptEvent::MissionStateChanged { tick: self.tick, from, to });
    }

    // ── Objectives ─────────────────────────────────────────

    pub fn objective_count(&self) -> usize {
        self.events
            .iter()
            .flat_map(|e| e.actions.iter().map(move |a| a.objective_count(&e.trigger)))
            .sum()
    }

    /// Objective lines, win objectives first.
    pub fn objective_strings(&self) -> Vec<(ObjectiveKind, String)> {
        let mut lines = Vec::new();
        for kind in [ObjectiveKind::Win, ObjectiveKind::Lose] {
            for event in &self.events {
                for action in event.actions.iter().filter(|a| a.objective_kind() == Some(kind)) {
                    lines.extend(
                        action
                            .objective_strings(&event.trigger, &self.world)
                            .into_iter()
                            .map(|text| (kind, text)),
                    );
                }
            }
        }
        lines
    }

    /// Live objective states, win objectives first.
    pub fn objectives(&self) -> Vec<ObjectiveState> {
        let ended = self.is_finished();
        let mut states = Vec::new();
        for kind in [ObjectiveKind::Win, ObjectiveKind::Lose] {
            for event in &self.events {
                for action in event.actions.iter().filter(|a| a.objective_kind() == Some(kind)) {
                    states.extend(action.objectives_state(&event.trigger, &self.world, ended));
                }
            }
        }
        states
    }
}
