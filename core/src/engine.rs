//! The mission engine — drives a mission with a fixed-step clock and
//! records everything it does.
//!
//! RULES:
//!   - One tick = one `Mission::tick` with the clock's dt.
//!   - Every ScriptEvent is appended to the event log.
//!   - Nothing here reads a wall clock; identical missions replay
//!     identically.

use crate::{
    clock::MissionClock,
    config::EngineConfig,
    descriptor::MissionDescriptor,
    error::ScriptResult,
    event::{EventLogEntry, ScriptEvent},
    mission::Mission,
    snapshot::MissionSnapshot,
    store::ScriptStore,
    types::{RunId, Tick},
};

pub struct MissionEngine {
    pub run_id: RunId,
    pub clock:  MissionClock,
    mission:    Mission,
    store:      ScriptStore,
}

impl MissionEngine {
    pub fn new(run_id: RunId, mission: Mission, store: ScriptStore) -> Self {
        let clock = MissionClock::new(run_id.clone(), mission.config().tick_ms);
        Self { run_id, clock, mission, store }
    }

    /// Build an engine for mission data. The store must already be
    /// migrated and hold the run record.
    pub fn build(
        run_id: RunId,
        descriptor: MissionDescriptor,
        config: EngineConfig,
        store: ScriptStore,
    ) -> ScriptResult<Self> {
        let mission = Mission::from_descriptor(descriptor, config)?;
        Ok(Self::new(run_id, mission, store))
    }

    /// Build an engine over an in-memory store with the test config.
    pub fn build_test(run_id: RunId, descriptor: MissionDescriptor) -> ScriptResult<Self> {
        let store = ScriptStore::in_memory()?;
        store.migrate()?;
        let name = descriptor.name.clone().unwrap_or_else(|| "untitled".into());
        store.insert_run(&run_id, &name, "0.1.0-test")?;
        Self::build(run_id, descriptor, EngineConfig::default_test(), store)
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    /// Mutable access for the simulation layer between ticks.
    pub fn mission_mut(&mut self) -> &mut Mission {
        &mut self.mission
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> ScriptResult<Vec<ScriptEvent>> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let (current_tick, dt) = self.clock.advance();
        let mut tick_events = vec![ScriptEvent::TickStarted { tick: current_tick }];
        tick_events.extend(self.mission.tick(dt));
        tick_events.push(ScriptEvent::TickCompleted { tick: current_tick });

        for event in &tick_events {
            self.record(current_tick, "mission", event)?;
        }

        let interval = self.mission.config().snapshot_interval;
        if interval > 0 && current_tick.is_multiple_of(interval) {
            self.take_snapshot(current_tick)?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> ScriptResult<()> {
        self.initialize()?;
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Run until the mission reaches a terminal state or `max_ticks`
    /// have passed. Returns the number of ticks run.
    pub fn run_until_finished(&mut self, max_ticks: u64) -> ScriptResult<Tick> {
        self.initialize()?;
        self.clock.resume();
        let mut ran = 0;
        while ran < max_ticks && !self.mission.is_finished() {
            self.tick()?;
            ran += 1;
        }
        self.clock.pause();
        Ok(ran)
    }

    /// Query events for a specific tick from the store.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> ScriptResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            run_id:          self.run_id.clone(),
            tick:            self.clock.current_tick,
            clock:           self.clock.clone(),
            state:           self.mission.state(),
            pending_actions: self.mission.pending_actions(),
            objectives:      self.mission.objectives(),
        }
    }

    // Emit RunInitialized at tick 0 so the log names the mission it replays.
    fn initialize(&mut self) -> ScriptResult<()> {
        if self.clock.current_tick == 0 {
            let init = ScriptEvent::RunInitialized {
                run_id:  self.run_id.clone(),
                mission: self.mission.name().to_string(),
            };
            self.record(0, "engine", &init)?;
        }
        Ok(())
    }

    fn record(&self, tick: Tick, source: &str, event: &ScriptEvent) -> ScriptResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            tick,
            source:     source.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        self.store.append_event(&entry)
    }

    fn take_snapshot(&self, tick: Tick) -> ScriptResult<()> {
        let json = serde_json::to_string(&self.snapshot())?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }
}
