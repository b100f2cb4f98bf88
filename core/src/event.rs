//! Script events — everything the engine reports about a tick.
//!
//! RULE: Every state change the scripting engine makes is reported as a
//! ScriptEvent. The engine persists them to the event log; variants are
//! only ever appended.

use crate::{
    mission::MissionState,
    types::{Millis, RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id:  RunId,
        mission: String,
    },

    // ── Trigger events ─────────────────────────────
    TriggerFired {
        tick:       Tick,
        event:      String,
        fire_count: u32,
    },
    TriggerImpossible {
        tick:  Tick,
        event: String,
    },

    // ── Action events ──────────────────────────────
    ActionQueued {
        tick:   Tick,
        event:  String,
        action: String,
        due_ms: Millis,
    },
    ActionExecuted {
        tick:   Tick,
        event:  String,
        action: String,
    },
    MessageQueued {
        tick:   Tick,
        text:   String,
        urgent: bool,
    },
    TeamsChanged {
        tick: Tick,
    },

    // ── Mission events ─────────────────────────────
    MissionStateChanged {
        tick: Tick,
        from: MissionState,
        to:   MissionState,
    },
}

impl ScriptEvent {
    /// Stable name used for the event_type column of the event log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }         => "tick_started",
            Self::TickCompleted { .. }       => "tick_completed",
            Self::RunInitialized { .. }      => "run_initialized",
            Self::TriggerFired { .. }        => "trigger_fired",
            Self::TriggerImpossible { .. }   => "trigger_impossible",
            Self::ActionQueued { .. }        => "action_queued",
            Self::ActionExecuted { .. }      => "action_executed",
            Self::MessageQueued { .. }       => "message_queued",
            Self::TeamsChanged { .. }        => "teams_changed",
            Self::MissionStateChanged { .. } => "mission_state_changed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub tick:       Tick,
    pub source:     String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized ScriptEvent
}
