//! Snapshot serialization — mission progress to JSON.
//!
//! Taken every `snapshot_interval` ticks. Captures what the objectives
//! panel and replay tooling need: mission state, clock and objectives.

use crate::{
    clock::MissionClock,
    mission::MissionState,
    objective::ObjectiveState,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSnapshot {
    pub run_id:          RunId,
    pub tick:            Tick,
    pub clock:           MissionClock,
    pub state:           MissionState,
    pub pending_actions: usize,
    pub objectives:      Vec<ObjectiveState>,
}
