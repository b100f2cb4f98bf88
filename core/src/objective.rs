//! Mission objectives as shown on the objectives panel.

use serde::{Deserialize, Serialize};

/// Whether an objective comes from a win or a lose action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    Win,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveState {
    pub kind:   ObjectiveKind,
    pub text:   String,
    pub status: ObjectiveStatus,
    /// False while the underlying condition is not live (e.g. a timer
    /// that has not started or has run out).
    pub active: bool,
}

impl ObjectiveStatus {
    /// Derives the status of one objective from its trigger's state.
    ///
    /// A win objective completes when its trigger fires and fails when it
    /// can no longer fire or the mission ended without it. A lose
    /// objective is the mirror image.
    pub fn derive(kind: ObjectiveKind, fired: bool, impossible: bool, mission_ended: bool) -> Self {
        match kind {
            ObjectiveKind::Win if fired => Self::Completed,
            ObjectiveKind::Win if impossible || mission_ended => Self::Failed,
            ObjectiveKind::Lose if fired => Self::Failed,
            ObjectiveKind::Lose if impossible || mission_ended => Self::Completed,
            _ => Self::InProgress,
        }
    }
}
