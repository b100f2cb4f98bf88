use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown condition type '{0}'")]
    UnknownConditionType(String),

    #[error("Unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("Invalid parameters for {kind}: {reason}")]
    InvalidParams { kind: String, reason: String },

    #[error("Event '{name}' not found")]
    UnknownEvent { name: String },

    #[error("Event '{name}' is defined more than once")]
    DuplicateEvent { name: String },

    #[error("Team '{name}' not found")]
    UnknownTeam { name: String },

    #[error("Spacecraft '{id}' is defined more than once")]
    DuplicateSpacecraft { id: String },

    #[error("Objective text unavailable for {condition} condition: {reason}")]
    ObjectiveUnsupported { condition: &'static str, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScriptResult<T> = Result<T, ScriptError>;

impl ScriptError {
    pub(crate) fn invalid(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        let err = Self::InvalidParams { kind: kind.into(), reason: reason.into() };
        log::error!("{err}");
        err
    }
}
