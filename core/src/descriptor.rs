//! Mission data as authored in JSON.
//!
//! These types only describe shape. Semantic validation (parameter
//! bundles, event references, team references) happens when the mission
//! is built from them, see `Mission::from_descriptor`.

use crate::{subject::SubjectDescriptor, condition::Which, trigger::TriggerWhen, types::Millis};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDescriptor {
    #[serde(default)]
    pub name:        Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub teams:       Vec<TeamDescriptor>,
    #[serde(default)]
    pub spacecrafts: Vec<SpacecraftDescriptor>,
    #[serde(default)]
    pub events:      Vec<EventDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDescriptor {
    pub id:   String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacecraftDescriptor {
    pub id:      String,
    #[serde(default)]
    pub name:    Option<String>,
    #[serde(default)]
    pub squad:   Option<String>,
    #[serde(default)]
    pub team:    Option<String>,
    #[serde(default = "full")]
    pub hull:    f64,
    #[serde(default = "full")]
    pub shield:  f64,
    #[serde(default)]
    pub piloted: bool,
    #[serde(default)]
    pub away:    bool,
}

fn full() -> f64 { 1.0 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDescriptor {
    #[serde(default)]
    pub name:    Option<String>,
    #[serde(default)]
    pub trigger: TriggerDescriptor,
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    #[serde(default)]
    pub conditions: Vec<ConditionDescriptor>,
    #[serde(default)]
    pub which:      Which,
    #[serde(default)]
    pub when:       TriggerWhen,
    #[serde(default = "single_by_default")]
    pub single:     bool,
}

fn single_by_default() -> bool { true }

impl Default for TriggerDescriptor {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            which:      Which::All,
            when:       TriggerWhen::BecomesTrue,
            single:     true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDescriptor {
    #[serde(rename = "type")]
    pub kind:     String,
    #[serde(default)]
    pub subjects: Option<SubjectDescriptor>,
    #[serde(default)]
    pub params:   Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind:     String,
    #[serde(default)]
    pub subjects: Option<SubjectDescriptor>,
    #[serde(default)]
    pub params:   Option<Value>,
    #[serde(default)]
    pub delay:    Millis,
}

impl MissionDescriptor {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parse mission descriptor")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read mission file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("in {}", path.display()))
    }
}
