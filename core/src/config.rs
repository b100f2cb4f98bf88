use crate::{strings::StringTable, types::{Millis, Tick}};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Message timing for the headless HUD queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudConfig {
    pub message_base_ms:     Millis,
    pub message_per_char_ms: Millis,
    pub message_max_ms:      Millis,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            message_base_ms:     1_500,
            message_per_char_ms: 60,
            message_max_ms:      10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simulated milliseconds per tick at normal speed.
    pub tick_ms:           Millis,
    /// Language used to pick translated message texts.
    pub language:          String,
    /// Abort mission loading on the first invalid event instead of skipping it.
    #[serde(default)]
    pub strict_loading:    bool,
    /// Snapshot the mission every N ticks; 0 disables snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: Tick,
    #[serde(default)]
    pub hud:               HudConfig,
    #[serde(default)]
    pub strings:           StringTable,
}

fn default_snapshot_interval() -> Tick { 600 }

impl EngineConfig {
    /// Reads `engine.json` from `data_dir`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine.json");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {path}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {path}"))?;
        anyhow::ensure!(config.tick_ms > 0, "{path}: tick_ms must be positive");
        Ok(config)
    }

    /// Fixed configuration for tests: 100 ms ticks, English, lenient loading.
    pub fn default_test() -> Self {
        let mut strings = StringTable::new();
        strings.insert("en", "mission.intro", "All wings, report in.");
        strings.insert("hu", "mission.intro", "Minden egység jelentkezzen.");
        Self {
            tick_ms:           100,
            language:          "en".into(),
            strict_loading:    false,
            snapshot_interval: 10,
            hud:               HudConfig::default(),
            strings,
        }
    }
}
