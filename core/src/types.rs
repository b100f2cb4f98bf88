//! Shared primitive types used across the scripting engine.

/// A simulation tick. One tick advances mission time by the configured `tick_ms`.
pub type Tick = u64;

/// Simulation time in milliseconds. All timers and delays use this unit.
pub type Millis = u64;

/// Mission-data identifier of a spacecraft.
pub type SpacecraftId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Stable index of a spacecraft inside the battlefield arena.
///
/// Handles stay valid for the whole mission: spacecraft are never
/// dropped from the arena, only flagged as removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpacecraftHandle(pub usize);
