//! Mission clock — fixed-step mission time with pause and time scaling.
//!
//! RULE: Mission time only moves through `advance`. One tick adds
//! `tick_ms * time_scale` to `elapsed_ms`; nothing reads a wall clock.

use crate::types::{Millis, RunId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    pub elapsed_ms:   Millis,
    pub tick_ms:      Millis,
    pub time_scale:   TimeScale,
    pub paused:       bool,
}

impl MissionClock {
    /// A paused clock at tick 0.
    pub fn new(run_id: RunId, tick_ms: Millis) -> Self {
        Self {
            run_id,
            current_tick: 0,
            elapsed_ms: 0,
            tick_ms,
            time_scale: TimeScale::Normal,
            paused: true,
        }
    }

    /// Steps the clock and returns the new tick with the mission time it covers.
    /// Panics when paused.
    pub fn advance(&mut self) -> (Tick, Millis) {
        assert!(!self.paused, "advance() called on paused clock");
        let dt = self.tick_ms * self.time_scale.multiplier();
        self.current_tick += 1;
        self.elapsed_ms += dt;
        (self.current_tick, dt)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_time_scale(&mut self, scale: TimeScale) {
        self.time_scale = scale;
    }
}

/// Mission time per tick, as a multiple of `tick_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    Normal,
    Double,
    Quadruple,
}

impl TimeScale {
    pub fn multiplier(self) -> Millis {
        match self {
            TimeScale::Normal    => 1,
            TimeScale::Double    => 2,
            TimeScale::Quadruple => 4,
        }
    }
}
