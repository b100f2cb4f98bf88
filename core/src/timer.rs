//! Time condition — the only condition with evaluation state.
//!
//! The timer runs from mission start, or from the first firing of the
//! event named by `start`. Each running tick adds `dt` to the elapsed
//! accumulator, then the `when` mode decides:
//!
//!   before / within  satisfied while elapsed < time, impossible after
//!   after            satisfied once elapsed > time, forever
//!   once             satisfied on the first tick elapsed >= time, then impossible
//!   repeat           satisfied on ticks completing at least one period;
//!                    impossible after `maxCount` periods
//!
//! `before` is also satisfied while the timer waits for its start event.

use crate::{
    condition::{parse_params, EvalContext},
    error::{ScriptError, ScriptResult},
    objective::ObjectiveKind,
    strings::format_time,
    types::Millis,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWhen {
    Before,
    After,
    Within,
    Once,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeParams {
    pub time:        Millis,
    pub when:        TimeWhen,
    #[serde(default)]
    pub start:       Option<String>,
    #[serde(default)]
    pub max_count:   Option<u32>,
    #[serde(default)]
    pub start_value: Option<Millis>,
}

#[derive(Debug, Clone)]
pub struct TimeCondition {
    params:     TimeParams,
    elapsed:    Millis,
    running:    bool,
    count:      u32,
    impossible: bool,
}

impl TimeCondition {
    pub fn new(params: TimeParams) -> ScriptResult<Self> {
        Self::check_params(&params)?;
        Ok(Self {
            elapsed:    params.start_value.unwrap_or(0),
            running:    params.start.is_none(),
            count:      0,
            impossible: false,
            params,
        })
    }

    pub(crate) fn from_value(params: Option<Value>) -> ScriptResult<Self> {
        Self::new(parse_params("time condition", params)?)
    }

    fn check_params(params: &TimeParams) -> ScriptResult<()> {
        let kind = "time condition";
        if params.when != TimeWhen::Repeat {
            if params.max_count.is_some() {
                return Err(ScriptError::invalid(kind, "maxCount is only valid with 'repeat'"));
            }
            if params.start_value.is_some() {
                return Err(ScriptError::invalid(kind, "startValue is only valid with 'repeat'"));
            }
        } else {
            if params.time == 0 {
                return Err(ScriptError::invalid(kind, "a repeating timer needs a positive time"));
            }
            if params.max_count == Some(0) {
                return Err(ScriptError::invalid(kind, "maxCount must be at least 1"));
            }
        }
        if params.start.as_deref().is_some_and(str::is_empty) {
            return Err(ScriptError::invalid(kind, "start event name is empty"));
        }
        Ok(())
    }

    pub fn params(&self) -> &TimeParams {
        &self.params
    }

    pub fn elapsed(&self) -> Millis {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Completed periods of a repeating timer.
    pub fn fire_count(&self) -> u32 {
        self.count
    }

    pub fn is_satisfied(&mut self, ctx: &EvalContext<'_>, dt: Millis) -> bool {
        if !self.running && !self.impossible {
            if let Some(start) = &self.params.start {
                if ctx.fired_events.contains(start) {
                    log::debug!("timer started by event '{start}'");
                    self.running = true;
                }
            }
        }

        if !self.running {
            return self.params.when == TimeWhen::Before && !self.impossible;
        }

        self.elapsed += dt;
        let time = self.params.time;
        match self.params.when {
            TimeWhen::Before | TimeWhen::Within => {
                if self.elapsed < time {
                    true
                } else {
                    self.stop();
                    false
                }
            }
            TimeWhen::After => self.elapsed > time,
            TimeWhen::Once => {
                if self.elapsed >= time {
                    self.stop();
                    true
                } else {
                    false
                }
            }
            TimeWhen::Repeat => {
                let mut fired = false;
                while self.elapsed >= time {
                    self.elapsed -= time;
                    self.count += 1;
                    fired = true;
                    if self.params.max_count.is_some_and(|max| self.count >= max) {
                        self.stop();
                        break;
                    }
                }
                fired
            }
        }
    }

    fn stop(&mut self) {
        self.running = false;
        self.impossible = true;
    }

    pub fn can_be_impossible(&self) -> bool {
        match self.params.when {
            TimeWhen::Before | TimeWhen::Within | TimeWhen::Once => true,
            TimeWhen::Repeat => self.params.max_count.is_some(),
            TimeWhen::After => false,
        }
    }

    pub fn is_impossible(&self) -> bool {
        self.impossible
    }

    pub fn is_active(&self) -> bool {
        self.running && self.elapsed < self.params.time
    }

    fn remaining(&self) -> Millis {
        self.params.time.saturating_sub(self.elapsed)
    }

    pub fn objective_string(&self, kind: ObjectiveKind) -> ScriptResult<String> {
        let time = format_time(self.params.time);
        match (self.params.when, kind) {
            (TimeWhen::Before | TimeWhen::Within, ObjectiveKind::Win)  => Ok(format!("Complete within {time}")),
            (TimeWhen::Before | TimeWhen::Within, ObjectiveKind::Lose) => Ok(format!("Hold out for {time}")),
            (TimeWhen::After, ObjectiveKind::Win)  => Ok(format!("Survive for {time}")),
            (TimeWhen::After, ObjectiveKind::Lose) => Ok(format!("Time limit: {time}")),
            (when, _) => Err(ScriptError::ObjectiveUnsupported {
                condition: "time",
                reason:    format!("'{when:?}' timers have no objective text"),
            }),
        }
    }

    pub fn objective_state_string(&self, kind: ObjectiveKind) -> ScriptResult<String> {
        let text = self.objective_string(kind)?;
        if self.is_active() {
            Ok(format!("{text} ({})", format_time(self.remaining())))
        } else {
            Ok(text)
        }
    }
}
