//! Triggers — combine conditions into a single fire signal.
//!
//! Every tick all conditions are evaluated (timers accumulate even when
//! an earlier condition already decided the outcome), combined with AND
//! (`all`) or OR (`any`), and the firing policy decides whether this
//! tick fires:
//!
//!   when = becomesTrue   fire on the rising edge of the combination
//!   when = true          fire on every satisfied tick
//!   single = true        fire at most once per mission
//!
//! A trigger without conditions is satisfied from the first tick.
//! Fire handlers are the indices of the actions bound to the trigger,
//! notified in registration order.

use crate::{
    battle::Battlefield,
    condition::{Condition, EvalContext, Which},
    descriptor::TriggerDescriptor,
    error::ScriptResult,
    objective::{ObjectiveKind, ObjectiveState, ObjectiveStatus},
    types::Millis,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerWhen {
    #[default]
    BecomesTrue,
    True,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    conditions:          Vec<Condition>,
    which:               Which,
    when:                TriggerWhen,
    single:              bool,
    handlers:            Vec<usize>,
    fire_count:          u32,
    was_satisfied:       bool,
    impossible_reported: bool,
}

impl Trigger {
    pub fn new(conditions: Vec<Condition>, which: Which, when: TriggerWhen, single: bool) -> Self {
        Self {
            conditions,
            which,
            when,
            single,
            handlers: Vec::new(),
            fire_count: 0,
            was_satisfied: false,
            impossible_reported: false,
        }
    }

    pub fn from_descriptor(descriptor: TriggerDescriptor) -> ScriptResult<Self> {
        let conditions = descriptor
            .conditions
            .into_iter()
            .map(Condition::from_descriptor)
            .collect::<ScriptResult<Vec<_>>>()?;
        Ok(Self::new(conditions, descriptor.which, descriptor.when, descriptor.single))
    }

    pub fn add_fire_handler(&mut self, action_index: usize) {
        self.handlers.push(action_index);
    }

    pub fn fire_handlers(&self) -> &[usize] {
        &self.handlers
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub fn has_fired(&self) -> bool {
        self.fire_count > 0
    }

    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Evaluates the conditions for this tick. Returns true if the
    /// trigger fires, in which case every fire handler must be notified.
    pub fn tick(&mut self, ctx: &EvalContext<'_>, dt: Millis) -> bool {
        if self.single && self.has_fired() {
            return false;
        }

        let results: Vec<bool> = self
            .conditions
            .iter_mut()
            .map(|c| c.is_satisfied(ctx, dt))
            .collect();
        let satisfied = results.is_empty() || self.which.scan(results);

        let fire = match self.when {
            TriggerWhen::BecomesTrue => satisfied && !self.was_satisfied,
            TriggerWhen::True        => satisfied,
        };
        self.was_satisfied = satisfied;
        if fire {
            self.fire_count += 1;
        }
        fire
    }

    pub fn can_be_impossible(&self) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.which {
            Which::All => self.conditions.iter().any(Condition::can_be_impossible),
            Which::Any => self.conditions.iter().all(Condition::can_be_impossible),
        }
    }

    /// Whether the trigger can no longer fire. A single trigger that has
    /// already fired is done, not impossible.
    pub fn is_impossible(&self) -> bool {
        if self.conditions.is_empty() || (self.single && self.has_fired()) {
            return false;
        }
        match self.which {
            Which::All => self.conditions.iter().any(Condition::is_impossible),
            Which::Any => self.conditions.iter().all(Condition::is_impossible),
        }
    }

    /// True exactly once, on the first call after the trigger became impossible.
    pub fn take_newly_impossible(&mut self) -> bool {
        if !self.impossible_reported && self.is_impossible() {
            self.impossible_reported = true;
            return true;
        }
        false
    }

    pub fn objective_count(&self) -> usize {
        self.conditions.len()
    }

    /// Objective lines, one per condition. Conditions without objective
    /// text are logged and left out.
    pub fn objective_strings(&self, world: &Battlefield, kind: ObjectiveKind) -> Vec<String> {
        self.conditions
            .iter()
            .filter_map(|c| match c.objective_string(world, kind) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::error!("{e}");
                    None
                }
            })
            .collect()
    }

    pub fn objective_states(
        &self,
        world: &Battlefield,
        kind: ObjectiveKind,
        mission_ended: bool,
    ) -> Vec<ObjectiveState> {
        let status = ObjectiveStatus::derive(kind, self.has_fired(), self.is_impossible(), mission_ended);
        self.conditions
            .iter()
            .filter_map(|c| match c.objective_state_string(world, kind) {
                Ok(text) => Some(ObjectiveState {
                    kind,
                    text,
                    status,
                    active: c.is_active(),
                }),
                Err(e) => {
                    log::error!("{e}");
                    None
                }
            })
            .collect()
    }
}
