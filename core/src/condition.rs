//! Mission conditions — predicates over subject groups, re-evaluated
//! every tick by their trigger.
//!
//! Variants are a closed set. Mission data selects one by its `type`
//! string in `Condition::from_descriptor`; unknown types are rejected
//! at load time rather than producing an inert condition.

use crate::{
    battle::{Battlefield, Spacecraft},
    descriptor::ConditionDescriptor,
    error::{ScriptError, ScriptResult},
    objective::ObjectiveKind,
    strings::capitalize,
    subject::{SubjectDescriptor, SubjectGroup},
    timer::TimeCondition,
    types::Millis,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// What a condition may look at while it is evaluated.
pub struct EvalContext<'a> {
    pub world:        &'a Battlefield,
    /// Names of events whose trigger has fired at least once.
    pub fired_events: &'a HashSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Which {
    #[default]
    All,
    Any,
}

impl Which {
    /// Short-circuit scan: `All` fails on the first subject that does not
    /// match, `Any` succeeds on the first one that does. An empty scan is
    /// true for `All` and false for `Any`.
    pub fn scan<I: IntoIterator<Item = bool>>(self, matches: I) -> bool {
        let mut matches = matches.into_iter();
        match self {
            Which::All => matches.all(|m| m),
            Which::Any => matches.any(|m| m),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Below,
    Above,
    Equals,
}

impl Relation {
    pub fn holds(self, value: usize, target: usize) -> bool {
        match self {
            Relation::Below  => value < target,
            Relation::Above  => value > target,
            Relation::Equals => value == target,
        }
    }
}

/// Deserializes a parameter bundle; an absent bundle is read as `{}` so
/// defaults apply and required fields are still reported.
pub(crate) fn parse_params<T: DeserializeOwned>(kind: &str, params: Option<Value>) -> ScriptResult<T> {
    let value = params.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| ScriptError::invalid(kind, e.to_string()))
}

fn require_subjects(kind: &str, subjects: Option<SubjectDescriptor>) -> ScriptResult<SubjectGroup> {
    match subjects {
        Some(d) if !d.is_empty() => Ok(SubjectGroup::new(d)),
        _ => Err(ScriptError::invalid(kind, "at least one spacecraft, squad or team is required")),
    }
}

fn resolved<'w>(subjects: &mut SubjectGroup, world: &'w Battlefield) -> Vec<&'w Spacecraft> {
    subjects.resolve(world).iter().map(|h| world.get(*h)).collect()
}

// ── Destroyed ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestroyedParams {
    #[serde(default)]
    pub which: Which,
}

#[derive(Debug, Clone)]
pub struct DestroyedCondition {
    subjects: SubjectGroup,
    params:   DestroyedParams,
}

impl DestroyedCondition {
    pub fn new(subjects: SubjectGroup, params: DestroyedParams) -> Self {
        Self { subjects, params }
    }

    pub fn is_satisfied(&mut self, world: &Battlefield) -> bool {
        let which = self.params.which;
        which.scan(resolved(&mut self.subjects, world).into_iter().map(|sc| !sc.is_alive()))
    }

    fn objective_string(&self, world: &Battlefield, kind: ObjectiveKind) -> String {
        let subjects = self.subjects.describe(world);
        match (kind, self.params.which) {
            (ObjectiveKind::Win, Which::All) => format!("Destroy {subjects}"),
            (ObjectiveKind::Win, Which::Any) => format!("Destroy any of {subjects}"),
            (ObjectiveKind::Lose, Which::All) if self.subjects.is_multi() => {
                format!("Keep at least one of {subjects} alive")
            }
            (ObjectiveKind::Lose, _) => format!("{} must survive", capitalize(&subjects)),
        }
    }

    fn progress(&self, world: &Battlefield) -> String {
        let total = self.subjects.cached().len();
        format!("({}/{total})", self.subjects.live_count(world, false))
    }
}

// ── Count ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountParams {
    pub count:    usize,
    pub relation: Relation,
}

#[derive(Debug, Clone)]
pub struct CountCondition {
    subjects: SubjectGroup,
    params:   CountParams,
}

impl CountCondition {
    pub fn new(subjects: SubjectGroup, params: CountParams) -> Self {
        Self { subjects, params }
    }

    pub fn is_satisfied(&mut self, world: &Battlefield) -> bool {
        let alive = resolved(&mut self.subjects, world)
            .into_iter()
            .filter(|sc| sc.is_alive())
            .count();
        self.params.relation.holds(alive, self.params.count)
    }

    fn objective_string(&self, world: &Battlefield, kind: ObjectiveKind) -> ScriptResult<String> {
        if self.params.relation != Relation::Below {
            return Err(ScriptError::ObjectiveUnsupported {
                condition: "count",
                reason:    format!("relation {:?} has no objective text", self.params.relation),
            });
        }
        let subjects = self.subjects.describe(world);
        let count = self.params.count;
        Ok(match kind {
            ObjectiveKind::Win  => format!("Reduce {subjects} to fewer than {count}"),
            ObjectiveKind::Lose => format!("Keep at least {count} of {subjects} alive"),
        })
    }

    fn progress(&self, world: &Battlefield) -> String {
        let total = self.subjects.cached().len();
        format!("({}/{total})", self.subjects.live_count(world, false))
    }
}

// ── Hull integrity ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HullIntegrityParams {
    #[serde(default)]
    pub which:         Which,
    #[serde(default)]
    pub min_integrity: Option<f64>,
    #[serde(default)]
    pub max_integrity: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HullIntegrityCondition {
    subjects: SubjectGroup,
    params:   HullIntegrityParams,
}

impl HullIntegrityCondition {
    pub fn new(subjects: SubjectGroup, params: HullIntegrityParams) -> ScriptResult<Self> {
        Self::check_params(&params)?;
        Ok(Self { subjects, params })
    }

    fn check_params(params: &HullIntegrityParams) -> ScriptResult<()> {
        let kind = "hull integrity condition";
        for (name, bound) in [("minIntegrity", params.min_integrity), ("maxIntegrity", params.max_integrity)] {
            if let Some(value) = bound {
                if !(0.0..=100.0).contains(&value) {
                    return Err(ScriptError::invalid(kind, format!("{name} {value} is outside [0, 100]")));
                }
            }
        }
        match (params.min_integrity, params.max_integrity) {
            (None, None) => Err(ScriptError::invalid(kind, "minIntegrity or maxIntegrity is required")),
            (Some(min), Some(max)) if min > max => {
                Err(ScriptError::invalid(kind, format!("minIntegrity {min} exceeds maxIntegrity {max}")))
            }
            _ => Ok(()),
        }
    }

    /// Whether a subject is outside the configured bounds. Unset bounds never trigger.
    fn out_of_range(&self, spacecraft: &Spacecraft) -> bool {
        let hull = spacecraft.hull_integrity() * 100.0;
        self.params.min_integrity.is_some_and(|min| hull < min)
            || self.params.max_integrity.is_some_and(|max| hull > max)
    }

    /// Scans live subjects: `all` holds unless one is out of range,
    /// `any` holds once one is in range.
    pub fn is_satisfied(&mut self, world: &Battlefield) -> bool {
        let live: Vec<&Spacecraft> = resolved(&mut self.subjects, world)
            .into_iter()
            .filter(|sc| sc.is_alive())
            .collect();
        self.params.which.scan(live.into_iter().map(|sc| !self.out_of_range(sc)))
    }

    fn objective_string(&self, world: &Battlefield, kind: ObjectiveKind) -> String {
        let subjects = self.subjects.describe(world);
        match (kind, self.params.min_integrity, self.params.max_integrity) {
            (_, Some(min), Some(max)) => format!("Bring hull of {subjects} between {min:.0}% and {max:.0}%"),
            (ObjectiveKind::Win, None, Some(max))  => format!("Reduce hull of {subjects} below {max:.0}%"),
            (ObjectiveKind::Win, Some(min), None)  => format!("Repair hull of {subjects} above {min:.0}%"),
            (ObjectiveKind::Lose, None, Some(max)) => format!("Keep hull of {subjects} above {max:.0}%"),
            (ObjectiveKind::Lose, Some(min), None) => format!("Keep hull of {subjects} below {min:.0}%"),
            (_, None, None) => format!("Watch hull of {subjects}"),
        }
    }

    fn progress(&self, world: &Battlefield) -> String {
        let hull = if self.params.max_integrity.is_some() {
            self.subjects.min_hull_integrity(world, false)
        } else {
            self.subjects.max_hull_integrity(world, false)
        };
        format!("({hull:.0}%)")
    }
}

// ── Condition ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Condition {
    Destroyed(DestroyedCondition),
    Count(CountCondition),
    Time(TimeCondition),
    HullIntegrity(HullIntegrityCondition),
}

impl Condition {
    /// Builds a condition from mission data, validating its parameters.
    pub fn from_descriptor(descriptor: ConditionDescriptor) -> ScriptResult<Self> {
        let ConditionDescriptor { kind, subjects, params } = descriptor;
        match kind.as_str() {
            "destroyed" => Ok(Self::Destroyed(DestroyedCondition::new(
                require_subjects("destroyed condition", subjects)?,
                parse_params("destroyed condition", params)?,
            ))),
            "count" => Ok(Self::Count(CountCondition::new(
                require_subjects("count condition", subjects)?,
                parse_params("count condition", params)?,
            ))),
            "time" => {
                if subjects.is_some_and(|s| !s.is_empty()) {
                    log::warn!("time condition ignores its subjects");
                }
                Ok(Self::Time(TimeCondition::from_value(params)?))
            }
            "hullIntegrity" => Ok(Self::HullIntegrity(HullIntegrityCondition::new(
                require_subjects("hull integrity condition", subjects)?,
                parse_params("hull integrity condition", params)?,
            )?)),
            _ => {
                log::error!("unknown condition type '{kind}'");
                Err(ScriptError::UnknownConditionType(kind))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Destroyed(_)     => "destroyed",
            Self::Count(_)         => "count",
            Self::Time(_)          => "time",
            Self::HullIntegrity(_) => "hullIntegrity",
        }
    }

    pub fn is_satisfied(&mut self, ctx: &EvalContext<'_>, dt: Millis) -> bool {
        match self {
            Self::Destroyed(c)     => c.is_satisfied(ctx.world),
            Self::Count(c)         => c.is_satisfied(ctx.world),
            Self::Time(c)          => c.is_satisfied(ctx, dt),
            Self::HullIntegrity(c) => c.is_satisfied(ctx.world),
        }
    }

    pub fn can_be_impossible(&self) -> bool {
        match self {
            Self::Time(c) => c.can_be_impossible(),
            _ => false,
        }
    }

    pub fn is_impossible(&self) -> bool {
        match self {
            Self::Time(c) => c.is_impossible(),
            _ => false,
        }
    }

    /// Whether the objective built from this condition is live.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Time(c) => c.is_active(),
            _ => true,
        }
    }

    pub fn can_change_multiple_times(&self) -> bool {
        matches!(self, Self::HullIntegrity(_))
    }

    pub fn subjects(&self) -> Option<&SubjectGroup> {
        match self {
            Self::Destroyed(c)     => Some(&c.subjects),
            Self::Count(c)         => Some(&c.subjects),
            Self::HullIntegrity(c) => Some(&c.subjects),
            Self::Time(_)          => None,
        }
    }

    pub fn subjects_mut(&mut self) -> Option<&mut SubjectGroup> {
        match self {
            Self::Destroyed(c)     => Some(&mut c.subjects),
            Self::Count(c)         => Some(&mut c.subjects),
            Self::HullIntegrity(c) => Some(&mut c.subjects),
            Self::Time(_)          => None,
        }
    }

    /// Player-facing objective text.
    pub fn objective_string(&self, world: &Battlefield, kind: ObjectiveKind) -> ScriptResult<String> {
        match self {
            Self::Destroyed(c)     => Ok(c.objective_string(world, kind)),
            Self::Count(c)         => c.objective_string(world, kind),
            Self::Time(c)          => c.objective_string(kind),
            Self::HullIntegrity(c) => Ok(c.objective_string(world, kind)),
        }
    }

    /// Objective text with live progress, read from the locked subject cache.
    pub fn objective_state_string(&self, world: &Battlefield, kind: ObjectiveKind) -> ScriptResult<String> {
        let text = self.objective_string(world, kind)?;
        Ok(match self {
            Self::Destroyed(c)     => format!("{text} {}", c.progress(world)),
            Self::Count(c)         => format!("{text} {}", c.progress(world)),
            Self::HullIntegrity(c) => format!("{text} {}", c.progress(world)),
            Self::Time(c)          => return c.objective_state_string(kind),
        })
    }
}
