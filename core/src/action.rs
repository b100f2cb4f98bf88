//! Script actions — the effects bound to a trigger.
//!
//! An action runs when its trigger fires: immediately if its delay is
//! zero, otherwise from the mission's delayed-action queue once the delay
//! has elapsed. Mission data selects the variant by its `type` string in
//! `Action::from_descriptor`; unknown types are rejected.
//!
//! Subject-bearing actions re-resolve their subjects on every execution
//! and only touch spacecraft that are still alive.

use crate::{
    battle::{Battlefield, SpacecraftEvent},
    condition::parse_params,
    config::EngineConfig,
    descriptor::ActionDescriptor,
    error::{ScriptError, ScriptResult},
    event::ScriptEvent,
    hud::{HudMessage, HudSink},
    objective::{ObjectiveKind, ObjectiveState},
    subject::{SubjectDescriptor, SubjectGroup},
    trigger::Trigger,
    types::{Millis, SpacecraftHandle, SpacecraftId, Tick},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Mission operations available to an executing action.
///
/// Requests that affect the mission as a whole (outcome, team roster)
/// are recorded here and applied by the mission after the action returns.
pub struct ActionContext<'a> {
    pub tick:          Tick,
    pub world:         &'a mut Battlefield,
    pub hud:           &'a mut dyn HudSink,
    pub config:        &'a EngineConfig,
    pub events:        &'a mut Vec<ScriptEvent>,
    completed:         bool,
    failed:            bool,
    teams_changed:     bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        tick: Tick,
        world: &'a mut Battlefield,
        hud: &'a mut dyn HudSink,
        config: &'a EngineConfig,
        events: &'a mut Vec<ScriptEvent>,
    ) -> Self {
        Self {
            tick,
            world,
            hud,
            config,
            events,
            completed: false,
            failed: false,
            teams_changed: false,
        }
    }

    pub fn complete_mission(&mut self)     { self.completed = true; }
    pub fn fail_mission(&mut self)         { self.failed = true; }
    pub fn handle_teams_changed(&mut self) { self.teams_changed = true; }

    pub fn completion_requested(&self) -> bool { self.completed }
    pub fn failure_requested(&self) -> bool    { self.failed }
    pub fn teams_changed(&self) -> bool        { self.teams_changed }
}

fn require_subjects(kind: &str, subjects: Option<SubjectDescriptor>) -> ScriptResult<SubjectGroup> {
    match subjects {
        Some(d) if !d.is_empty() => Ok(SubjectGroup::new(d)),
        _ => Err(ScriptError::invalid(kind, "at least one spacecraft, squad or team is required")),
    }
}

fn no_subjects(kind: &str, subjects: Option<SubjectDescriptor>) {
    if subjects.is_some_and(|s| !s.is_empty()) {
        log::warn!("{kind} ignores its subjects");
    }
}

/// Fresh resolution limited to spacecraft that are still alive.
fn live_subjects(subjects: &mut SubjectGroup, world: &Battlefield) -> Vec<SpacecraftHandle> {
    subjects.refresh();
    subjects
        .resolve(world)
        .iter()
        .copied()
        .filter(|h| world.get(*h).is_alive())
        .collect()
}

fn check_percent(kind: &str, name: &str, value: Option<f64>) -> ScriptResult<()> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => {
            Err(ScriptError::invalid(kind, format!("{name} {v} is outside [0, 100]")))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

// ── Message ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageParams {
    #[serde(default)]
    pub text:          Option<String>,
    /// Explicit text per language code.
    #[serde(default)]
    pub texts:         Option<HashMap<String, String>>,
    /// String table id; wins over `text` when a translation exists.
    #[serde(default)]
    pub text_id:       Option<String>,
    #[serde(default)]
    pub source:        Option<SpacecraftId>,
    #[serde(default)]
    pub duration:      Option<Millis>,
    #[serde(default)]
    pub typewriter:    bool,
    #[serde(default)]
    pub permanent:     bool,
    #[serde(default)]
    pub urgent:        bool,
    #[serde(default)]
    pub color:         Option<[f32; 4]>,
    #[serde(default)]
    pub silent:        bool,
    #[serde(default)]
    pub no_background: bool,
}

#[derive(Debug, Clone)]
pub struct MessageAction {
    params: MessageParams,
}

impl MessageAction {
    pub fn new(params: MessageParams) -> ScriptResult<Self> {
        let kind = "message action";
        let has_text = params.text.as_deref().is_some_and(|t| !t.is_empty())
            || params.texts.as_ref().is_some_and(|t| !t.is_empty())
            || params.text_id.is_some();
        if !has_text {
            return Err(ScriptError::invalid(kind, "one of text, texts or textId is required"));
        }
        if let Some(color) = params.color {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ScriptError::invalid(kind, "color components must be within [0, 1]"));
            }
        }
        Ok(Self { params })
    }

    /// Translation by id, then the per-language map, then the plain text.
    /// An id with nothing else to fall back on is shown as is.
    pub fn text(&self, config: &EngineConfig) -> String {
        let p = &self.params;
        p.text_id
            .as_deref()
            .and_then(|id| config.strings.get(&config.language, id))
            .map(str::to_string)
            .or_else(|| p.texts.as_ref().and_then(|t| t.get(&config.language)).cloned())
            .or_else(|| p.text.clone().filter(|t| !t.is_empty()))
            .or_else(|| p.texts.as_ref().and_then(|t| t.values().min().cloned()))
            .unwrap_or_else(|| {
                let id = p.text_id.clone().unwrap_or_default();
                log::warn!("no '{}' string for '{id}'", config.language);
                id
            })
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) {
        let p = &self.params;
        let source_name = match &p.source {
            Some(id) => match ctx.world.spacecraft(id).filter(|sc| sc.is_alive()) {
                Some(sc) => Some(sc.display_name().to_string()),
                None => {
                    log::debug!("message source '{id}' is gone, message dropped");
                    return;
                }
            },
            None => None,
        };
        let text = self.text(ctx.config);
        let text = match source_name {
            Some(name) => format!("{name}: {text}"),
            None => text,
        };
        ctx.events.push(ScriptEvent::MessageQueued {
            tick:   ctx.tick,
            text:   text.clone(),
            urgent: p.urgent,
        });
        ctx.hud.queue_message(
            HudMessage {
                text,
                duration:         p.duration,
                appear_animation: p.typewriter,
                permanent:        p.permanent,
                color:            p.color,
                silent:           p.silent,
                no_background:    p.no_background,
                source:           p.source.clone(),
            },
            p.urgent,
        );
    }
}

// ── Command ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CommandAction {
    subjects: SubjectGroup,
    params:   Map<String, Value>,
}

impl CommandAction {
    pub fn new(subjects: SubjectGroup, params: Map<String, Value>) -> ScriptResult<Self> {
        match params.get("command") {
            Some(Value::String(name)) if !name.is_empty() => Ok(Self { subjects, params }),
            _ => Err(ScriptError::invalid("command action", "a command name is required")),
        }
    }

    /// Forwards the payload to every subject, with the first subject as lead.
    fn execute(&mut self, ctx: &mut ActionContext<'_>) {
        let handles = live_subjects(&mut self.subjects, ctx.world);
        let Some(lead) = handles.first().map(|h| ctx.world.get(*h).id().to_string()) else {
            log::debug!("command '{}' has no live subjects", self.params["command"]);
            return;
        };
        for (index, handle) in handles.iter().enumerate() {
            ctx.world.get_mut(*handle).handle_event(SpacecraftEvent::Command {
                params: Value::Object(self.params.clone()),
                lead:   lead.clone(),
                index,
            });
        }
    }
}

// ── Set properties ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetPropertiesParams {
    /// Hull integrity in percent.
    #[serde(default)]
    pub hull:           Option<f64>,
    /// Shield integrity in percent.
    #[serde(default)]
    pub shield:         Option<f64>,
    #[serde(default)]
    pub team:           Option<String>,
    #[serde(default)]
    pub disable_firing: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SetPropertiesAction {
    subjects: SubjectGroup,
    params:   SetPropertiesParams,
}

impl SetPropertiesAction {
    pub fn new(subjects: SubjectGroup, params: SetPropertiesParams) -> ScriptResult<Self> {
        let kind = "setProperties action";
        check_percent(kind, "hull", params.hull)?;
        check_percent(kind, "shield", params.shield)?;
        if params == SetPropertiesParams::default() {
            return Err(ScriptError::invalid(kind, "no property to set"));
        }
        if params.team.as_deref().is_some_and(str::is_empty) {
            return Err(ScriptError::invalid(kind, "team id is empty"));
        }
        Ok(Self { subjects, params })
    }

    fn execute(&mut self, ctx: &mut ActionContext<'_>) {
        let p = &self.params;
        let team = match p.team.as_deref() {
            Some(team) if ctx.world.team(team).is_none() => {
                log::warn!("setProperties: team '{team}' does not exist, team left unchanged");
                None
            }
            other => other,
        };
        let mut moved = false;
        for handle in live_subjects(&mut self.subjects, ctx.world) {
            let sc = ctx.world.get_mut(handle);
            if let Some(hull) = p.hull {
                sc.set_hull_integrity(hull / 100.0);
            }
            if let Some(shield) = p.shield {
                sc.set_shield_integrity(shield / 100.0);
            }
            if let Some(team) = team {
                if sc.team() != Some(team) {
                    sc.set_team(team);
                    moved = true;
                }
            }
            match p.disable_firing {
                Some(true)  => sc.disable_firing(),
                Some(false) => sc.enable_firing(),
                None        => {}
            }
        }
        if moved {
            ctx.handle_teams_changed();
        }
    }
}

// ── Repair / damage ───────────────────────────────────────

/// Hull and shield deltas in percent points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrityDelta {
    #[serde(default)]
    pub hull:   Option<f64>,
    #[serde(default)]
    pub shield: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IntegrityAction {
    subjects: SubjectGroup,
    params:   IntegrityDelta,
    /// +1 repairs, -1 damages.
    sign:     f64,
}

impl IntegrityAction {
    fn new(kind: &str, subjects: SubjectGroup, params: IntegrityDelta, sign: f64) -> ScriptResult<Self> {
        if params.hull.is_none() && params.shield.is_none() {
            return Err(ScriptError::invalid(kind, "hull or shield amount is required"));
        }
        check_percent(kind, "hull", params.hull)?;
        check_percent(kind, "shield", params.shield)?;
        Ok(Self { subjects, params, sign })
    }

    pub fn repair(subjects: SubjectGroup, params: IntegrityDelta) -> ScriptResult<Self> {
        Self::new("repair action", subjects, params, 1.0)
    }

    pub fn damage(subjects: SubjectGroup, params: IntegrityDelta) -> ScriptResult<Self> {
        Self::new("damage action", subjects, params, -1.0)
    }

    fn execute(&mut self, ctx: &mut ActionContext<'_>) {
        for handle in live_subjects(&mut self.subjects, ctx.world) {
            let sc = ctx.world.get_mut(handle);
            if let Some(hull) = self.params.hull {
                sc.set_hull_integrity(sc.hull_integrity() + self.sign * hull / 100.0);
            }
            if let Some(shield) = self.params.shield {
                sc.set_shield_integrity(sc.shield_integrity() + self.sign * shield / 100.0);
            }
        }
    }
}

// ── Action ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum ActionKind {
    Win,
    Lose,
    Message(MessageAction),
    ClearMessages,
    Command(CommandAction),
    SetProperties(SetPropertiesAction),
    Repair(IntegrityAction),
    Damage(IntegrityAction),
    Hud(Map<String, Value>),
}

#[derive(Debug, Clone)]
pub struct Action {
    delay: Millis,
    kind:  ActionKind,
}

impl Action {
    pub fn new(kind: ActionKind, delay: Millis) -> Self {
        Self { delay, kind }
    }

    /// Builds an action from mission data, validating its parameters.
    pub fn from_descriptor(descriptor: ActionDescriptor) -> ScriptResult<Self> {
        let ActionDescriptor { kind, subjects, params, delay } = descriptor;
        let action = match kind.as_str() {
            "win" | "lose" | "clearMessages" => {
                no_subjects(&kind, subjects);
                parse_params::<NoParams>(&kind, params)?;
                match kind.as_str() {
                    "win"  => ActionKind::Win,
                    "lose" => ActionKind::Lose,
                    _      => ActionKind::ClearMessages,
                }
            }
            "message" => {
                no_subjects("message action", subjects);
                ActionKind::Message(MessageAction::new(parse_params("message action", params)?)?)
            }
            "command" => ActionKind::Command(CommandAction::new(
                require_subjects("command action", subjects)?,
                parse_params("command action", params)?,
            )?),
            "setProperties" => ActionKind::SetProperties(SetPropertiesAction::new(
                require_subjects("setProperties action", subjects)?,
                parse_params("setProperties action", params)?,
            )?),
            "repair" => ActionKind::Repair(IntegrityAction::repair(
                require_subjects("repair action", subjects)?,
                parse_params("repair action", params)?,
            )?),
            "damage" => ActionKind::Damage(IntegrityAction::damage(
                require_subjects("damage action", subjects)?,
                parse_params("damage action", params)?,
            )?),
            "hud" => {
                no_subjects("hud action", subjects);
                ActionKind::Hud(parse_params("hud action", params)?)
            }
            _ => {
                log::error!("unknown action type '{kind}'");
                return Err(ScriptError::UnknownActionType(kind));
            }
        };
        Ok(Self::new(action, delay))
    }

    pub fn delay(&self) -> Millis {
        self.delay
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ActionKind::Win              => "win",
            ActionKind::Lose             => "lose",
            ActionKind::Message(_)       => "message",
            ActionKind::ClearMessages    => "clearMessages",
            ActionKind::Command(_)       => "command",
            ActionKind::SetProperties(_) => "setProperties",
            ActionKind::Repair(_)        => "repair",
            ActionKind::Damage(_)        => "damage",
            ActionKind::Hud(_)           => "hud",
        }
    }

    pub fn subjects_mut(&mut self) -> Option<&mut SubjectGroup> {
        match &mut self.kind {
            ActionKind::Command(a)       => Some(&mut a.subjects),
            ActionKind::SetProperties(a) => Some(&mut a.subjects),
            ActionKind::Repair(a) | ActionKind::Damage(a) => Some(&mut a.subjects),
            _ => None,
        }
    }

    pub fn execute(&mut self, ctx: &mut ActionContext<'_>) {
        match &mut self.kind {
            ActionKind::Win              => ctx.complete_mission(),
            ActionKind::Lose             => ctx.fail_mission(),
            ActionKind::Message(a)       => a.execute(ctx),
            ActionKind::ClearMessages    => ctx.hud.clear_messages(),
            ActionKind::Command(a)       => a.execute(ctx),
            ActionKind::SetProperties(a) => a.execute(ctx),
            ActionKind::Repair(a) | ActionKind::Damage(a) => a.execute(ctx),
            ActionKind::Hud(params) => match ctx.world.piloted_mut() {
                Some(sc) => sc.handle_event(SpacecraftEvent::Hud { params: Value::Object(params.clone()) }),
                None => log::debug!("hud action without a piloted spacecraft"),
            },
        }
    }

    // ── Objectives (win / lose only) ──────────────────────

    pub fn objective_kind(&self) -> Option<ObjectiveKind> {
        match self.kind {
            ActionKind::Win  => Some(ObjectiveKind::Win),
            ActionKind::Lose => Some(ObjectiveKind::Lose),
            _ => None,
        }
    }

    pub fn objective_count(&self, trigger: &Trigger) -> usize {
        self.objective_kind().map_or(0, |_| trigger.objective_count())
    }

    pub fn objective_strings(&self, trigger: &Trigger, world: &Battlefield) -> Vec<String> {
        self.objective_kind()
            .map(|kind| trigger.objective_strings(world, kind))
            .unwrap_or_default()
    }

    pub fn objectives_state(
        &self,
        trigger: &Trigger,
        world: &Battlefield,
        mission_ended: bool,
    ) -> Vec<ObjectiveState> {
        self.objective_kind()
            .map(|kind| trigger.objective_states(world, kind, mission_ended))
            .unwrap_or_default()
    }
}
