//! Mission flow tests — end-to-end scenarios over several ticks.
//!
//! Tests cover: win/lose outcomes, delayed actions, same-tick cascades,
//! timer start binding, defeat, team changes, spawning and objectives.

use armada_script::{
    battle::Spacecraft,
    config::EngineConfig,
    descriptor::MissionDescriptor,
    event::ScriptEvent,
    hud::MessageQueue,
    mission::{Mission, MissionState},
    objective::{ObjectiveKind, ObjectiveStatus},
};
use serde_json::{json, Value};

const DT: u64 = 100;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mission(events: Value) -> Mission {
    init_logger();
    let descriptor: MissionDescriptor = serde_json::from_value(json!({
        "name": "Convoy",
        "teams": [
            { "id": "alliance", "name": "Alliance" },
            { "id": "pirates",  "name": "Pirates" },
            { "id": "rebels",   "name": "Rebels" }
        ],
        "spacecrafts": [
            { "id": "player", "name": "Lead",     "team": "alliance", "piloted": true },
            { "id": "a1",     "name": "Alpha 1",  "squad": "alpha",   "team": "alliance" },
            { "id": "a2",     "name": "Alpha 2",  "squad": "alpha",   "team": "alliance" },
            { "id": "hauler", "name": "Hauler",                       "team": "alliance" },
            { "id": "p1",     "name": "Raider 1", "squad": "raiders", "team": "pirates" },
            { "id": "p2",     "name": "Raider 2", "squad": "raiders", "team": "pirates" },
            { "id": "b1",     "name": "Beta 1",                       "team": "rebels" }
        ],
        "events": events
    }))
    .unwrap();
    Mission::from_descriptor(descriptor, EngineConfig::default_test()).unwrap()
}

fn ticks(m: &mut Mission, n: u64) -> Vec<ScriptEvent> {
    (0..n).flat_map(|_| m.tick(DT)).collect()
}

fn fired(events: &[ScriptEvent], name: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ScriptEvent::TriggerFired { event, .. } if event == name))
        .count()
}

fn state_changes(events: &[ScriptEvent]) -> Vec<(MissionState, MissionState)> {
    events
        .iter()
        .filter_map(|e| match e {
            ScriptEvent::MissionStateChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn hud_texts(m: &Mission) -> Vec<String> {
    m.hud_as::<MessageQueue>()
        .unwrap()
        .messages()
        .map(|msg| msg.text.clone())
        .collect()
}

// ── Outcomes ──────────────────────────────────────────────

#[test]
fn destroying_every_raider_wins_once() {
    let mut m = mission(json!([{
        "name": "victory",
        "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "teams": ["pirates"] } }] },
        "actions": [{ "type": "win" }]
    }]));
    assert_eq!(m.state(), MissionState::InProgress);

    let mut log = ticks(&mut m, 10);
    m.world_mut().destroy("p1");
    log.extend(ticks(&mut m, 10));
    assert_eq!(m.state(), MissionState::InProgress);

    m.world_mut().destroy("p2");
    log.extend(ticks(&mut m, 50));

    assert_eq!(m.state(), MissionState::Completed);
    assert_eq!(fired(&log, "victory"), 1);
    assert_eq!(state_changes(&log), vec![(MissionState::InProgress, MissionState::Completed)]);
}

#[test]
fn delayed_lose_runs_two_seconds_after_the_squad_falls() {
    let mut m = mission(json!([{
        "name": "alpha-down",
        "trigger": {
            "conditions": [{
                "type": "count",
                "subjects": { "squads": ["alpha"] },
                "params": { "count": 1, "relation": "below" }
            }]
        },
        "actions": [{ "type": "lose", "delay": 2000 }]
    }]));

    ticks(&mut m, 99);
    m.world_mut().destroy("a1");
    m.world_mut().destroy("a2");

    // Tick 100 brings mission time to 10 s.
    let log = m.tick(DT);
    assert_eq!(m.elapsed(), 10_000);
    assert_eq!(fired(&log, "alpha-down"), 1);
    assert!(log.iter().any(|e| matches!(e, ScriptEvent::ActionQueued { due_ms: 12_000, .. })));
    assert_eq!(m.pending_actions(), 1);

    ticks(&mut m, 19);
    assert_eq!(m.elapsed(), 11_900);
    assert_eq!(m.state(), MissionState::InProgress);

    let log = m.tick(DT);
    assert_eq!(m.state(), MissionState::Failed);
    assert_eq!(m.pending_actions(), 0);
    assert!(log.iter().any(|e| matches!(e, ScriptEvent::ActionExecuted { action, .. } if action == "lose")));
}

#[test]
fn first_outcome_sticks() {
    let mut m = mission(json!([
        { "name": "win-now",  "actions": [{ "type": "win" }] },
        { "name": "lose-now", "actions": [{ "type": "lose" }] }
    ]));
    let log = ticks(&mut m, 3);
    assert_eq!(m.state(), MissionState::Completed);
    assert_eq!(state_changes(&log).len(), 1);
}

#[test]
fn losing_the_piloted_spacecraft_is_defeat() {
    let mut m = mission(json!([{
        "name": "victory",
        "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "teams": ["pirates"] } }] },
        "actions": [{ "type": "win" }]
    }]));
    ticks(&mut m, 5);
    m.world_mut().destroy("player");
    ticks(&mut m, 1);
    assert_eq!(m.state(), MissionState::Defeat);

    m.world_mut().destroy("p1");
    m.world_mut().destroy("p2");
    ticks(&mut m, 5);
    assert_eq!(m.state(), MissionState::Defeat, "no win after defeat");
}

#[test]
fn free_play_ends_when_the_pilot_dies() {
    let mut m = mission(json!([{ "name": "hello", "actions": [{ "type": "message", "params": { "text": "hi" } }] }]));
    assert_eq!(m.state(), MissionState::None);
    assert_eq!(m.objective_count(), 0);

    ticks(&mut m, 3);
    m.world_mut().destroy("player");
    let log = ticks(&mut m, 1);
    assert_eq!(m.state(), MissionState::Ended);
    assert_eq!(state_changes(&log), vec![(MissionState::None, MissionState::Ended)]);
}

// ── Ordering ──────────────────────────────────────────────

#[test]
fn later_events_see_earlier_effects_in_the_same_tick() {
    let cripple = json!({
        "name": "cripple",
        "actions": [{ "type": "setProperties", "subjects": { "spacecrafts": ["a1"] }, "params": { "hull": 10 } }]
    });
    let warn = json!({
        "name": "warn",
        "trigger": {
            "conditions": [{
                "type": "hullIntegrity",
                "subjects": { "spacecrafts": ["a1"] },
                "params": { "maxIntegrity": 20 }
            }]
        },
        "actions": [{ "type": "message", "params": { "text": "Alpha 1 is crippled" } }]
    });

    let mut forward = mission(json!([cripple.clone(), warn.clone()]));
    let log = forward.tick(DT);
    assert_eq!(fired(&log, "warn"), 1, "cascade within one tick");

    let mut backward = mission(json!([warn, cripple]));
    let first = backward.tick(DT);
    let second = backward.tick(DT);
    assert_eq!(fired(&first, "warn"), 0);
    assert_eq!(fired(&second, "warn"), 1, "one hop per tick");
}

#[test]
fn timer_starts_when_its_event_fires() {
    let mut m = mission(json!([
        {
            "name": "alarm",
            "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "spacecrafts": ["b1"] } }] },
            "actions": [{ "type": "message", "params": { "text": "They found us!" } }]
        },
        {
            "name": "deadline",
            "trigger": { "conditions": [{ "type": "time", "params": { "time": 1000, "when": "after", "start": "alarm" } }] },
            "actions": [{ "type": "lose" }]
        }
    ]));

    ticks(&mut m, 50);
    assert_eq!(m.state(), MissionState::InProgress);

    m.world_mut().destroy("b1");
    // Starts in the same tick the alarm fires, then needs more than 1000 ms.
    ticks(&mut m, 10);
    assert_eq!(m.state(), MissionState::InProgress);
    ticks(&mut m, 1);
    assert_eq!(m.state(), MissionState::Failed);
    assert_eq!(hud_texts(&m), vec!["They found us!"]);
}

#[test]
fn repeating_events_queue_one_execution_per_firing() {
    let mut m = mission(json!([{
        "name": "beacon",
        "trigger": {
            "conditions": [{ "type": "time", "params": { "time": 1000, "when": "repeat", "maxCount": 3 } }],
            "single": false
        },
        "actions": [{ "type": "message", "params": { "text": "ping" }, "delay": 1500 }]
    }]));

    ticks(&mut m, 20);
    assert_eq!(m.pending_actions(), 2);
    assert!(hud_texts(&m).is_empty());

    let log = ticks(&mut m, 30);
    assert_eq!(m.pending_actions(), 0);
    assert_eq!(hud_texts(&m), vec!["ping", "ping", "ping"]);
    assert_eq!(fired(&log, "beacon"), 1);
}

#[test]
fn impossible_triggers_are_reported_once() {
    let mut m = mission(json!([{
        "name": "strike",
        "trigger": {
            "conditions": [
                { "type": "destroyed", "subjects": { "spacecrafts": ["b1"] } },
                { "type": "time", "params": { "time": 500, "when": "before" } }
            ]
        },
        "actions": [{ "type": "win" }]
    }]));
    let log = ticks(&mut m, 20);
    let reports = log
        .iter()
        .filter(|e| matches!(e, ScriptEvent::TriggerImpossible { event, .. } if event == "strike"))
        .count();
    assert_eq!(reports, 1);
}

// ── Battlefield changes ───────────────────────────────────

#[test]
fn team_changes_refresh_team_subjects() {
    let mut m = mission(json!([
        {
            "name": "defect",
            "actions": [{ "type": "setProperties", "subjects": { "spacecrafts": ["a1"] }, "params": { "team": "rebels" } }]
        },
        {
            "name": "crush-rebels",
            "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "teams": ["rebels"] } }] },
            "actions": [{ "type": "win" }]
        }
    ]));
    ticks(&mut m, 2);

    m.world_mut().destroy("b1");
    ticks(&mut m, 2);
    assert_eq!(m.state(), MissionState::InProgress, "the defector still flies");

    m.world_mut().destroy("a1");
    ticks(&mut m, 1);
    assert_eq!(m.state(), MissionState::Completed);
}

#[test]
fn spawned_spacecraft_join_existing_groups() {
    let mut m = mission(json!([{
        "name": "victory",
        "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "teams": ["pirates"] } }] },
        "actions": [{ "type": "win" }]
    }]));
    ticks(&mut m, 2);

    m.spawn_spacecraft(Spacecraft::new("p3").with_name("Raider 3").with_team("pirates")).unwrap();
    m.world_mut().destroy("p1");
    m.world_mut().destroy("p2");
    ticks(&mut m, 2);
    assert_eq!(m.state(), MissionState::InProgress);

    m.world_mut().destroy("p3");
    ticks(&mut m, 1);
    assert_eq!(m.state(), MissionState::Completed);
}

// ── Objectives ────────────────────────────────────────────

fn objective_mission() -> Mission {
    mission(json!([
        {
            "name": "lose-hauler",
            "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "spacecrafts": ["hauler"] } }] },
            "actions": [{ "type": "lose" }]
        },
        {
            "name": "victory",
            "trigger": { "conditions": [{ "type": "destroyed", "subjects": { "teams": ["pirates"] } }] },
            "actions": [{ "type": "message", "params": { "text": "Clear!" } }, { "type": "win" }]
        }
    ]))
}

#[test]
fn objectives_list_win_before_lose() {
    let m = objective_mission();
    assert_eq!(m.objective_count(), 2);
    assert_eq!(
        m.objective_strings(),
        vec![
            (ObjectiveKind::Win, "Destroy the team Pirates".to_string()),
            (ObjectiveKind::Lose, "Hauler must survive".to_string()),
        ]
    );
}

#[test]
fn objective_status_follows_the_mission() {
    let mut m = objective_mission();
    ticks(&mut m, 1);

    let states = m.objectives();
    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|o| o.status == ObjectiveStatus::InProgress && o.active));
    assert_eq!(states[0].text, "Destroy the team Pirates (2/2)");

    m.world_mut().destroy("p1");
    ticks(&mut m, 1);
    assert_eq!(m.objectives()[0].text, "Destroy the team Pirates (1/2)");

    m.world_mut().destroy("p2");
    ticks(&mut m, 1);
    let states = m.objectives();
    assert_eq!(states[0].status, ObjectiveStatus::Completed);
    assert_eq!(states[1].status, ObjectiveStatus::Completed, "the hauler survived to the end");
}

#[test]
fn objective_progress_is_known_before_the_first_tick() {
    let m = objective_mission();
    let states = m.objectives();
    assert_eq!(states[0].text, "Destroy the team Pirates (2/2)");
}

#[test]
fn spawning_updates_open_objective_progress() {
    let mut m = objective_mission();
    ticks(&mut m, 1);
    m.spawn_spacecraft(Spacecraft::new("p3").with_name("Raider 3").with_team("pirates")).unwrap();
    assert_eq!(m.objectives()[0].text, "Destroy the team Pirates (3/3)");
}

#[test]
fn completed_objectives_keep_their_progress_after_a_spawn() {
    let mut m = objective_mission();
    ticks(&mut m, 1);
    m.world_mut().destroy("p1");
    m.world_mut().destroy("p2");
    ticks(&mut m, 1);
    assert_eq!(m.objectives()[0].text, "Destroy the team Pirates (0/2)");

    m.spawn_spacecraft(Spacecraft::new("late").with_team("alliance")).unwrap();
    m.spawn_spacecraft(Spacecraft::new("p9").with_team("pirates")).unwrap();
    let states = m.objectives();
    assert_eq!(states[0].text, "Destroy the team Pirates (0/2)");
    assert_eq!(states[0].status, ObjectiveStatus::Completed);
}

#[test]
fn losing_the_escort_fails_every_open_objective() {
    let mut m = objective_mission();
    ticks(&mut m, 1);
    m.world_mut().destroy("hauler");
    ticks(&mut m, 1);

    assert_eq!(m.state(), MissionState::Failed);
    let states = m.objectives();
    assert_eq!(states[0].kind, ObjectiveKind::Win);
    assert_eq!(states[0].status, ObjectiveStatus::Failed);
    assert_eq!(states[1].status, ObjectiveStatus::Failed);
}
