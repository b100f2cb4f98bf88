//! Time condition tests.
//!
//! Tests cover: each `when` mode, start binding to a fired event,
//! repeat counting across large steps, and parameter validation.

use armada_script::{
    battle::Battlefield,
    condition::{Condition, EvalContext},
    error::{ScriptError, ScriptResult},
    objective::ObjectiveKind,
    timer::TimeCondition,
};
use serde_json::{json, Value};
use std::collections::HashSet;

fn build(params: Value) -> ScriptResult<Condition> {
    Condition::from_descriptor(serde_json::from_value(json!({ "type": "time", "params": params })).unwrap())
}

fn timer(params: Value) -> Condition {
    build(params).unwrap()
}

fn inner(condition: &Condition) -> &TimeCondition {
    match condition {
        Condition::Time(t) => t,
        other => panic!("expected a time condition, got {}", other.type_name()),
    }
}

/// Ticks the condition with the given step sizes and collects the results.
fn run(condition: &mut Condition, fired: &HashSet<String>, steps: &[u64]) -> Vec<bool> {
    let world = Battlefield::new();
    let ctx = EvalContext { world: &world, fired_events: fired };
    steps.iter().map(|dt| condition.is_satisfied(&ctx, *dt)).collect()
}

#[test]
fn once_fires_on_the_first_tick_reaching_time() {
    let mut c = timer(json!({ "time": 1000, "when": "once" }));
    let results = run(&mut c, &HashSet::new(), &[300, 300, 300, 300, 300]);
    assert_eq!(results, vec![false, false, false, true, false]);
    assert!(c.is_impossible());
}

#[test]
fn before_holds_until_time_then_becomes_impossible() {
    let mut c = timer(json!({ "time": 1000, "when": "before" }));
    assert!(c.can_be_impossible());
    let results = run(&mut c, &HashSet::new(), &[400, 400, 400, 400]);
    assert_eq!(results, vec![true, true, false, false]);
    assert!(c.is_impossible());
    assert!(!c.is_active());
}

#[test]
fn after_holds_strictly_past_time() {
    let mut c = timer(json!({ "time": 1000, "when": "after" }));
    assert!(!c.can_be_impossible());
    let results = run(&mut c, &HashSet::new(), &[500, 500, 500, 500]);
    assert_eq!(results, vec![false, false, true, true]);
    assert!(!c.is_impossible());
}

#[test]
fn repeat_stops_after_max_count() {
    let mut c = timer(json!({ "time": 1000, "when": "repeat", "maxCount": 3 }));
    assert!(c.can_be_impossible());
    let results = run(&mut c, &HashSet::new(), &[500; 12]);
    let fired: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| **r)
        .map(|(i, _)| i + 1)
        .collect();
    assert_eq!(fired, vec![2, 4, 6]);
    assert_eq!(inner(&c).fire_count(), 3);
    assert!(c.is_impossible());
}

#[test]
fn repeat_counts_every_period_in_a_large_step() {
    let mut c = timer(json!({ "time": 1000, "when": "repeat" }));
    assert!(!c.can_be_impossible());
    assert_eq!(run(&mut c, &HashSet::new(), &[2500]), vec![true]);
    assert_eq!(inner(&c).fire_count(), 2);
    assert_eq!(inner(&c).elapsed(), 500);
}

#[test]
fn repeat_start_value_shortens_the_first_period() {
    let mut c = timer(json!({ "time": 1000, "when": "repeat", "startValue": 800 }));
    assert_eq!(run(&mut c, &HashSet::new(), &[300, 300]), vec![true, false]);
}

#[test]
fn waits_for_the_start_event() {
    let mut before = timer(json!({ "time": 1000, "when": "before", "start": "alarm" }));
    let mut within = timer(json!({ "time": 1000, "when": "within", "start": "alarm" }));
    let mut fired = HashSet::new();

    // Not started: `before` already holds, `within` does not.
    assert_eq!(run(&mut before, &fired, &[600, 600]), vec![true, true]);
    assert_eq!(run(&mut within, &fired, &[600, 600]), vec![false, false]);
    assert!(!inner(&before).is_running());
    assert!(!before.is_active());
    assert_eq!(inner(&before).elapsed(), 0);

    fired.insert("alarm".to_string());
    assert_eq!(run(&mut within, &fired, &[600]), vec![true]);
    assert!(within.is_active());
    assert_eq!(run(&mut within, &fired, &[600]), vec![false]);
    assert!(within.is_impossible());
}

#[test]
fn rejects_invalid_params() {
    let invalid = [
        json!({ "time": 1000 }),
        json!({ "time": 1000, "when": "sometimes" }),
        json!({ "time": 1000, "when": "once", "maxCount": 2 }),
        json!({ "time": 1000, "when": "after", "startValue": 10 }),
        json!({ "time": 0, "when": "repeat" }),
        json!({ "time": 1000, "when": "repeat", "maxCount": 0 }),
        json!({ "time": 1000, "when": "once", "start": "" }),
        json!({ "time": -5, "when": "once" }),
    ];
    for params in invalid {
        let err = build(params.clone()).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidParams { .. }), "{params} gave {err}");
    }
}

#[test]
fn objective_text_shows_remaining_time() {
    let mut c = timer(json!({ "time": 90000, "when": "before" }));
    let world = Battlefield::new();
    assert_eq!(c.objective_string(&world, ObjectiveKind::Win).unwrap(), "Complete within 1:30");

    run(&mut c, &HashSet::new(), &[30000]);
    assert_eq!(
        c.objective_state_string(&world, ObjectiveKind::Win).unwrap(),
        "Complete within 1:30 (1:00)"
    );

    let once = timer(json!({ "time": 1000, "when": "once" }));
    assert!(matches!(
        once.objective_string(&world, ObjectiveKind::Win),
        Err(ScriptError::ObjectiveUnsupported { condition: "time", .. })
    ));
}
