//! Trigger tests: condition combination, firing policy and impossibility.

use armada_script::{
    battle::{Battlefield, Spacecraft},
    condition::EvalContext,
    trigger::Trigger,
};
use serde_json::{json, Value};
use std::collections::HashSet;

fn world() -> Battlefield {
    let mut w = Battlefield::new();
    w.spawn(Spacecraft::new("a1"));
    w.spawn(Spacecraft::new("a2"));
    w
}

fn trigger(value: Value) -> Trigger {
    Trigger::from_descriptor(serde_json::from_value(value).unwrap()).unwrap()
}

fn destroyed(id: &str) -> Value {
    json!({ "type": "destroyed", "subjects": { "spacecrafts": [id] } })
}

fn hull_below(id: &str, max: f64) -> Value {
    json!({ "type": "hullIntegrity", "subjects": { "spacecrafts": [id] }, "params": { "maxIntegrity": max } })
}

fn tick(trigger: &mut Trigger, world: &Battlefield) -> bool {
    let fired = HashSet::new();
    trigger.tick(&EvalContext { world, fired_events: &fired }, 100)
}

#[test]
fn all_needs_every_condition() {
    let mut w = world();
    let mut t = trigger(json!({ "conditions": [destroyed("a1"), destroyed("a2")] }));

    w.destroy("a1");
    assert!(!tick(&mut t, &w));
    w.destroy("a2");
    assert!(tick(&mut t, &w));
    assert_eq!(t.fire_count(), 1);
}

#[test]
fn any_needs_one_condition() {
    let mut w = world();
    let mut t = trigger(json!({ "conditions": [destroyed("a1"), destroyed("a2")], "which": "any" }));

    assert!(!tick(&mut t, &w));
    w.destroy("a2");
    assert!(tick(&mut t, &w));
}

#[test]
fn empty_trigger_fires_on_the_first_tick_only() {
    let w = world();
    let mut t = trigger(json!({}));
    assert!(t.is_single());
    assert!(tick(&mut t, &w));
    assert!(!tick(&mut t, &w));
    assert!(!tick(&mut t, &w));
    assert_eq!(t.fire_count(), 1);
    assert!(!t.can_be_impossible());
}

#[test]
fn single_trigger_fires_once() {
    let mut w = world();
    let mut t = trigger(json!({ "conditions": [destroyed("a1")], "when": "true" }));
    w.destroy("a1");
    assert!(tick(&mut t, &w));
    assert!(!tick(&mut t, &w));
    assert!(t.has_fired());
}

#[test]
fn repeatable_trigger_fires_on_each_rising_edge() {
    let mut w = world();
    let mut t = trigger(json!({ "conditions": [hull_below("a1", 50.0)], "single": false }));

    assert!(!tick(&mut t, &w));
    w.spacecraft_mut("a1").unwrap().set_hull_integrity(0.25);
    assert!(tick(&mut t, &w));
    assert!(!tick(&mut t, &w), "still satisfied, no new edge");

    w.spacecraft_mut("a1").unwrap().set_hull_integrity(0.75);
    assert!(!tick(&mut t, &w));
    w.spacecraft_mut("a1").unwrap().set_hull_integrity(0.25);
    assert!(tick(&mut t, &w));
    assert_eq!(t.fire_count(), 2);
}

#[test]
fn level_trigger_fires_every_satisfied_tick() {
    let mut w = world();
    let mut t = trigger(json!({ "conditions": [destroyed("a1")], "when": "true", "single": false }));
    w.destroy("a1");
    let fires = (0..5).filter(|_| tick(&mut t, &w)).count();
    assert_eq!(fires, 5);
}

#[test]
fn all_every_condition_is_evaluated_each_tick() {
    // The timer keeps counting even while the destroyed condition fails.
    let mut w = world();
    let mut t = trigger(json!({
        "conditions": [destroyed("a1"), { "type": "time", "params": { "time": 300, "when": "after" } }]
    }));
    for _ in 0..4 {
        assert!(!tick(&mut t, &w));
    }
    w.destroy("a1");
    assert!(tick(&mut t, &w));
}

#[test]
fn impossibility_follows_the_combination() {
    let w = world();
    let deadline = json!({ "type": "time", "params": { "time": 200, "when": "before" } });

    let mut all = trigger(json!({ "conditions": [destroyed("a1"), deadline.clone()] }));
    let mut any = trigger(json!({ "conditions": [destroyed("a1"), deadline], "which": "any" }));
    assert!(all.can_be_impossible());
    assert!(!any.can_be_impossible());

    for _ in 0..3 {
        tick(&mut all, &w);
        tick(&mut any, &w);
    }
    assert!(all.is_impossible());
    assert!(!any.is_impossible());
    assert!(all.take_newly_impossible());
    assert!(!all.take_newly_impossible(), "reported once");
}

#[test]
fn fired_single_trigger_is_not_impossible() {
    let w = world();
    let mut t = trigger(json!({
        "conditions": [{ "type": "time", "params": { "time": 100, "when": "once" } }]
    }));
    assert!(tick(&mut t, &w));
    assert!(!t.is_impossible());
}

#[test]
fn fire_handlers_keep_registration_order() {
    let mut t = trigger(json!({}));
    t.add_fire_handler(2);
    t.add_fire_handler(0);
    t.add_fire_handler(1);
    assert_eq!(t.fire_handlers(), &[2, 0, 1]);
}
