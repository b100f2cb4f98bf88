//! Subject group tests.
//!
//! Tests cover: selection by id/squad/team, cache locking and refresh,
//! display strings, and the live aggregate queries.

use armada_script::{
    battle::{Battlefield, Spacecraft},
    subject::{SubjectDescriptor, SubjectGroup},
};

fn world() -> Battlefield {
    let mut w = Battlefield::new();
    w.add_team("empire", "Empire");
    w.add_team("rebels", "Rebels");
    w.spawn(Spacecraft::new("a1").with_name("Alpha 1").with_squad("alpha").with_team("empire"));
    w.spawn(Spacecraft::new("a2").with_name("Alpha 2").with_squad("alpha").with_team("empire").with_hull(0.5));
    w.spawn(Spacecraft::new("b1").with_name("Beta 1").with_squad("beta").with_team("rebels"));
    w
}

fn group(spacecrafts: &[&str], squads: &[&str], teams: &[&str]) -> SubjectGroup {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    SubjectGroup::new(SubjectDescriptor {
        spacecrafts: owned(spacecrafts),
        squads:      owned(squads),
        teams:       owned(teams),
    })
}

#[test]
fn selects_by_id_squad_or_team() {
    let w = world();
    let a1 = w.spacecraft("a1").unwrap();
    let b1 = w.spacecraft("b1").unwrap();

    assert!(group(&["a1"], &[], &[]).has(a1));
    assert!(group(&[], &["alpha"], &[]).has(a1));
    assert!(group(&[], &[], &["rebels"]).has(b1));
    assert!(!group(&[], &["alpha"], &[]).has(b1));

    assert_eq!(group(&[], &["alpha"], &[]).resolve(&w).len(), 2);
    assert_eq!(group(&["b1"], &[], &["empire"]).resolve(&w).len(), 3);
}

#[test]
fn locked_cache_keeps_destroyed_and_removed_spacecraft() {
    let mut w = world();
    let mut g = group(&[], &["alpha"], &[]);
    assert_eq!(g.resolve(&w).len(), 2);

    w.destroy("a1");
    w.remove_spacecraft("a1");

    assert_eq!(g.resolve(&w).len(), 2, "cache must stay locked until refreshed");
    assert_eq!(g.live_count(&w, false), 1);

    g.refresh();
    assert_eq!(g.resolve(&w).len(), 1, "removed spacecraft fall out on refresh");
}

#[test]
fn empty_resolution_is_retried() {
    let mut w = Battlefield::new();
    let mut g = group(&["late"], &[], &[]);
    assert!(g.resolve(&w).is_empty());

    w.spawn(Spacecraft::new("late"));
    assert_eq!(g.resolve(&w).len(), 1);
}

#[test]
fn multi_detection() {
    assert!(!group(&["a1"], &[], &[]).is_multi());
    assert!(group(&["a1", "a2"], &[], &[]).is_multi());
    assert!(group(&[], &["alpha"], &[]).is_multi());
    assert!(group(&[], &[], &["empire"]).is_multi());
}

#[test]
fn describes_subjects_for_objectives() {
    let w = world();
    assert_eq!(group(&["a1"], &[], &[]).describe(&w), "Alpha 1");
    assert_eq!(
        group(&["a1"], &["beta"], &["empire"]).describe(&w),
        "Alpha 1, the squad beta and the team Empire"
    );
    assert_eq!(group(&["ghost"], &[], &[]).describe(&w), "ghost");
}

#[test]
fn short_labels_for_the_hud() {
    let w = world();
    assert_eq!(group(&["a2"], &[], &[]).short_string(&w), "Alpha 2");
    assert_eq!(group(&["a1", "a2"], &[], &[]).short_string(&w), "2 spacecraft");
    assert_eq!(group(&[], &["beta"], &[]).short_string(&w), "squad beta");
    assert_eq!(group(&[], &["alpha", "beta"], &[]).short_string(&w), "2 squads");
    assert_eq!(group(&[], &[], &["rebels"]).short_string(&w), "team Rebels");
    assert_eq!(group(&["a1"], &["beta"], &["empire"]).short_string(&w), "3 groups");
}

#[test]
fn aggregates_over_live_and_present_subjects() {
    let mut w = world();
    let mut g = group(&[], &["alpha"], &[]);
    g.resolve(&w);

    assert_eq!(g.live_count(&w, true), 2);
    assert_eq!(g.min_hull_integrity(&w, false), 50.0);
    assert_eq!(g.max_hull_integrity(&w, false), 100.0);

    w.set_away("a2", true);
    assert_eq!(g.live_count(&w, true), 1);
    assert_eq!(g.live_count(&w, false), 2);
    assert_eq!(g.min_hull_integrity(&w, true), 100.0);

    w.destroy("a1");
    // No live present subject left: min starts from 100, max from 0.
    assert_eq!(g.min_hull_integrity(&w, true), 100.0);
    assert_eq!(g.max_hull_integrity(&w, true), 0.0);
}
