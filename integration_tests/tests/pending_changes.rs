mod common;

use world_core::{
    build_headless_app, run_turn, LastTurnReport, PendingWorldChanges, WorldMetrics,
    WorldStateStore, WorldStatus,
};
use world_proto::{ChangeCategory, ChangeInput, Effect};

#[test]
fn queued_changes_resolve_over_turns() {
    common::ensure_test_config();
    let mut app = build_headless_app();

    app.world
        .resource_mut::<PendingWorldChanges>()
        .push(
            ChangeInput::new("missions", "Rescue at the pier")
                .with_immediate(vec![Effect::world_event("pier_lockdown", "ACTIVE")])
                .with_ongoing(vec![Effect::add("public_awareness", 0.1)]),
        );

    run_turn(&mut app);
    {
        let store = app.world.resource::<WorldStateStore>();
        assert!(common::approx(store.get_attribute("public_awareness"), 0.1));
        assert_eq!(store.active_world_events().len(), 1);
        assert_eq!(
            store.get_changes_by_category(&ChangeCategory::Missions).len(),
            1
        );
        assert!(app.world.resource::<PendingWorldChanges>().is_empty());
    }

    run_turn(&mut app);
    {
        let store = app.world.resource::<WorldStateStore>();
        assert!(common::approx(store.get_attribute("public_awareness"), 0.2));
        assert!(store.active_world_events().is_empty());
        let report = &app.world.resource::<LastTurnReport>().0;
        assert_eq!(report.turn, 2);
        assert_eq!(report.expired_effects.len(), 1);
        assert_eq!(report.expired_events, 1);
    }

    run_turn(&mut app);
    let store = app.world.resource::<WorldStateStore>();
    assert!(common::approx(store.get_attribute("public_awareness"), 0.2));

    let metrics = app.world.resource::<WorldMetrics>();
    assert_eq!(metrics.turn, 3);
    assert_eq!(metrics.total_changes, 1);
    assert_eq!(metrics.ongoing_effects, 0);
    assert_eq!(metrics.active_events, 0);
    assert_eq!(metrics.world_status, WorldStatus::Stable);
}

#[test]
fn fixture_thresholds_drive_status() {
    common::ensure_test_config();
    let mut app = build_headless_app();

    app.world.resource_mut::<PendingWorldChanges>().extend([
        ChangeInput::new("faction_activities", "Sabotage")
            .with_ongoing(vec![Effect::add("negative_supply", 1.0)])
            .with_duration(10),
        ChangeInput::new("faction_activities", "Sabotage again")
            .with_ongoing(vec![Effect::add("negative_supply", 1.0)])
            .with_duration(10),
    ]);
    run_turn(&mut app);

    assert_eq!(
        app.world.resource::<WorldMetrics>().world_status,
        WorldStatus::Critical
    );
}

#[test]
fn failed_missions_use_fixture_failure_duration() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    let mut store = app.world.resource_mut::<WorldStateStore>();
    let id = world_core::tracking::track_mission_outcome(
        &mut store,
        "extraction",
        false,
        "Tacoma",
        vec![],
        vec![Effect::subtract("timeline_stability", 0.05)],
    );
    assert_eq!(store.change(id).map(|record| record.duration), Some(4));
}
