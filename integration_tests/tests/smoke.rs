mod common;

use world_core::{build_headless_app, run_turn, WorldConfigMetadata, WorldStateStore};

#[test]
fn app_initializes_from_fixture_config() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    // run a single update tick to ensure schedule executes without panic
    run_turn(&mut app);

    let metadata = app.world.resource::<WorldConfigMetadata>();
    let path = metadata.path().expect("fixture config should be loaded from file");
    assert_eq!(path, &common::fixture_path("test_world_config.json"));

    let fixture = common::fixture_config();
    let store = app.world.resource::<WorldStateStore>();
    assert_eq!(store.turn(), 1);
    assert_eq!(store.attributes(), fixture.default_attributes());
    assert_eq!(store.config().history_retention(), Some(50));
}

#[test]
fn fixture_layers_over_builtin_defaults() {
    let fixture = common::fixture_config();

    // Keys the fixture sets win; everything else comes from the builtin table.
    assert_eq!(fixture.default_attributes().len(), 20);
    assert_eq!(
        fixture.default_attributes().get("faction_influence").and_then(|v| v.as_f64()),
        Some(0.4)
    );
    assert_eq!(
        fixture.default_attributes().get("host_body_survival").and_then(|v| v.as_f64()),
        Some(0.95)
    );
    assert!(fixture.is_bounded("public_awareness"));
    assert!(fixture.is_bounded("host_body_survival"));
}
