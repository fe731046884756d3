//! World-state change tracking and effect resolution.
//!
//! [`WorldStateStore`] owns the attribute map, the change log and the
//! ongoing effects that age one step per turn. The `track_*` functions in
//! [`tracking`] package narrative events into changes, and
//! [`build_headless_app`] wires the store into a Bevy schedule that resolves
//! one turn whenever [`run_turn`] is invoked.

pub mod config;
pub mod log_stream;
pub mod metrics;
mod store;
mod summary;
mod systems;
pub mod tracking;

use std::sync::Arc;

use bevy::prelude::*;

pub use config::{
    load_world_config_from_env, StatusThresholds, WorldConfig, WorldConfigError,
    WorldConfigHandle, WorldConfigMetadata, WorldEventExpiry,
};
pub use log_stream::{log_channel, LogEnvelope, LogForwardLayer};
pub use metrics::{StoreTelemetry, WorldMetrics};
pub use store::{EffectOutcome, EffectRejection, ImportReport, WorldStateStore};
pub use summary::{ActiveEffectView, ActiveEffectsSummary, TurnReport, WorldStatus, WorldSummary};
pub use systems::{LastTurnReport, PendingWorldChanges};

/// Construct a Bevy [`App`] using the configuration found via
/// [`load_world_config_from_env`].
pub fn build_headless_app() -> App {
    let (config, metadata) = load_world_config_from_env();
    let store = WorldStateStore::new(Arc::clone(&config));
    let mut app = build_app_with_store(store, config);
    app.insert_resource(metadata);
    app
}

/// Construct a Bevy [`App`] around an existing store, e.g. one restored from
/// a save.
pub fn build_app_with_store(store: WorldStateStore, config: Arc<WorldConfig>) -> App {
    let mut app = App::new();

    app.insert_resource(store)
        .insert_resource(WorldConfigHandle::new(config))
        .insert_resource(PendingWorldChanges::default())
        .insert_resource(LastTurnReport::default())
        .insert_resource(WorldMetrics::default())
        .add_plugins(MinimalPlugins)
        .add_systems(Startup, systems::initialize_world_state)
        .add_systems(
            Update,
            (
                systems::submit_pending_changes,
                systems::advance_world_turn,
                metrics::collect_world_metrics,
            )
                .chain(),
        );

    app
}

/// Execute a single game turn.
///
/// Queued [`PendingWorldChanges`] are submitted against the current turn,
/// then the turn advances (ongoing effects applied and aged, world events
/// expired) and [`WorldMetrics`] is refreshed.
pub fn run_turn(app: &mut App) {
    app.update();
}
