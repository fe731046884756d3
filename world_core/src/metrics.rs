use bevy::prelude::*;

use crate::store::WorldStateStore;
use crate::summary::WorldStatus;

/// Running counters kept by the store for anomalies and housekeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTelemetry {
    pub effects_applied: u64,
    pub effects_skipped: u64,
    pub clamped_writes: u64,
    pub ongoing_expired: u64,
    pub events_expired: u64,
    pub unbucketed_changes: u64,
    pub evicted_changes: u64,
}

#[derive(Resource, Default, Debug, Clone)]
pub struct WorldMetrics {
    pub turn: u64,
    pub attribute_count: usize,
    pub total_changes: usize,
    pub ongoing_effects: usize,
    pub active_events: usize,
    pub world_status: WorldStatus,
    pub effects_skipped: u64,
    pub clamped_writes: u64,
}

pub fn collect_world_metrics(store: Res<WorldStateStore>, mut metrics: ResMut<WorldMetrics>) {
    let telemetry = store.telemetry();
    metrics.turn = store.turn();
    metrics.attribute_count = store.attributes().len();
    metrics.total_changes = store.history().len();
    metrics.ongoing_effects = store.ongoing_effects().count();
    metrics.active_events = store.active_world_events().len();
    metrics.world_status = store.world_status();
    metrics.effects_skipped = telemetry.effects_skipped;
    metrics.clamped_writes = telemetry.clamped_writes;
}
