use bevy::prelude::*;
use world_proto::ChangeInput;

use crate::store::WorldStateStore;
use crate::summary::TurnReport;

/// Changes queued by hosts between turns; drained at the start of each update.
#[derive(Resource, Debug, Default, Clone)]
pub struct PendingWorldChanges {
    queue: Vec<ChangeInput>,
}

impl PendingWorldChanges {
    pub fn push(&mut self, change: ChangeInput) {
        self.queue.push(change);
    }

    pub fn extend(&mut self, changes: impl IntoIterator<Item = ChangeInput>) {
        self.queue.extend(changes);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ChangeInput> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Resource, Debug, Default, Clone)]
pub struct LastTurnReport(pub TurnReport);

pub fn initialize_world_state(mut store: ResMut<WorldStateStore>) {
    store.initialize();
}

pub fn submit_pending_changes(
    mut pending: ResMut<PendingWorldChanges>,
    mut store: ResMut<WorldStateStore>,
) {
    if pending.is_empty() {
        return;
    }
    let submitted = pending.len();
    for change in pending.drain() {
        store.submit_change(change);
    }
    tracing::debug!(
        target: "world_core::systems",
        submitted,
        turn = store.turn(),
        "pending_changes.submitted"
    );
}

pub fn advance_world_turn(
    mut store: ResMut<WorldStateStore>,
    mut report: ResMut<LastTurnReport>,
) {
    report.0 = store.advance_turn();
}
