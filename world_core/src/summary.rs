use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use world_proto::{ChangeCategory, ChangeId, ChangeRecord, Effect, OngoingEffectId};

use crate::config::StatusThresholds;

/// Coarse health of the world derived from active events and ongoing effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldStatus {
    #[default]
    Stable,
    Unstable,
    Critical,
}

impl WorldStatus {
    pub fn classify(
        critical_events: usize,
        negative_effects: usize,
        thresholds: &StatusThresholds,
    ) -> Self {
        if critical_events > 0 || negative_effects > thresholds.critical_negative_effects() {
            WorldStatus::Critical
        } else if negative_effects > thresholds.unstable_negative_effects() {
            WorldStatus::Unstable
        } else {
            WorldStatus::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorldStatus::Stable => "STABLE",
            WorldStatus::Unstable => "UNSTABLE",
            WorldStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for WorldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub turn_number: u64,
    pub total_changes: usize,
    pub active_events: usize,
    pub ongoing_effects: usize,
    pub world_status: WorldStatus,
    pub recent_changes: Vec<ChangeRecord>,
    pub category_summary: BTreeMap<ChangeCategory, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveEffectView {
    pub id: OngoingEffectId,
    pub source_change: ChangeId,
    pub turns_remaining: u32,
    pub effects: Vec<Effect>,
}

pub type ActiveEffectsSummary = BTreeMap<ChangeCategory, Vec<ActiveEffectView>>;

/// Outcome of a single turn advance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnReport {
    pub turn: u64,
    pub effects_applied: usize,
    pub expired_effects: Vec<OngoingEffectId>,
    pub expired_events: usize,
}
