use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::ChangeCategory;
use crate::effect::{AttributeValue, Effect};

/// Sequence number assigned to a tracked change, starting at 1.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChangeId(pub u64);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a registered ongoing effect, independent of [`ChangeId`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OngoingEffectId(pub u64);

impl fmt::Display for OngoingEffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied description of something that happened.
///
/// Everything is optional; the store fills in defaults at submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeInput {
    pub category: ChangeCategory,
    pub description: Option<String>,
    pub immediate_effects: Vec<Effect>,
    pub ongoing_effects: Vec<Effect>,
    pub duration: Option<u32>,
    pub world_state_updates: BTreeMap<String, AttributeValue>,
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ChangeInput {
    pub fn new(category: impl Into<ChangeCategory>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_immediate(mut self, effects: Vec<Effect>) -> Self {
        self.immediate_effects = effects;
        self
    }

    pub fn with_ongoing(mut self, effects: Vec<Effect>) -> Self {
        self.ongoing_effects = effects;
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_update(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.world_state_updates.insert(key.into(), value.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Immutable log entry for a submitted change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub change_id: ChangeId,
    #[serde(default)]
    pub category: ChangeCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub immediate_effects: Vec<Effect>,
    #[serde(default)]
    pub ongoing_effects: Vec<Effect>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub world_state_updates: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub turn_number: u64,
    #[serde(default)]
    pub timestamp_ms: u64,
}

/// One line of the condensed world history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub change_id: ChangeId,
    pub turn: u64,
    pub timestamp_ms: u64,
    pub category: ChangeCategory,
    pub description: String,
    /// Immediate effects of the change; empty in saves written before they
    /// were recorded here.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl From<&ChangeRecord> for HistoryEntry {
    fn from(record: &ChangeRecord) -> Self {
        Self {
            change_id: record.change_id,
            turn: record.turn_number,
            timestamp_ms: record.timestamp_ms,
            category: record.category.clone(),
            description: record.description.clone(),
            effects: record.immediate_effects.clone(),
        }
    }
}

/// Effects reapplied once per turn until `turns_remaining` reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OngoingEffectEntry {
    pub id: OngoingEffectId,
    pub source_change: ChangeId,
    pub category: ChangeCategory,
    pub effects: Vec<Effect>,
    pub duration: u32,
    pub turns_remaining: u32,
}

impl OngoingEffectEntry {
    pub fn is_tagged_negative(&self) -> bool {
        self.effects.iter().any(Effect::is_tagged_negative)
    }
}

/// Event label raised by a world-event effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWorldEvent {
    pub event_type: String,
    pub value: String,
    pub timestamp_ms: u64,
    pub start_turn: u64,
    pub active: bool,
}

impl ActiveWorldEvent {
    pub fn is_critical(&self) -> bool {
        self.value.to_ascii_lowercase().contains("critical")
    }
}
