//! Shared data model and save format for the world-state engine.

mod category;
mod effect;
mod record;

use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hasher};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use category::ChangeCategory;
pub use effect::{AttributeValue, Effect, EffectOperation, EffectValue};
pub use record::{
    ActiveWorldEvent, ChangeId, ChangeInput, ChangeRecord, HistoryEntry, OngoingEffectEntry,
    OngoingEffectId,
};

/// Version written into every save produced by this build.
pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveHeader {
    /// `0` marks a legacy save written before versioning existed.
    pub format_version: u32,
    pub hash: u64,
}

impl SaveHeader {
    pub fn current() -> Self {
        Self {
            format_version: SAVE_FORMAT_VERSION,
            hash: 0,
        }
    }
}

/// Complete persisted state of a world store.
///
/// Each top-level key defaults independently so partial saves still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSave {
    pub header: SaveHeader,
    pub turn_tracker: u64,
    pub next_change_id: u64,
    pub next_effect_id: u64,
    pub all_world_changes: Vec<ChangeRecord>,
    pub active_world_events: Vec<ActiveWorldEvent>,
    pub ongoing_effects: BTreeMap<OngoingEffectId, OngoingEffectEntry>,
    pub world_state_cache: BTreeMap<String, AttributeValue>,
    pub change_categories: Option<BTreeMap<ChangeCategory, Vec<ChangeRecord>>>,
    pub world_history: Vec<HistoryEntry>,
}

impl WorldSave {
    /// Stamp the content hash into the header.
    pub fn finalize(mut self) -> Result<Self, SaveError> {
        let hash = hash_save(&self)?;
        self.header.hash = hash;
        Ok(self)
    }

    pub fn check_hash(&self) -> Result<HashCheck, SaveError> {
        if self.header.hash == 0 {
            return Ok(HashCheck::Missing);
        }
        let computed = hash_save(self)?;
        if computed == self.header.hash {
            Ok(HashCheck::Verified)
        } else {
            Ok(HashCheck::Mismatch {
                stored: self.header.hash,
                computed,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCheck {
    Verified,
    Missing,
    Mismatch { stored: u64, computed: u64 },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to parse world save: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode world save for hashing: {0}")]
    Encode(#[from] bincode::Error),
    #[error("world save format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

pub fn hash_save(save: &WorldSave) -> Result<u64, SaveError> {
    let mut clone = save.clone();
    clone.header.hash = 0;
    let encoded = bincode::serialize(&clone)?;
    let mut hasher = RandomState::with_seeds(0, 0, 0, 0).build_hasher();
    hasher.write(&encoded);
    Ok(hasher.finish())
}

pub fn encode_save_json(save: &WorldSave) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(save)?)
}

pub fn decode_save_json(data: &str) -> Result<WorldSave, SaveError> {
    let save: WorldSave = serde_json::from_str(data)?;
    if save.header.format_version > SAVE_FORMAT_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: save.header.format_version,
            supported: SAVE_FORMAT_VERSION,
        });
    }
    Ok(save)
}

pub fn encode_changes_json(changes: &[ChangeInput]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(changes)
}

pub fn decode_changes_json(data: &str) -> serde_json::Result<Vec<ChangeInput>> {
    serde_json::from_str(data)
}
