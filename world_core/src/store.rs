use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::Resource;
use thiserror::Error;
use tracing::{debug, info, warn};
use world_proto::{
    decode_save_json, encode_save_json, hash_save, ActiveWorldEvent, AttributeValue, ChangeCategory,
    ChangeId, ChangeInput, ChangeRecord, Effect, EffectOperation, EffectValue, HashCheck,
    HistoryEntry, OngoingEffectEntry, OngoingEffectId, SaveError, SaveHeader, WorldSave,
};

use crate::config::{WorldConfig, WorldEventExpiry};
use crate::metrics::StoreTelemetry;
use crate::summary::{ActiveEffectView, ActiveEffectsSummary, TurnReport, WorldStatus, WorldSummary};

/// Why an effect was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectRejection {
    #[error("value {value:?} for {target} is not numeric")]
    NonNumericValue { target: String, value: String },
    #[error("{target} holds a label and cannot take arithmetic")]
    LabelAttribute { target: String },
    #[error("unsupported operation on {target}")]
    UnsupportedOperation { target: String },
    #[error("effect has no target")]
    MissingTarget,
    #[error("unsupported effect type")]
    UnsupportedEffect,
    #[error("result for {target} is not finite")]
    NonFiniteResult { target: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Applied { value: f64 },
    Clamped { requested: f64, value: f64 },
    EventRaised,
    Skipped(EffectRejection),
}

impl EffectOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, EffectOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub changes: usize,
    pub ongoing_effects: usize,
    pub hash: HashCheck,
}

/// Authoritative world state for a game session.
///
/// Owns the attribute map, the change history with its per-category buckets,
/// the ongoing effects that are reapplied each turn, and the active world
/// events. Every mutation goes through this type; malformed effects are
/// skipped and reported through `tracing` and [`StoreTelemetry`] instead of
/// failing the caller.
#[derive(Resource, Debug, Clone)]
pub struct WorldStateStore {
    config: Arc<WorldConfig>,
    turn: u64,
    next_change_id: u64,
    next_effect_id: u64,
    attributes: BTreeMap<String, AttributeValue>,
    history: VecDeque<ChangeRecord>,
    buckets: BTreeMap<ChangeCategory, VecDeque<ChangeId>>,
    world_history: VecDeque<HistoryEntry>,
    ongoing: BTreeMap<OngoingEffectId, OngoingEffectEntry>,
    active_events: Vec<ActiveWorldEvent>,
    telemetry: StoreTelemetry,
}

impl Default for WorldStateStore {
    fn default() -> Self {
        WorldStateStore::new(WorldConfig::builtin())
    }
}

impl WorldStateStore {
    pub fn new(config: Arc<WorldConfig>) -> Self {
        let mut store = Self::empty(config);
        store.initialize();
        store
    }

    fn empty(config: Arc<WorldConfig>) -> Self {
        Self {
            config,
            turn: 0,
            next_change_id: 1,
            next_effect_id: 1,
            attributes: BTreeMap::new(),
            history: VecDeque::new(),
            buckets: BTreeMap::new(),
            world_history: VecDeque::new(),
            ongoing: BTreeMap::new(),
            active_events: Vec::new(),
            telemetry: StoreTelemetry::default(),
        }
    }

    /// Seed the default attributes. Does nothing once any attribute exists.
    pub fn initialize(&mut self) -> usize {
        if !self.attributes.is_empty() {
            debug!(
                target: "world_core::store",
                attributes = self.attributes.len(),
                "world_state.seed_skipped"
            );
            return 0;
        }
        for (key, value) in self.config.default_attributes() {
            self.attributes.insert(key.clone(), value.clone());
        }
        let seeded = self.attributes.len();
        info!(target: "world_core::store", seeded, "world_state.seeded");
        seeded
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn submit_change(&mut self, input: ChangeInput) -> ChangeId {
        self.submit_change_at(input, now_ms())
    }

    /// Record a change stamped with the caller's clock.
    pub fn submit_change_at(&mut self, input: ChangeInput, now_ms: u64) -> ChangeId {
        let ChangeInput {
            category,
            description,
            immediate_effects,
            ongoing_effects,
            duration,
            world_state_updates,
            details,
        } = input;

        let change_id = ChangeId(self.next_change_id);
        self.next_change_id += 1;

        let duration = match duration {
            Some(0) => {
                warn!(
                    target: "world_core::store",
                    change_id = change_id.0,
                    "change.zero_duration_raised_to_one"
                );
                1
            }
            Some(turns) => turns,
            None => self.config.default_duration(&category),
        };

        let record = ChangeRecord {
            change_id,
            category,
            description: description.unwrap_or_else(|| "Unknown change".to_string()),
            immediate_effects,
            ongoing_effects,
            duration,
            world_state_updates,
            details,
            turn_number: self.turn,
            timestamp_ms: now_ms,
        };

        for effect in &record.immediate_effects {
            self.apply_effect_at(effect, now_ms);
        }
        for (key, value) in &record.world_state_updates {
            self.write_attribute(key, value);
        }
        if !record.ongoing_effects.is_empty() {
            self.register_ongoing(&record);
        }

        info!(
            target: "world_core::store",
            change_id = change_id.0,
            category = %record.category,
            turn = self.turn,
            immediate = record.immediate_effects.len(),
            ongoing = record.ongoing_effects.len(),
            description = %record.description,
            "change.tracked"
        );
        self.append_record(record);
        change_id
    }

    fn append_record(&mut self, record: ChangeRecord) {
        if record.category.is_recognized() {
            self.buckets
                .entry(record.category.clone())
                .or_default()
                .push_back(record.change_id);
        } else {
            self.telemetry.unbucketed_changes += 1;
            debug!(
                target: "world_core::store",
                change_id = record.change_id.0,
                category = %record.category,
                "change.unbucketed"
            );
        }
        self.world_history.push_back(HistoryEntry::from(&record));
        self.history.push_back(record);
        self.enforce_retention();
    }

    fn enforce_retention(&mut self) {
        let Some(limit) = self.config.history_retention() else {
            return;
        };
        while self.history.len() > limit {
            let Some(evicted) = self.history.pop_front() else {
                break;
            };
            if let Some(bucket) = self.buckets.get_mut(&evicted.category) {
                while bucket.front().is_some_and(|id| *id <= evicted.change_id) {
                    bucket.pop_front();
                }
            }
            self.telemetry.evicted_changes += 1;
        }
        while self.world_history.len() > limit {
            self.world_history.pop_front();
        }
    }

    fn register_ongoing(&mut self, record: &ChangeRecord) {
        let id = OngoingEffectId(self.next_effect_id);
        self.next_effect_id += 1;
        self.ongoing.insert(
            id,
            OngoingEffectEntry {
                id,
                source_change: record.change_id,
                category: record.category.clone(),
                effects: record.ongoing_effects.clone(),
                duration: record.duration,
                turns_remaining: record.duration,
            },
        );
        debug!(
            target: "world_core::store",
            effect_id = id.0,
            source_change = record.change_id.0,
            duration = record.duration,
            "ongoing.registered"
        );
    }

    pub fn apply_effect(&mut self, effect: &Effect) -> EffectOutcome {
        self.apply_effect_at(effect, now_ms())
    }

    pub fn apply_effect_at(&mut self, effect: &Effect, now_ms: u64) -> EffectOutcome {
        let outcome = match effect {
            Effect::AttributeChange { target, .. } | Effect::WorldEvent { target, .. }
                if target.trim().is_empty() =>
            {
                EffectOutcome::Skipped(EffectRejection::MissingTarget)
            }
            Effect::AttributeChange {
                target,
                value,
                operation,
            } => self.apply_attribute_change(target, value, *operation),
            Effect::WorldEvent { target, value } => {
                self.raise_world_event(target, value, now_ms);
                EffectOutcome::EventRaised
            }
            Effect::Unsupported => EffectOutcome::Skipped(EffectRejection::UnsupportedEffect),
        };

        if let EffectOutcome::Skipped(reason) = &outcome {
            self.telemetry.effects_skipped += 1;
            warn!(
                target: "world_core::store",
                turn = self.turn,
                reason = %reason,
                "effect.skipped"
            );
        } else {
            self.telemetry.effects_applied += 1;
        }
        outcome
    }

    fn apply_attribute_change(
        &mut self,
        target: &str,
        value: &EffectValue,
        operation: EffectOperation,
    ) -> EffectOutcome {
        let Some(operand) = value.as_number() else {
            return EffectOutcome::Skipped(EffectRejection::NonNumericValue {
                target: target.to_string(),
                value: value.label(),
            });
        };

        let current = match self.attributes.get(target) {
            Some(AttributeValue::Numeric(current)) => *current,
            Some(AttributeValue::Label(_)) if operation != EffectOperation::Set => {
                return EffectOutcome::Skipped(EffectRejection::LabelAttribute {
                    target: target.to_string(),
                });
            }
            _ => 0.0,
        };

        let computed = match operation {
            EffectOperation::Set => operand,
            EffectOperation::Add => current + operand,
            EffectOperation::Subtract => current - operand,
            EffectOperation::Multiply => current * operand,
            EffectOperation::Divide if operand == 0.0 => current,
            EffectOperation::Divide => current / operand,
            EffectOperation::Unsupported => {
                return EffectOutcome::Skipped(EffectRejection::UnsupportedOperation {
                    target: target.to_string(),
                });
            }
        };

        if !computed.is_finite() {
            return EffectOutcome::Skipped(EffectRejection::NonFiniteResult {
                target: target.to_string(),
            });
        }
        self.write_numeric(target, computed)
    }

    fn write_numeric(&mut self, target: &str, requested: f64) -> EffectOutcome {
        let value = if self.config.is_bounded(target) {
            requested.clamp(0.0, 1.0)
        } else {
            requested
        };
        self.attributes
            .insert(target.to_string(), AttributeValue::Numeric(value));
        if value != requested {
            self.telemetry.clamped_writes += 1;
            debug!(
                target: "world_core::store",
                attribute = target,
                requested,
                value,
                "attribute.clamped"
            );
            EffectOutcome::Clamped { requested, value }
        } else {
            EffectOutcome::Applied { value }
        }
    }

    fn write_attribute(&mut self, key: &str, value: &AttributeValue) {
        match value {
            AttributeValue::Numeric(number) if number.is_finite() => {
                self.write_numeric(key, *number);
            }
            AttributeValue::Numeric(_) => {
                self.telemetry.effects_skipped += 1;
                warn!(
                    target: "world_core::store",
                    attribute = key,
                    "world_state_update.non_finite"
                );
            }
            AttributeValue::Label(_) => {
                self.attributes.insert(key.to_string(), value.clone());
            }
        }
    }

    fn raise_world_event(&mut self, target: &str, value: &EffectValue, now_ms: u64) {
        let event = ActiveWorldEvent {
            event_type: target.to_string(),
            value: value.label(),
            timestamp_ms: now_ms,
            start_turn: self.turn,
            active: true,
        };
        info!(
            target: "world_core::store",
            event_type = %event.event_type,
            value = %event.value,
            turn = self.turn,
            "world_event.raised"
        );
        self.active_events.push(event);
    }

    pub fn advance_turn(&mut self) -> TurnReport {
        self.advance_turn_at(now_ms())
    }

    /// Move to the next turn: reapply every ongoing effect, age it, drop the
    /// ones that ran out, then retire expired world events.
    pub fn advance_turn_at(&mut self, now_ms: u64) -> TurnReport {
        self.turn += 1;
        let mut report = TurnReport {
            turn: self.turn,
            ..Default::default()
        };

        // Applying effects never touches the ongoing map, so it can be taken
        // out for the duration of the pass.
        let mut ongoing = std::mem::take(&mut self.ongoing);
        for (id, entry) in ongoing.iter_mut() {
            for effect in &entry.effects {
                if !self.apply_effect_at(effect, now_ms).is_skipped() {
                    report.effects_applied += 1;
                }
            }
            entry.turns_remaining = entry.turns_remaining.saturating_sub(1);
            if entry.turns_remaining == 0 {
                report.expired_effects.push(*id);
                debug!(
                    target: "world_core::store",
                    effect_id = id.0,
                    source_change = entry.source_change.0,
                    "ongoing.expired"
                );
            }
        }
        ongoing.retain(|_, entry| entry.turns_remaining > 0);
        self.ongoing = ongoing;
        self.telemetry.ongoing_expired += report.expired_effects.len() as u64;

        report.expired_events = self.expire_world_events(now_ms);

        info!(
            target: "world_core::store",
            turn = self.turn,
            effects_applied = report.effects_applied,
            expired_effects = report.expired_effects.len(),
            expired_events = report.expired_events,
            ongoing_effects = self.ongoing.len(),
            active_events = self.active_events.len(),
            "turn.processed"
        );
        report
    }

    fn expire_world_events(&mut self, now_ms: u64) -> usize {
        let expiry = self.config.world_event_expiry();
        let turn = self.turn;
        for event in self.active_events.iter_mut().filter(|event| event.active) {
            let expired = match expiry {
                WorldEventExpiry::Turns { turns } => turn.saturating_sub(event.start_turn) > turns,
                WorldEventExpiry::WallClock { seconds } => {
                    now_ms.saturating_sub(event.timestamp_ms) > seconds.saturating_mul(1000)
                }
            };
            if expired {
                event.active = false;
                info!(
                    target: "world_core::store",
                    event_type = %event.event_type,
                    value = %event.value,
                    "world_event.expired"
                );
            }
        }
        let before = self.active_events.len();
        self.active_events.retain(|event| event.active);
        let expired = before - self.active_events.len();
        self.telemetry.events_expired += expired as u64;
        expired
    }

    /// Numeric value of an attribute; unset and label attributes read as 0.0.
    pub fn get_attribute(&self, key: &str) -> f64 {
        self.attributes
            .get(key)
            .and_then(AttributeValue::as_f64)
            .unwrap_or(0.0)
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn history(&self) -> &VecDeque<ChangeRecord> {
        &self.history
    }

    pub fn world_history(&self) -> &VecDeque<HistoryEntry> {
        &self.world_history
    }

    pub fn change(&self, id: ChangeId) -> Option<&ChangeRecord> {
        self.history
            .binary_search_by_key(&id, |record| record.change_id)
            .ok()
            .and_then(|index| self.history.get(index))
    }

    pub fn ongoing_effects(&self) -> impl Iterator<Item = &OngoingEffectEntry> {
        self.ongoing.values()
    }

    pub fn ongoing_effect(&self, id: OngoingEffectId) -> Option<&OngoingEffectEntry> {
        self.ongoing.get(&id)
    }

    pub fn active_world_events(&self) -> &[ActiveWorldEvent] {
        &self.active_events
    }

    pub fn telemetry(&self) -> StoreTelemetry {
        self.telemetry
    }

    /// Changes recorded from `turns_back` turns ago through the current turn.
    pub fn get_recent_changes(&self, turns_back: u64) -> Vec<&ChangeRecord> {
        let window = self.turn.saturating_sub(turns_back)..=self.turn;
        self.history
            .iter()
            .filter(|record| window.contains(&record.turn_number))
            .collect()
    }

    pub fn get_changes_by_category(&self, category: &ChangeCategory) -> Vec<&ChangeRecord> {
        self.buckets
            .get(category)
            .map(|ids| ids.iter().filter_map(|id| self.change(*id)).collect())
            .unwrap_or_default()
    }

    pub fn world_status(&self) -> WorldStatus {
        let critical_events = self
            .active_events
            .iter()
            .filter(|event| event.active && event.is_critical())
            .count();
        let negative_effects = self
            .ongoing
            .values()
            .filter(|entry| entry.is_tagged_negative())
            .count();
        WorldStatus::classify(critical_events, negative_effects, self.config.status())
    }

    pub fn get_world_summary(&self) -> WorldSummary {
        let category_summary = ChangeCategory::ALL
            .iter()
            .map(|category| {
                let count = self.buckets.get(category).map_or(0, VecDeque::len);
                (category.clone(), count)
            })
            .collect();

        WorldSummary {
            turn_number: self.turn,
            total_changes: self.history.len(),
            active_events: self.active_events.len(),
            ongoing_effects: self.ongoing.len(),
            world_status: self.world_status(),
            recent_changes: self
                .get_recent_changes(self.config.recent_turn_window())
                .into_iter()
                .cloned()
                .collect(),
            category_summary,
        }
    }

    pub fn get_active_effects_summary(&self) -> ActiveEffectsSummary {
        let mut summary = ActiveEffectsSummary::new();
        for entry in self.ongoing.values() {
            summary
                .entry(entry.category.clone())
                .or_default()
                .push(ActiveEffectView {
                    id: entry.id,
                    source_change: entry.source_change,
                    turns_remaining: entry.turns_remaining,
                    effects: entry.effects.clone(),
                });
        }
        summary
    }

    pub fn export_state(&self) -> WorldSave {
        let change_categories = ChangeCategory::ALL
            .iter()
            .map(|category| {
                let records = self
                    .get_changes_by_category(category)
                    .into_iter()
                    .cloned()
                    .collect();
                (category.clone(), records)
            })
            .collect();

        let mut save = WorldSave {
            header: SaveHeader::current(),
            turn_tracker: self.turn,
            next_change_id: self.next_change_id,
            next_effect_id: self.next_effect_id,
            all_world_changes: self.history.iter().cloned().collect(),
            active_world_events: self.active_events.clone(),
            ongoing_effects: self.ongoing.clone(),
            world_state_cache: self.attributes.clone(),
            change_categories: Some(change_categories),
            world_history: self.world_history.iter().cloned().collect(),
        };
        match hash_save(&save) {
            Ok(hash) => save.header.hash = hash,
            Err(err) => warn!(
                target: "world_core::store",
                error = %err,
                "save.hash_failed"
            ),
        }
        save
    }

    /// Replace the entire store contents with a save.
    ///
    /// Missing pieces fall back to empty collections; nothing is merged with
    /// the current state.
    pub fn import_state(&mut self, save: WorldSave) -> ImportReport {
        let hash = match save.check_hash() {
            Ok(check) => check,
            Err(err) => {
                warn!(target: "world_core::store", error = %err, "save.hash_failed");
                HashCheck::Missing
            }
        };
        if let HashCheck::Mismatch { stored, computed } = hash {
            warn!(
                target: "world_core::store",
                stored,
                computed,
                "save.hash_mismatch"
            );
        }

        let WorldSave {
            turn_tracker,
            next_change_id,
            next_effect_id,
            all_world_changes,
            active_world_events,
            ongoing_effects,
            world_state_cache,
            change_categories,
            world_history,
            ..
        } = save;

        let mut history = all_world_changes;
        history.sort_by_key(|record| record.change_id);
        history.dedup_by_key(|record| record.change_id);
        let history: VecDeque<ChangeRecord> = history.into();

        let buckets = match change_categories {
            Some(saved) => rebuild_buckets(
                &history,
                saved
                    .into_iter()
                    .flat_map(|(category, records)| {
                        records
                            .into_iter()
                            .map(move |record| (category.clone(), record.change_id))
                    }),
            ),
            None => rebuild_buckets(
                &history,
                history
                    .iter()
                    .map(|record| (record.category.clone(), record.change_id)),
            ),
        };

        let mut ongoing = BTreeMap::new();
        for (id, mut entry) in ongoing_effects {
            if entry.turns_remaining == 0 {
                warn!(
                    target: "world_core::store",
                    effect_id = id.0,
                    "save.expired_ongoing_dropped"
                );
                continue;
            }
            entry.id = id;
            ongoing.insert(id, entry);
        }

        let last_change = history.back().map_or(0, |record| record.change_id.0);
        let last_effect = ongoing.keys().next_back().map_or(0, |id: &OngoingEffectId| id.0);

        self.turn = turn_tracker;
        self.next_change_id = next_change_id.max(last_change + 1);
        self.next_effect_id = next_effect_id.max(last_effect + 1);
        self.attributes = world_state_cache;
        self.history = history;
        self.buckets = buckets;
        self.world_history = world_history.into();
        self.ongoing = ongoing;
        self.active_events = active_world_events;
        self.enforce_retention();

        info!(
            target: "world_core::store",
            turn = self.turn,
            changes = self.history.len(),
            ongoing_effects = self.ongoing.len(),
            attributes = self.attributes.len(),
            "world_state.imported"
        );

        ImportReport {
            changes: self.history.len(),
            ongoing_effects: self.ongoing.len(),
            hash,
        }
    }

    pub fn export_json(&self) -> Result<String, SaveError> {
        encode_save_json(&self.export_state())
    }

    pub fn import_json(&mut self, data: &str) -> Result<ImportReport, SaveError> {
        let save = decode_save_json(data)?;
        Ok(self.import_state(save))
    }
}

/// Keep only bucket entries that point at a recognised category and a
/// record still present in history, in id order.
fn rebuild_buckets(
    history: &VecDeque<ChangeRecord>,
    entries: impl Iterator<Item = (ChangeCategory, ChangeId)>,
) -> BTreeMap<ChangeCategory, VecDeque<ChangeId>> {
    let mut buckets: BTreeMap<ChangeCategory, Vec<ChangeId>> = BTreeMap::new();
    for (category, id) in entries {
        if !category.is_recognized() {
            continue;
        }
        if history
            .binary_search_by_key(&id, |record| record.change_id)
            .is_ok()
        {
            buckets.entry(category).or_default().push(id);
        }
    }
    buckets
        .into_iter()
        .map(|(category, mut ids)| {
            ids.sort_unstable();
            ids.dedup();
            (category, ids.into())
        })
        .collect()
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WorldStateStore {
        WorldStateStore::default()
    }

    #[test]
    fn label_attributes_reject_arithmetic_but_accept_set() {
        let mut store = store();
        let outcome = store.apply_effect(&Effect::add("government_status", 1.0));
        assert!(matches!(
            outcome,
            EffectOutcome::Skipped(EffectRejection::LabelAttribute { .. })
        ));
        assert_eq!(
            store.attribute("government_status"),
            Some(&AttributeValue::from("stable"))
        );

        store.apply_effect(&Effect::set("government_status", 2.0));
        assert_eq!(store.get_attribute("government_status"), 2.0);
    }

    #[test]
    fn unset_attributes_start_from_zero() {
        let mut store = store();
        store.apply_effect(&Effect::add("npc_marcy_trust", 0.3));
        assert!((store.get_attribute("npc_marcy_trust") - 0.3).abs() < 1e-12);
        assert_eq!(store.get_attribute("never_written"), 0.0);
    }

    #[test]
    fn effects_without_target_are_skipped() {
        let mut store = store();
        let before = store.attributes().clone();
        let outcome = store.apply_effect(&Effect::add("", 1.0));
        assert_eq!(outcome, EffectOutcome::Skipped(EffectRejection::MissingTarget));
        let outcome = store.apply_effect(&Effect::world_event("  ", "HIGH"));
        assert!(outcome.is_skipped());
        assert_eq!(store.attributes(), &before);
        assert!(store.active_world_events().is_empty());
        assert_eq!(store.telemetry().effects_skipped, 2);
    }

    #[test]
    fn clock_reading_is_after_epoch() {
        assert!(now_ms() > 1_600_000_000_000);
    }

    #[test]
    fn non_finite_results_are_skipped() {
        let mut store = store();
        store.apply_effect(&Effect::set("public_awareness", f64::MAX));
        let outcome = store.apply_effect(&Effect::multiply("public_awareness", 10.0));
        assert!(matches!(
            outcome,
            EffectOutcome::Skipped(EffectRejection::NonFiniteResult { .. })
        ));
        assert_eq!(store.get_attribute("public_awareness"), f64::MAX);
    }

    #[test]
    fn unsupported_operation_is_skipped() {
        let mut store = store();
        let before = store.get_attribute("timeline_stability");
        let outcome = store.apply_effect(&Effect::attribute(
            "timeline_stability",
            EffectOperation::Unsupported,
            0.1,
        ));
        assert!(outcome.is_skipped());
        assert_eq!(store.get_attribute("timeline_stability"), before);
        assert_eq!(store.telemetry().effects_skipped, 1);
    }

    #[test]
    fn clamped_writes_are_counted() {
        let mut store = store();
        let outcome = store.apply_effect(&Effect::add("director_control", 5.0));
        assert!(matches!(outcome, EffectOutcome::Clamped { value, .. } if value == 1.0));
        assert_eq!(store.get_attribute("director_control"), 1.0);
        assert_eq!(store.telemetry().clamped_writes, 1);
    }

    #[test]
    fn world_state_updates_are_written_after_effects() {
        let mut store = store();
        store.submit_change(
            ChangeInput::new("government_actions", "Martial law declared")
                .with_immediate(vec![Effect::add("government_control", 0.05)])
                .with_update("government_status", "martial_law")
                .with_update("government_control", 3.0),
        );
        assert_eq!(
            store.attribute("government_status"),
            Some(&AttributeValue::from("martial_law"))
        );
        assert_eq!(store.get_attribute("government_control"), 1.0);
    }

    #[test]
    fn zero_duration_is_raised_to_one_turn() {
        let mut store = store();
        let id = store.submit_change(
            ChangeInput::new("team_decisions", "Abort")
                .with_ongoing(vec![Effect::add("protocol_violations", 1.0)])
                .with_duration(0),
        );
        assert_eq!(store.change(id).map(|record| record.duration), Some(1));
        store.advance_turn();
        assert_eq!(store.ongoing_effects().count(), 0);
        assert_eq!(store.get_attribute("protocol_violations"), 1.0);
    }

    #[test]
    fn retention_evicts_oldest_changes_but_ids_keep_climbing() {
        let config = WorldConfig::builtin().as_ref().clone().with_history_retention(Some(2));
        let mut store = WorldStateStore::new(Arc::new(config));
        for index in 0..4 {
            store.submit_change(ChangeInput::new("missions", format!("mission {index}")));
        }
        let ids: Vec<u64> = store.history().iter().map(|r| r.change_id.0).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(store.world_history().len(), 2);
        assert_eq!(
            store.get_changes_by_category(&ChangeCategory::Missions).len(),
            2
        );
        assert_eq!(store.telemetry().evicted_changes, 2);
        let next = store.submit_change(ChangeInput::new("missions", "mission 4"));
        assert_eq!(next, ChangeId(5));
    }

    #[test]
    fn wall_clock_expiry_uses_elapsed_time() {
        let config = WorldConfig::builtin()
            .as_ref()
            .clone()
            .with_world_event_expiry(WorldEventExpiry::WallClock { seconds: 3600 });
        let mut store = WorldStateStore::new(Arc::new(config));
        store.apply_effect_at(&Effect::world_event("seattle_police_alert", "HIGH"), 0);

        store.advance_turn_at(3_600_000);
        assert_eq!(store.active_world_events().len(), 1);

        store.advance_turn_at(3_600_001);
        assert!(store.active_world_events().is_empty());
        assert_eq!(store.telemetry().events_expired, 1);
    }

    #[test]
    fn turn_expiry_retires_events_after_window() {
        let mut store = store();
        store.apply_effect(&Effect::world_event("faction_operations", "UNCHECKED"));
        for _ in 0..3 {
            store.advance_turn();
        }
        assert_eq!(store.active_world_events().len(), 1);
        let report = store.advance_turn();
        assert_eq!(report.expired_events, 1);
        assert!(store.active_world_events().is_empty());
    }

    #[test]
    fn import_drops_spent_entries_and_repairs_counters() {
        let mut source = store();
        source.submit_change(
            ChangeInput::new("ai_actions", "Director reroutes a team")
                .with_ongoing(vec![Effect::add("director_control", 0.01)]),
        );
        let mut save = source.export_state();
        save.next_change_id = 0;
        save.next_effect_id = 0;
        save.change_categories = None;
        if let Some(entry) = save.ongoing_effects.values_mut().next() {
            entry.turns_remaining = 0;
        }

        let mut target = store();
        let report = target.import_state(save);
        assert!(matches!(report.hash, HashCheck::Mismatch { .. }));
        assert_eq!(report.ongoing_effects, 0);
        assert_eq!(
            target
                .get_changes_by_category(&ChangeCategory::AiActions)
                .len(),
            1
        );
        let next = target.submit_change(ChangeInput::new("ai_actions", "again"));
        assert_eq!(next, ChangeId(2));
    }
}
