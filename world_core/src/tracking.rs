//! Convenience entry points that package a domain event into a change.
//!
//! Each `track_*` function fills in the category, a readable description and
//! the event-specific details, then submits through
//! [`WorldStateStore::submit_change`]. Durations come from the store's
//! [`WorldConfig`](crate::config::WorldConfig) table unless a failure
//! override applies.

use world_proto::{ChangeCategory, ChangeId, ChangeInput, Effect, WorldSave};

use crate::store::{ImportReport, WorldStateStore};
use crate::summary::{ActiveEffectsSummary, TurnReport, WorldSummary};

fn outcome_word(success: bool) -> &'static str {
    if success {
        "Successful"
    } else {
        "Failed"
    }
}

pub fn track_mission_outcome(
    store: &mut WorldStateStore,
    mission_type: &str,
    success: bool,
    location: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let category = ChangeCategory::Missions;
    let mut input = ChangeInput::new(
        category.clone(),
        format!("{} {mission_type} mission at {location}", outcome_word(success)),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("mission_type", mission_type)
    .with_detail("success", success)
    .with_detail("location", location);
    if !success {
        input = input.with_duration(store.config().failure_duration(&category));
    }
    store.submit_change(input)
}

pub fn track_host_body_event(
    store: &mut WorldStateStore,
    event_type: &str,
    host_name: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::HostBodyEvents,
        format!("Host body event: {event_type} for {host_name}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("event_type", event_type)
    .with_detail("host_name", host_name);
    store.submit_change(input)
}

/// Always registers an ongoing `npc_<name>_trust` adjustment.
pub fn track_npc_interaction(
    store: &mut WorldStateStore,
    npc_name: &str,
    interaction_type: &str,
    relationship_change: f64,
    effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::NpcInteractions,
        format!("NPC interaction: {interaction_type} with {npc_name}"),
    )
    .with_immediate(effects)
    .with_ongoing(vec![Effect::add(
        format!("npc_{npc_name}_trust"),
        relationship_change,
    )])
    .with_detail("npc_name", npc_name)
    .with_detail("interaction_type", interaction_type)
    .with_detail("relationship_change", relationship_change);
    store.submit_change(input)
}

pub fn track_hacking_operation(
    store: &mut WorldStateStore,
    operation_type: &str,
    target: &str,
    success: bool,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let category = ChangeCategory::HackingOperations;
    let mut input = ChangeInput::new(
        category.clone(),
        format!(
            "{} hacking operation: {operation_type} on {target}",
            outcome_word(success)
        ),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("operation_type", operation_type)
    .with_detail("target", target)
    .with_detail("success", success);
    if !success {
        input = input.with_duration(store.config().failure_duration(&category));
    }
    store.submit_change(input)
}

pub fn track_faction_activity(
    store: &mut WorldStateStore,
    activity_type: &str,
    location: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::FactionActivities,
        format!("Faction activity: {activity_type} at {location}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("activity_type", activity_type)
    .with_detail("location", location);
    store.submit_change(input)
}

pub fn track_government_action(
    store: &mut WorldStateStore,
    action_type: &str,
    target: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::GovernmentActions,
        format!("Government action: {action_type} targeting {target}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("action_type", action_type)
    .with_detail("target", target);
    store.submit_change(input)
}

pub fn track_timeline_event(
    store: &mut WorldStateStore,
    event_type: &str,
    magnitude: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::TimelineEvents,
        format!("Timeline event: {event_type} (magnitude: {magnitude})"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("event_type", event_type)
    .with_detail("magnitude", magnitude);
    store.submit_change(input)
}

pub fn track_team_decision(
    store: &mut WorldStateStore,
    decision_type: &str,
    consequences: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::TeamDecisions,
        format!("Team decision: {decision_type}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("decision_type", decision_type)
    .with_detail("consequences", consequences);
    store.submit_change(input)
}

/// Resource changes are immediate only; no ongoing effects are registered.
pub fn track_resource_change(
    store: &mut WorldStateStore,
    resource_type: &str,
    amount: f64,
    reason: &str,
    effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::ResourceChanges,
        format!("Resource change: {amount} {resource_type} ({reason})"),
    )
    .with_immediate(effects)
    .with_detail("resource_type", resource_type)
    .with_detail("amount", amount)
    .with_detail("reason", reason);
    store.submit_change(input)
}

pub fn track_world_event(
    store: &mut WorldStateStore,
    event_type: &str,
    description: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::WorldEvents,
        format!("World event: {description}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("event_type", event_type);
    store.submit_change(input)
}

pub fn track_ai_action(
    store: &mut WorldStateStore,
    ai_type: &str,
    action: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::AiActions,
        format!("AI action: {ai_type} performs {action}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("ai_type", ai_type)
    .with_detail("action", action);
    store.submit_change(input)
}

pub fn track_player_action(
    store: &mut WorldStateStore,
    action_type: &str,
    target: &str,
    effects: Vec<Effect>,
    ongoing_effects: Vec<Effect>,
) -> ChangeId {
    let input = ChangeInput::new(
        ChangeCategory::PlayerActions,
        format!("Player action: {action_type} on {target}"),
    )
    .with_immediate(effects)
    .with_ongoing(ongoing_effects)
    .with_detail("action_type", action_type)
    .with_detail("target", target);
    store.submit_change(input)
}

pub fn process_game_turn(store: &mut WorldStateStore) -> TurnReport {
    store.advance_turn()
}

pub fn get_current_world_status(store: &WorldStateStore) -> WorldSummary {
    store.get_world_summary()
}

pub fn get_active_effects(store: &WorldStateStore) -> ActiveEffectsSummary {
    store.get_active_effects_summary()
}

pub fn export_game_state(store: &WorldStateStore) -> WorldSave {
    store.export_state()
}

pub fn import_game_state(store: &mut WorldStateStore, save: WorldSave) -> ImportReport {
    store.import_state(save)
}
