use std::fmt;

use serde::{Deserialize, Serialize};

/// Bucket a tracked change is filed under.
///
/// Any label outside the known set is preserved verbatim as
/// [`ChangeCategory::Unrecognized`] so it still round-trips through saves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeCategory {
    Missions,
    HostBodyEvents,
    NpcInteractions,
    HackingOperations,
    FactionActivities,
    GovernmentActions,
    TimelineEvents,
    TeamDecisions,
    ResourceChanges,
    WorldEvents,
    AiActions,
    PlayerActions,
    Unrecognized(String),
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 12] = [
        ChangeCategory::Missions,
        ChangeCategory::HostBodyEvents,
        ChangeCategory::NpcInteractions,
        ChangeCategory::HackingOperations,
        ChangeCategory::FactionActivities,
        ChangeCategory::GovernmentActions,
        ChangeCategory::TimelineEvents,
        ChangeCategory::TeamDecisions,
        ChangeCategory::ResourceChanges,
        ChangeCategory::WorldEvents,
        ChangeCategory::AiActions,
        ChangeCategory::PlayerActions,
    ];

    pub fn parse(value: &str) -> Self {
        match value {
            "missions" => ChangeCategory::Missions,
            "host_body_events" => ChangeCategory::HostBodyEvents,
            "npc_interactions" => ChangeCategory::NpcInteractions,
            "hacking_operations" => ChangeCategory::HackingOperations,
            "faction_activities" => ChangeCategory::FactionActivities,
            "government_actions" => ChangeCategory::GovernmentActions,
            "timeline_events" => ChangeCategory::TimelineEvents,
            "team_decisions" => ChangeCategory::TeamDecisions,
            "resource_changes" => ChangeCategory::ResourceChanges,
            "world_events" => ChangeCategory::WorldEvents,
            "ai_actions" => ChangeCategory::AiActions,
            "player_actions" => ChangeCategory::PlayerActions,
            other => ChangeCategory::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangeCategory::Missions => "missions",
            ChangeCategory::HostBodyEvents => "host_body_events",
            ChangeCategory::NpcInteractions => "npc_interactions",
            ChangeCategory::HackingOperations => "hacking_operations",
            ChangeCategory::FactionActivities => "faction_activities",
            ChangeCategory::GovernmentActions => "government_actions",
            ChangeCategory::TimelineEvents => "timeline_events",
            ChangeCategory::TeamDecisions => "team_decisions",
            ChangeCategory::ResourceChanges => "resource_changes",
            ChangeCategory::WorldEvents => "world_events",
            ChangeCategory::AiActions => "ai_actions",
            ChangeCategory::PlayerActions => "player_actions",
            ChangeCategory::Unrecognized(label) => label.as_str(),
        }
    }

    /// Whether changes in this category get a per-category bucket.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ChangeCategory::Unrecognized(_))
    }
}

impl Default for ChangeCategory {
    fn default() -> Self {
        ChangeCategory::Unrecognized("unknown".to_string())
    }
}

impl From<String> for ChangeCategory {
    fn from(value: String) -> Self {
        match ChangeCategory::parse(&value) {
            ChangeCategory::Unrecognized(_) => ChangeCategory::Unrecognized(value),
            known => known,
        }
    }
}

impl From<&str> for ChangeCategory {
    fn from(value: &str) -> Self {
        ChangeCategory::parse(value)
    }
}

impl From<ChangeCategory> for String {
    fn from(value: ChangeCategory) -> Self {
        match value {
            ChangeCategory::Unrecognized(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
