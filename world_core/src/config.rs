use std::{
    collections::{BTreeMap, BTreeSet},
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;
use world_proto::{AttributeValue, ChangeCategory};

pub const BUILTIN_WORLD_CONFIG: &str = include_str!("data/world_config.json");

/// Clock used to retire active world events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "clock", rename_all = "snake_case")]
pub enum WorldEventExpiry {
    /// Retire once more than `turns` turns have passed since the event started.
    Turns { turns: u64 },
    /// Retire once more than `seconds` of wall-clock time have elapsed.
    WallClock { seconds: u64 },
}

impl Default for WorldEventExpiry {
    fn default() -> Self {
        WorldEventExpiry::Turns { turns: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    unstable_negative_effects: usize,
    critical_negative_effects: usize,
}

impl StatusThresholds {
    pub fn unstable_negative_effects(&self) -> usize {
        self.unstable_negative_effects
    }

    pub fn critical_negative_effects(&self) -> usize {
        self.critical_negative_effects
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            unstable_negative_effects: 1,
            critical_negative_effects: 3,
        }
    }
}

/// Attributes that are always clamped to [0, 1], whatever a config file says.
pub const REQUIRED_BOUNDED_ATTRIBUTES: [&str; 7] = [
    "timeline_stability",
    "director_control",
    "faction_influence",
    "government_control",
    "national_security",
    "consciousness_stability",
    "host_body_survival",
];

/// One config file as written on disk. Every key is optional and is layered
/// over the builtin table: maps merge key by key, scalars replace.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorldConfigLayer {
    default_attributes: BTreeMap<String, AttributeValue>,
    bounded_attributes: Option<BTreeSet<String>>,
    category_durations: BTreeMap<ChangeCategory, u32>,
    failure_durations: BTreeMap<ChangeCategory, u32>,
    fallback_duration: Option<u32>,
    world_event_expiry: Option<WorldEventExpiry>,
    history_retention: Option<usize>,
    recent_turn_window: Option<u64>,
    status: Option<StatusThresholds>,
}

#[derive(Debug, Clone)]
pub struct WorldConfig {
    default_attributes: BTreeMap<String, AttributeValue>,
    bounded_attributes: BTreeSet<String>,
    category_durations: BTreeMap<ChangeCategory, u32>,
    failure_durations: BTreeMap<ChangeCategory, u32>,
    fallback_duration: u32,
    world_event_expiry: WorldEventExpiry,
    history_retention: Option<usize>,
    recent_turn_window: u64,
    status: StatusThresholds,
}

impl WorldConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(Self::builtin_owned())
    }

    fn builtin_owned() -> Self {
        let layer: WorldConfigLayer =
            serde_json::from_str(BUILTIN_WORLD_CONFIG).expect("builtin world config should parse");
        let mut config = WorldConfig::baseline();
        config.apply(layer);
        config
    }

    /// Parse a config file and layer it over the builtin table.
    pub fn from_json_str(json: &str) -> Result<Self, WorldConfigError> {
        let layer: WorldConfigLayer = serde_json::from_str(json)?;
        let mut config = WorldConfig::builtin_owned();
        config.apply(layer);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, layer: WorldConfigLayer) {
        self.default_attributes.extend(layer.default_attributes);
        if let Some(bounded) = layer.bounded_attributes {
            self.bounded_attributes = bounded;
        }
        self.category_durations.extend(layer.category_durations);
        self.failure_durations.extend(layer.failure_durations);
        if let Some(fallback) = layer.fallback_duration {
            self.fallback_duration = fallback;
        }
        if let Some(expiry) = layer.world_event_expiry {
            self.world_event_expiry = expiry;
        }
        if let Some(retention) = layer.history_retention {
            self.history_retention = Some(retention);
        }
        if let Some(window) = layer.recent_turn_window {
            self.recent_turn_window = window;
        }
        if let Some(status) = layer.status {
            self.status = status;
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, WorldConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| WorldConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        WorldConfig::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), WorldConfigError> {
        if let Some(missing) = REQUIRED_BOUNDED_ATTRIBUTES
            .iter()
            .find(|attribute| !self.is_bounded(attribute))
        {
            return Err(WorldConfigError::MissingBoundedAttribute {
                attribute: missing.to_string(),
            });
        }
        if self.fallback_duration == 0 {
            return Err(WorldConfigError::ZeroDuration {
                category: "fallback".to_string(),
            });
        }
        for (category, duration) in self
            .category_durations
            .iter()
            .chain(self.failure_durations.iter())
        {
            if *duration == 0 {
                return Err(WorldConfigError::ZeroDuration {
                    category: category.to_string(),
                });
            }
        }
        for (attribute, value) in &self.default_attributes {
            if let Some(number) = value.as_f64() {
                if self.is_bounded(attribute) && !(0.0..=1.0).contains(&number) {
                    return Err(WorldConfigError::DefaultOutOfBounds {
                        attribute: attribute.clone(),
                        value: number,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn default_attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.default_attributes
    }

    pub fn is_bounded(&self, attribute: &str) -> bool {
        self.bounded_attributes.contains(attribute)
    }

    pub fn bounded_attributes(&self) -> impl Iterator<Item = &str> {
        self.bounded_attributes.iter().map(String::as_str)
    }

    /// Turns an ongoing effect lasts when the caller does not say otherwise.
    pub fn default_duration(&self, category: &ChangeCategory) -> u32 {
        self.category_durations
            .get(category)
            .copied()
            .unwrap_or(self.fallback_duration)
    }

    /// Failed outcomes linger longer for categories that define an override.
    pub fn failure_duration(&self, category: &ChangeCategory) -> u32 {
        self.failure_durations
            .get(category)
            .copied()
            .unwrap_or_else(|| self.default_duration(category))
    }

    pub fn fallback_duration(&self) -> u32 {
        self.fallback_duration
    }

    pub fn world_event_expiry(&self) -> WorldEventExpiry {
        self.world_event_expiry
    }

    pub fn history_retention(&self) -> Option<usize> {
        self.history_retention
    }

    pub fn recent_turn_window(&self) -> u64 {
        self.recent_turn_window
    }

    pub fn status(&self) -> &StatusThresholds {
        &self.status
    }

    pub fn with_history_retention(mut self, retention: Option<usize>) -> Self {
        self.history_retention = retention;
        self
    }

    pub fn with_world_event_expiry(mut self, expiry: WorldEventExpiry) -> Self {
        self.world_event_expiry = expiry;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig::builtin_owned()
    }
}

impl WorldConfig {
    /// Code-level fallback the builtin file is layered over. Carries no
    /// attribute defaults of its own.
    fn baseline() -> Self {
        let bounded_attributes = REQUIRED_BOUNDED_ATTRIBUTES
            .into_iter()
            .map(str::to_string)
            .collect();

        let category_durations = [
            (ChangeCategory::Missions, 3),
            (ChangeCategory::HostBodyEvents, 2),
            (ChangeCategory::NpcInteractions, 4),
            (ChangeCategory::HackingOperations, 2),
            (ChangeCategory::FactionActivities, 6),
            (ChangeCategory::GovernmentActions, 5),
            (ChangeCategory::TimelineEvents, 8),
            (ChangeCategory::TeamDecisions, 4),
            (ChangeCategory::ResourceChanges, 1),
            (ChangeCategory::WorldEvents, 3),
            (ChangeCategory::AiActions, 4),
            (ChangeCategory::PlayerActions, 2),
        ]
        .into_iter()
        .collect();

        let failure_durations = [
            (ChangeCategory::Missions, 5),
            (ChangeCategory::HackingOperations, 3),
        ]
        .into_iter()
        .collect();

        Self {
            default_attributes: BTreeMap::new(),
            bounded_attributes,
            category_durations,
            failure_durations,
            fallback_duration: 5,
            world_event_expiry: WorldEventExpiry::default(),
            history_retention: None,
            recent_turn_window: 5,
            status: StatusThresholds::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorldConfigError {
    #[error("failed to parse world config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("duration for {category} must be at least one turn")]
    ZeroDuration { category: String },
    #[error("{attribute} must stay in the bounded attribute set")]
    MissingBoundedAttribute { attribute: String },
    #[error("default for bounded attribute {attribute} is {value}, outside [0, 1]")]
    DefaultOutOfBounds { attribute: String, value: f64 },
}

#[derive(Resource, Debug, Clone)]
pub struct WorldConfigHandle(Arc<WorldConfig>);

impl WorldConfigHandle {
    pub fn new(config: Arc<WorldConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<WorldConfig> {
        Arc::clone(&self.0)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct WorldConfigMetadata {
    path: Option<PathBuf>,
}

impl WorldConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_world_config_from_env() -> (Arc<WorldConfig>, WorldConfigMetadata) {
    let override_path = env::var("WORLD_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/world_config.json");

    let path = override_path.unwrap_or(default_path);
    match WorldConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "world_core::config",
                path = %path.display(),
                "world_config.loaded=file"
            );
            return (Arc::new(config), WorldConfigMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "world_core::config",
                path = %path.display(),
                error = %err,
                "world_config.load_failed"
            );
        }
    }

    let config = WorldConfig::builtin();
    tracing::info!(target: "world_core::config", "world_config.loaded=builtin");
    (config, WorldConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_published_defaults() {
        let config = WorldConfig::builtin();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_attributes().len(), 20);
        assert_eq!(
            config.default_attributes().get("faction_influence"),
            Some(&AttributeValue::Numeric(0.23))
        );
        assert_eq!(config.bounded_attributes().count(), 7);
        assert_eq!(config.default_duration(&ChangeCategory::TimelineEvents), 8);
        assert_eq!(config.failure_duration(&ChangeCategory::HackingOperations), 3);
        assert_eq!(config.failure_duration(&ChangeCategory::PlayerActions), 2);
        assert_eq!(
            config.default_duration(&ChangeCategory::parse("bogus")),
            config.fallback_duration()
        );
        assert_eq!(
            config.world_event_expiry(),
            WorldEventExpiry::Turns { turns: 3 }
        );
        assert_eq!(config.history_retention(), None);
    }

    #[test]
    fn builtin_durations_match_code_defaults() {
        let builtin = WorldConfig::builtin();
        let fallback = WorldConfig::baseline();
        for category in ChangeCategory::ALL {
            assert_eq!(
                builtin.default_duration(&category),
                fallback.default_duration(&category),
                "duration mismatch for {category}"
            );
        }
    }

    #[test]
    fn zero_durations_are_rejected() {
        let err = WorldConfig::from_json_str(r#"{"category_durations":{"missions":0}}"#)
            .expect_err("zero duration should fail validation");
        assert!(matches!(err, WorldConfigError::ZeroDuration { .. }));
    }

    #[test]
    fn out_of_range_bounded_defaults_are_rejected() {
        let err = WorldConfig::from_json_str(
            r#"{"default_attributes":{"timeline_stability":1.5}}"#,
        )
        .expect_err("bounded default above 1 should fail validation");
        assert!(matches!(err, WorldConfigError::DefaultOutOfBounds { .. }));
    }

    #[test]
    fn partial_file_keeps_builtin_tables() {
        let config = WorldConfig::from_json_str(
            r#"{
                "default_attributes": {"faction_influence": 0.4, "safehouse_count": 2.0},
                "category_durations": {"missions": 4},
                "failure_durations": {"missions": 6}
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_attributes().len(), 21);
        assert_eq!(
            config.default_attributes().get("faction_influence"),
            Some(&AttributeValue::Numeric(0.4))
        );
        assert_eq!(
            config.default_attributes().get("timeline_stability"),
            Some(&AttributeValue::Numeric(0.85))
        );
        assert_eq!(config.default_duration(&ChangeCategory::Missions), 4);
        assert_eq!(config.default_duration(&ChangeCategory::TimelineEvents), 8);
        assert_eq!(config.failure_duration(&ChangeCategory::Missions), 6);
        assert_eq!(config.failure_duration(&ChangeCategory::HackingOperations), 3);
        assert_eq!(config.bounded_attributes().count(), 7);
    }

    #[test]
    fn bounded_set_must_keep_core_attributes() {
        let err = WorldConfig::from_json_str(
            r#"{"bounded_attributes":["timeline_stability"],"category_durations":{"missions":3}}"#,
        )
        .expect_err("dropping core bounded attributes should fail validation");
        assert!(matches!(
            err,
            WorldConfigError::MissingBoundedAttribute { ref attribute } if attribute == "director_control"
        ));

        let widened = WorldConfig::from_json_str(
            r#"{"bounded_attributes":[
                "timeline_stability", "director_control", "faction_influence",
                "government_control", "national_security", "consciousness_stability",
                "host_body_survival", "civilian_safety"
            ]}"#,
        )
        .unwrap();
        assert!(widened.is_bounded("civilian_safety"));
    }

    #[test]
    fn default_is_the_builtin_table() {
        let config = WorldConfig::default();
        assert_eq!(config.default_attributes().len(), 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn wall_clock_expiry_parses() {
        let config = WorldConfig::from_json_str(
            r#"{"world_event_expiry":{"clock":"wall_clock","seconds":3600}}"#,
        )
        .unwrap();
        assert_eq!(
            config.world_event_expiry(),
            WorldEventExpiry::WallClock { seconds: 3600 }
        );
    }
}
