use std::fmt;

use serde::{Deserialize, Serialize};

/// Arithmetic applied by an attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOperation {
    #[default]
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Any operation name this build does not know about.
    #[serde(other)]
    Unsupported,
}

impl EffectOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectOperation::Set => "set",
            EffectOperation::Add => "add",
            EffectOperation::Subtract => "subtract",
            EffectOperation::Multiply => "multiply",
            EffectOperation::Divide => "divide",
            EffectOperation::Unsupported => "unsupported",
        }
    }
}

/// Raw payload carried by an effect, as authored by the narrative layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl EffectValue {
    /// Numeric reading of the payload. Numeric-looking text is coerced;
    /// non-finite numbers are rejected.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            EffectValue::Number(value) => *value,
            EffectValue::Text(text) => text.trim().parse::<f64>().ok()?,
            EffectValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn label(&self) -> String {
        match self {
            EffectValue::Number(value) => value.to_string(),
            EffectValue::Text(text) => text.clone(),
            EffectValue::Other(value) => value.to_string(),
        }
    }
}

/// A missing payload reads as JSON `null` and is rejected when applied.
impl Default for EffectValue {
    fn default() -> Self {
        EffectValue::Other(serde_json::Value::Null)
    }
}

impl From<f64> for EffectValue {
    fn from(value: f64) -> Self {
        EffectValue::Number(value)
    }
}

impl From<&str> for EffectValue {
    fn from(value: &str) -> Self {
        EffectValue::Text(value.to_string())
    }
}

impl From<String> for EffectValue {
    fn from(value: String) -> Self {
        EffectValue::Text(value)
    }
}

impl fmt::Display for EffectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A single instruction applied against the world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    AttributeChange {
        #[serde(default)]
        target: String,
        #[serde(default)]
        value: EffectValue,
        #[serde(default)]
        operation: EffectOperation,
    },
    WorldEvent {
        #[serde(default)]
        target: String,
        #[serde(default)]
        value: EffectValue,
    },
    /// Effect kinds this build does not recognise; skipped when applied.
    #[serde(other)]
    Unsupported,
}

impl Effect {
    pub fn attribute(
        target: impl Into<String>,
        operation: EffectOperation,
        value: impl Into<EffectValue>,
    ) -> Self {
        Effect::AttributeChange {
            target: target.into(),
            value: value.into(),
            operation,
        }
    }

    pub fn set(target: impl Into<String>, value: f64) -> Self {
        Effect::attribute(target, EffectOperation::Set, value)
    }

    pub fn add(target: impl Into<String>, value: f64) -> Self {
        Effect::attribute(target, EffectOperation::Add, value)
    }

    pub fn subtract(target: impl Into<String>, value: f64) -> Self {
        Effect::attribute(target, EffectOperation::Subtract, value)
    }

    pub fn multiply(target: impl Into<String>, value: f64) -> Self {
        Effect::attribute(target, EffectOperation::Multiply, value)
    }

    pub fn divide(target: impl Into<String>, value: f64) -> Self {
        Effect::attribute(target, EffectOperation::Divide, value)
    }

    pub fn world_event(target: impl Into<String>, value: impl Into<EffectValue>) -> Self {
        Effect::WorldEvent {
            target: target.into(),
            value: value.into(),
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Effect::AttributeChange { target, .. } | Effect::WorldEvent { target, .. } => {
                Some(target.as_str())
            }
            Effect::Unsupported => None,
        }
    }

    /// Narrative callers tag adverse effects by mentioning "negative" in the
    /// target or a text payload.
    pub fn is_tagged_negative(&self) -> bool {
        match self {
            Effect::AttributeChange { target, value, .. } | Effect::WorldEvent { target, value } => {
                target.contains("negative")
                    || matches!(value, EffectValue::Text(text) if text.contains("negative"))
            }
            Effect::Unsupported => false,
        }
    }
}

/// Value stored under an attribute key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Numeric(f64),
    Label(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Numeric(value) => Some(*value),
            AttributeValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            AttributeValue::Numeric(_) => None,
            AttributeValue::Label(label) => Some(label.as_str()),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Numeric(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Label(value.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Numeric(value) => write!(f, "{:.4}", value),
            AttributeValue::Label(label) => f.write_str(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_change_defaults_to_set() {
        let effect: Effect = serde_json::from_str(
            r#"{"type":"attribute_change","target":"timeline_stability","value":0.5}"#,
        )
        .unwrap();
        assert_eq!(effect, Effect::set("timeline_stability", 0.5));
    }

    #[test]
    fn unknown_effect_type_and_operation_do_not_fail_parsing() {
        let effects: Vec<Effect> = serde_json::from_str(
            r#"[
                {"type":"teleport","target":"x","value":1},
                {"type":"attribute_change","target":"x","value":1,"operation":"exponentiate"}
            ]"#,
        )
        .unwrap();
        assert_eq!(effects[0], Effect::Unsupported);
        assert!(matches!(
            effects[1],
            Effect::AttributeChange {
                operation: EffectOperation::Unsupported,
                ..
            }
        ));
    }

    #[test]
    fn missing_target_or_value_still_parses() {
        let effects: Vec<Effect> = serde_json::from_str(
            r#"[
                {"type":"attribute_change","target":"x"},
                {"type":"world_event","value":"HIGH"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            effects[0],
            Effect::attribute("x", EffectOperation::Set, EffectValue::default())
        );
        assert_eq!(effects[1].target(), Some(""));
    }

    #[test]
    fn numeric_text_is_coerced() {
        assert_eq!(EffectValue::from(" 0.25 ").as_number(), Some(0.25));
        assert_eq!(EffectValue::from("not_a_number").as_number(), None);
        assert_eq!(EffectValue::from("NaN").as_number(), None);
        assert_eq!(EffectValue::Other(serde_json::Value::Bool(true)).as_number(), None);
    }

    #[test]
    fn odd_payloads_fall_into_other() {
        let effect: Effect =
            serde_json::from_str(r#"{"type":"world_event","target":"alert","value":null}"#)
                .unwrap();
        assert_eq!(
            effect,
            Effect::world_event("alert", EffectValue::Other(serde_json::Value::Null))
        );
    }

    #[test]
    fn negative_tag_checks_target_and_text() {
        assert!(Effect::add("negative_press", 0.1).is_tagged_negative());
        assert!(Effect::world_event("press", "negative coverage").is_tagged_negative());
        assert!(!Effect::add("timeline_stability", -0.4).is_tagged_negative());
    }

    #[test]
    fn attribute_values_are_untagged() {
        let values: Vec<AttributeValue> = serde_json::from_str(r#"[0.85, "stable"]"#).unwrap();
        assert_eq!(values[0], AttributeValue::Numeric(0.85));
        assert_eq!(values[1].as_label(), Some("stable"));
    }
}
