//! Tracing layer that forwards store events to an in-process channel.
//!
//! Hosts embedding the engine subscribe to the receiver to surface skipped
//! effects and expiry notices without scraping formatted log output.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::store::now_ms;

#[derive(Debug, Clone, Serialize)]
pub struct LogEnvelope {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogEnvelope {
    pub fn is_warning(&self) -> bool {
        self.level == Level::WARN.as_str() || self.level == Level::ERROR.as_str()
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

#[derive(Clone)]
pub struct LogForwardLayer {
    sender: Sender<LogEnvelope>,
    /// Only events whose target starts with this prefix are forwarded.
    target_prefix: Option<&'static str>,
}

/// Layer plus the receiving end, scoped to `world_core` targets.
pub fn log_channel() -> (LogForwardLayer, Receiver<LogEnvelope>) {
    let (sender, receiver) = unbounded();
    (
        LogForwardLayer::new(sender).with_target_prefix("world_core"),
        receiver,
    )
}

impl LogForwardLayer {
    pub fn new(sender: Sender<LogEnvelope>) -> Self {
        Self {
            sender,
            target_prefix: None,
        }
    }

    pub fn with_target_prefix(mut self, prefix: &'static str) -> Self {
        self.target_prefix = Some(prefix);
        self
    }
}

impl<S> Layer<S> for LogForwardLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if let Some(prefix) = self.target_prefix {
            if !metadata.target().starts_with(prefix) {
                return;
            }
        }
        let mut visitor = EnvelopeVisitor::default();
        event.record(&mut visitor);
        let envelope = LogEnvelope {
            timestamp_ms: now_ms(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message: visitor
                .message
                .unwrap_or_else(|| metadata.target().to_string()),
            fields: visitor.fields,
        };
        // Receiver gone means nobody is listening any more.
        let _ = self.sender.send(envelope);
    }
}

#[derive(Default)]
struct EnvelopeVisitor {
    message: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl EnvelopeVisitor {
    fn record_value(&mut self, field: &Field, value: serde_json::Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for EnvelopeVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.record_value(field, serde_json::Value::Number(number));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_value(field, format!("{value:?}").into());
    }
}
