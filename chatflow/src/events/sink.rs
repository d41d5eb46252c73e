//! Lifecycle event sinks.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn, Level};

/// Receives the lifecycle events a [`crate::pipeline::PipelineRunner`] emits.
///
/// Payloads are JSON objects; every event carries `event_id`, and stage
/// events also carry `stage`. Sinks must not fail; anything they cannot
/// deliver is dropped.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    async fn emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}
}

fn payload_str<'a>(data: Option<&'a Value>, key: &str) -> &'a str {
    data.and_then(|data| data.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Writes lifecycle events to `tracing`, keyed by event id and stage.
///
/// `stage.failed` is always logged at `warn`; everything else at the
/// configured level.
#[derive(Debug, Clone, Copy)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::debug()
    }
}

impl LoggingEventSink {
    /// Logs lifecycle events at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Logs lifecycle events at `debug`.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Returns the level used for non-failure events.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        let data = data.as_ref();
        let event_id = payload_str(data, "event_id");
        let stage = payload_str(data, "stage");

        if event_type == "stage.failed" {
            let error = payload_str(data, "error");
            warn!(event_type, event_id, stage, error, "Pipeline event");
        } else if self.level == Level::DEBUG || self.level == Level::TRACE {
            debug!(event_type, event_id, stage, "Pipeline event");
        } else {
            info!(event_type, event_id, stage, "Pipeline event");
        }
    }
}

/// One event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event type, e.g. `stage.completed`.
    pub event_type: String,
    /// Payload as emitted.
    pub data: Option<Value>,
}

impl RecordedEvent {
    /// The `stage` the event refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.data.as_ref()?.get("stage")?.as_str()
    }
}

/// Keeps every event in memory. Used by tests to assert on lifecycle order.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured event, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Returns the captured event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Returns the events whose type starts with `prefix`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_collecting_sink_keeps_order_and_stage() {
        let sink = CollectingEventSink::new();
        sink.emit("pipeline.started", Some(json!({"event_id": "e1"})))
            .await;
        sink.emit("stage.started", Some(json!({"event_id": "e1", "stage": "emote"})))
            .await;
        sink.emit("stage.completed", Some(json!({"event_id": "e1", "stage": "emote"})))
            .await;

        assert_eq!(
            sink.event_types(),
            vec!["pipeline.started", "stage.started", "stage.completed"]
        );
        let stage_events = sink.events_of_type("stage.");
        assert_eq!(stage_events.len(), 2);
        assert_eq!(stage_events[0].stage(), Some("emote"));
        assert_eq!(sink.events()[0].stage(), None);
    }

    #[test]
    fn test_payload_str_tolerates_missing_fields() {
        let data = json!({"event_id": "e1", "stage": 3});
        assert_eq!(payload_str(Some(&data), "event_id"), "e1");
        assert_eq!(payload_str(Some(&data), "stage"), "");
        assert_eq!(payload_str(None, "event_id"), "");
    }

    #[tokio::test]
    async fn test_logging_sink_accepts_all_shapes() {
        let sink = LoggingEventSink::default();
        assert_eq!(sink.level(), Level::DEBUG);

        sink.emit("stage.failed", Some(json!({"stage": "xp", "error": "down"})))
            .await;
        LoggingEventSink::new(Level::INFO)
            .emit("pipeline.completed", None)
            .await;
        NoOpEventSink.emit("pipeline.started", None).await;
    }
}
