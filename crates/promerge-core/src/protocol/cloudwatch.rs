//! CloudWatch Logs subscription envelope (JSON).
//!
//! Records arrive already decompressed; each log event message is expected to
//! be a JSON object carrying exposition text in a configurable string field.

use serde::Deserialize;

/// Message type of data-bearing envelopes.
pub const DATA_MESSAGE: &str = "DATA_MESSAGE";

/// Field of a log event message holding exposition text, unless configured.
pub const DEFAULT_PAYLOAD_FIELD: &str = "prometheus_text";

/// Subscription filter record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEnvelope {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub log_group: String,
    #[serde(default)]
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    /// `DATA_MESSAGE` or `CONTROL_MESSAGE`.
    pub message_type: String,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub message: String,
}

impl SubscriptionEnvelope {
    pub fn is_data(&self) -> bool {
        self.message_type == DATA_MESSAGE
    }
}

/// Exposition texts carried by the envelope's log events, in event order.
///
/// Control envelopes yield nothing. Messages that are not JSON objects, or
/// lack a string `field`, are skipped.
pub fn extract_exposition(envelope: &SubscriptionEnvelope, field: &str) -> Vec<String> {
    if !envelope.is_data() {
        return Vec::new();
    }

    envelope
        .log_events
        .iter()
        .filter_map(|event| {
            let Ok(msg) = serde_json::from_str::<serde_json::Value>(&event.message) else {
                tracing::trace!(id = %event.id, "log event is not json");
                return None;
            };
            msg.get(field)?.as_str().map(str::to_string)
        })
        .collect()
}
