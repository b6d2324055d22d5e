use crate::event::ChatEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded match of one event against one interceptor
///
/// Hits are created only by the ingestion worker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptorHit {
    /// Server the matching event arrived on
    pub server_id: String,
    /// Interceptor that matched
    pub interceptor_id: String,
    /// Interceptor name at match time
    pub interceptor_name: String,
    /// When the hit was recorded
    pub at: DateTime<Utc>,
    /// Channel of the event
    pub channel: String,
    /// Sender nick
    pub from_nick: String,
    /// Sender hostmask
    pub from_hostmask: String,
    /// Canonical lower-case event type
    pub event_type: String,
    /// Label of the rule that matched
    pub reason: String,
    /// Raw event payload
    pub text: String,
}

impl InterceptorHit {
    /// Build a hit from the event and the matching interceptor/rule
    pub fn from_event(
        event: &ChatEvent,
        interceptor_id: impl Into<String>,
        interceptor_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            server_id: event.server_id.clone(),
            interceptor_id: interceptor_id.into(),
            interceptor_name: interceptor_name.into(),
            at: Utc::now(),
            channel: event.channel.clone(),
            from_nick: event.from_nick.clone(),
            from_hostmask: event.from_hostmask.clone(),
            event_type: event.event_type.as_str().to_string(),
            reason: reason.into(),
            text: event.text.clone(),
        }
    }
}
