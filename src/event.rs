//! Chat events as seen by the interceptor engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of chat-protocol event an interceptor rule can filter on
///
/// The canonical text form is lower-case (`"message"`, `"join"`, ...) and is
/// shared by rule `event_types` filters and [`crate::InterceptorHit::event_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterceptorEventType {
    /// Channel or private message
    Message,
    /// Notice
    Notice,
    /// CTCP ACTION (`/me`)
    Action,
    /// User joined a channel
    Join,
    /// User left a channel
    Part,
    /// User disconnected
    Quit,
    /// Nick change
    Nick,
    /// User kicked from a channel
    Kick,
    /// Channel or user mode change
    Mode,
    /// Topic change
    Topic,
    /// Invite to a channel
    Invite,
    /// CTCP request other than ACTION
    Ctcp,
    /// Server-originated notice or numeric
    Server,
}

impl InterceptorEventType {
    /// Every event type, in declaration order
    pub const ALL: [InterceptorEventType; 13] = [
        Self::Message,
        Self::Notice,
        Self::Action,
        Self::Join,
        Self::Part,
        Self::Quit,
        Self::Nick,
        Self::Kick,
        Self::Mode,
        Self::Topic,
        Self::Invite,
        Self::Ctcp,
        Self::Server,
    ];

    /// Canonical lower-case token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Notice => "notice",
            Self::Action => "action",
            Self::Join => "join",
            Self::Part => "part",
            Self::Quit => "quit",
            Self::Nick => "nick",
            Self::Kick => "kick",
            Self::Mode => "mode",
            Self::Topic => "topic",
            Self::Invite => "invite",
            Self::Ctcp => "ctcp",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for InterceptorEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event type token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for InterceptorEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownEventType(token.to_string()))
    }
}

/// A normalized inbound chat event, ready for rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Server the event arrived on
    pub server_id: String,
    /// Channel (or query target) the event belongs to
    pub channel: String,
    /// Sender nick
    pub from_nick: String,
    /// Sender hostmask (`nick!ident@host`)
    pub from_hostmask: String,
    /// Raw event payload
    pub text: String,
    /// Event kind
    pub event_type: InterceptorEventType,
    /// When the event was received
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl ChatEvent {
    /// Normalize raw producer fields into an event
    ///
    /// Surrounding whitespace is trimmed from identifiers; the payload text is
    /// kept verbatim.
    pub fn new(
        server_id: impl AsRef<str>,
        channel: impl AsRef<str>,
        from_nick: impl AsRef<str>,
        from_hostmask: impl AsRef<str>,
        text: impl Into<String>,
        event_type: InterceptorEventType,
    ) -> Self {
        Self {
            server_id: server_id.as_ref().trim().to_string(),
            channel: channel.as_ref().trim().to_string(),
            from_nick: from_nick.as_ref().trim().to_string(),
            from_hostmask: from_hostmask.as_ref().trim().to_string(),
            text: text.into(),
            event_type,
            received_at: Utc::now(),
        }
    }
}
