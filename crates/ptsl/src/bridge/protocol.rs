//! Envelope types exchanged with the host.
//!
//! Every frame carries one JSON envelope tagged by `type`. Command bodies ride
//! inside the envelope as JSON strings, already encoded against the command
//! schema by [`crate::wire::WireCodec`].

use serde::{Deserialize, Serialize};

/// Per-request identifier used to match a response to its request.
///
/// UUID v4 so tags are never reused across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationTag(uuid::Uuid);

impl CorrelationTag {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let uuid = uuid::Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }
}

impl Default for CorrelationTag {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of a command as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Pending,
    InProgress,
    #[default]
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Parse the symbolic name used in `GetTaskStatus` bodies.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Queued" => Some(Self::Queued),
            "Pending" => Some(Self::Pending),
            "InProgress" => Some(Self::InProgress),
            "Completed" => Some(Self::Completed),
            "Failed" => Some(Self::Failed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    pub tag: CorrelationTag,
    pub command: u32,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Messages from client to host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Request {
        header: RequestHeader,
        #[serde(rename = "request_body_json")]
        body: String,
    },

    /// Best-effort notice sent before the client closes the connection.
    Disconnect {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub tag: CorrelationTag,
    pub command: u32,
    #[serde(default)]
    pub status: TaskStatus,
    /// Set when the command continues running host-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Messages from host to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Response {
        header: ResponseHeader,
        #[serde(default, rename = "response_body_json")]
        body: String,
        #[serde(
            default,
            rename = "response_error_json",
            skip_serializing_if = "Option::is_none"
        )]
        error: Option<String>,
    },

    /// Host is going away; no further responses will arrive.
    Closing { reason: String },
}

/// One failure entry inside `response_error_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostErrorEntry {
    /// Numeric wire value or symbolic name.
    pub command_error_type: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_error_message: Option<String>,
    #[serde(default)]
    pub is_warning: bool,
}

/// Shape of `response_error_json`: a list of entries or a bare single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostErrorPayload {
    List { errors: Vec<HostErrorEntry> },
    Single(HostErrorEntry),
}

impl HostErrorPayload {
    pub fn into_entries(self) -> Vec<HostErrorEntry> {
        match self {
            Self::List { errors } => errors,
            Self::Single(entry) => vec![entry],
        }
    }
}
