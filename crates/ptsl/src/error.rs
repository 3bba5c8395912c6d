//! Error taxonomy for the client engine.
//!
//! Lifecycle and encoding errors are raised before any I/O happens. Transport
//! errors mean the connection is gone and the caller has to reconnect. A
//! [`CommandError`] is a successful exchange that carries a host-side failure;
//! the connection stays usable after one.

use std::fmt;
use std::time::Duration;

use ptsl_catalog::CommandId;

use crate::bridge::protocol::CorrelationTag;
use crate::bridge::transport::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    Closed,
    /// The frame could not be written before the caller's deadline.
    #[error("write to host timed out")]
    WriteTimeout,
}

/// Host-side failure classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandErrorType {
    NoOpenedSession,
    InvalidParameter,
    HostBusy,
    InvalidCommandState,
    UnsupportedCommand,
    NotAuthorized,
    Unknown,
    /// A classification this client has no dedicated variant for.
    Other(String),
}

impl CommandErrorType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "PT_NoOpenedSession" => Self::NoOpenedSession,
            "PT_InvalidParameter" => Self::InvalidParameter,
            "PT_HostIsBusy" => Self::HostBusy,
            "PT_InvalidCommandState" => Self::InvalidCommandState,
            "PT_UnsupportedCommand" => Self::UnsupportedCommand,
            "SDK_NotAuthorized" => Self::NotAuthorized,
            "PT_UnknownError" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the classification.
    pub fn name(&self) -> &str {
        match self {
            Self::NoOpenedSession => "PT_NoOpenedSession",
            Self::InvalidParameter => "PT_InvalidParameter",
            Self::HostBusy => "PT_HostIsBusy",
            Self::InvalidCommandState => "PT_InvalidCommandState",
            Self::UnsupportedCommand => "PT_UnsupportedCommand",
            Self::NotAuthorized => "SDK_NotAuthorized",
            Self::Unknown => "PT_UnknownError",
            Self::Other(name) => name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::NoOpenedSession => "no session is currently open",
            Self::InvalidParameter => "invalid argument",
            Self::HostBusy => "host busy",
            Self::InvalidCommandState => "invalid state for operation",
            Self::UnsupportedCommand => "command not supported by host",
            Self::NotAuthorized => "connection not authorized",
            Self::Unknown => "unknown host error",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CommandErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Application-level failure reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandError {
    pub command: CommandId,
    pub error_type: CommandErrorType,
    pub message: Option<String>,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.command, self.error_type)?;
        if let Some(ref message) = self.message {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("host unavailable at {endpoint}: {source}")]
    HostUnavailable {
        endpoint: Endpoint,
        #[source]
        source: std::io::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("not connected")]
    NotConnected,
    #[error("a connection handshake is already in progress")]
    AlreadyConnecting,
    #[error("already connected")]
    AlreadyConnected,
    #[error("schema mismatch for {command} at '{path}': {reason}")]
    SchemaMismatch {
        command: CommandId,
        path: String,
        reason: String,
    },
    #[error("no schema for command {0}")]
    UnknownCommand(CommandId),
    #[error("malformed response to {command}: {reason}")]
    MalformedResponse { command: CommandId, reason: String },
    #[error("{command} ({tag}) timed out after {timeout:?}")]
    RequestTimeout {
        command: CommandId,
        tag: CorrelationTag,
        timeout: Duration,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("task {task_id} did not finish within {waited:?}")]
    TaskTimeout { task_id: String, waited: Duration },
}

impl Error {
    /// True only for failures that mean the host cannot be reached.
    pub fn is_host_unreachable(&self) -> bool {
        matches!(self, Self::HostUnavailable { .. } | Self::Transport(_))
    }

    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::Command(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_no_open_session(&self) -> bool {
        self.command_error()
            .is_some_and(|e| e.error_type == CommandErrorType::NoOpenedSession)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
