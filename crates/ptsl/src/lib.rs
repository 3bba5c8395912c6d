//! Async client engine for the PTSL remote-control protocol.
//!
//! A [`Client`] owns one connection to the host, performs the
//! authorize/register handshake, and runs commands described by a
//! [`ptsl_catalog::Catalog`]. Arguments and responses are dynamic [`Value`]
//! trees validated against the command schema at the encode boundary.
//!
//! # Architecture
//!
//! - **value**: Dynamic argument/response representation
//! - **wire**: Schema-driven body encoding and decoding
//! - **bridge**: Framing, envelopes and the socket transport
//! - **session**: Connection state and handshake
//! - **dispatcher**: Tag-correlated request/response engine
//! - **task**: Polling for long-running commands

pub mod bridge;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod session;
pub mod task;
pub mod value;
pub mod version;
pub mod wire;

pub use bridge::protocol::{CorrelationTag, TaskStatus};
pub use bridge::transport::{Connection, Connector, Endpoint, SocketConnector};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{CommandError, CommandErrorType, Error, Result, TransportError};
pub use ptsl_catalog::{Catalog, CommandId, StaticCatalog};
pub use session::ConnectionState;
pub use task::{TaskHandle, TaskOutcome, TaskResult};
pub use value::{Map, Value};
pub use version::{CLIENT_VERSION, PROTOCOL_VERSION};
