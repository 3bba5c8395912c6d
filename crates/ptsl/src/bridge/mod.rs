//! Byte-level link to the host.
//!
//! # Architecture
//!
//! - **protocol**: Envelope types (ClientMessage/HostMessage, CorrelationTag, TaskStatus)
//! - **codec**: Length-prefixed JSON framing for AsyncRead/AsyncWrite
//! - **transport**: Endpoints, connectors, and the shared writer / single reader pair

pub mod codec;
pub mod protocol;
pub mod transport;
