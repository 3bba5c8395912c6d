//! Version information for the client.

/// Client version from Cargo.toml
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version stamped into every request header.
pub const PROTOCOL_VERSION: u32 = 3;
