//! Command catalog for the PTSL protocol.
//!
//! Maps each [`CommandId`] to the schema of its request and response bodies.
//! The engine in the `ptsl` crate consults this table to validate arguments,
//! resolve enum names to wire numbers and back, and find out which commands
//! hand back a task handle instead of a finished result.

pub mod builtin;
mod command;
mod schema;

pub use command::CommandId;
pub use schema::{
    Catalog, CommandSchema, EnumSchema, FieldKind, FieldSchema, Label, MessageSchema,
    StaticCatalog,
};
