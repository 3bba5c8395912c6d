//! Schema description types.
//!
//! Schemas are plain `'static` data so the whole catalog can live in statics
//! and be shared between threads without allocation.

use crate::CommandId;

/// Cardinality of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Must be supplied by the caller.
    Required,
    /// Falls back to the type default when omitted.
    Optional,
    /// Ordered list; omitted means empty.
    Repeated,
}

/// Wire type of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    Enum(&'static EnumSchema),
    Message(&'static MessageSchema),
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Enum(schema) => schema.name,
            Self::Message(schema) => schema.name,
        }
    }
}

#[derive(Debug)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: Label,
}

impl FieldSchema {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            label: Label::Required,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            label: Label::Optional,
        }
    }

    pub const fn repeated(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            label: Label::Repeated,
        }
    }
}

/// Symbolic names of an enumerated type and their wire numbers.
///
/// The first entry is the default value.
#[derive(Debug)]
pub struct EnumSchema {
    pub name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumSchema {
    pub const fn new(name: &'static str, values: &'static [(&'static str, i32)]) -> Self {
        Self { name, values }
    }

    pub fn number_of(&self, symbol: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|(_, number)| *number)
    }

    pub fn name_of(&self, number: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| *name)
    }

    pub fn default_name(&self) -> Option<&'static str> {
        self.values.first().map(|(name, _)| *name)
    }
}

#[derive(Debug)]
pub struct MessageSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

impl MessageSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSchema]) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Request and response shapes of one command.
#[derive(Debug)]
pub struct CommandSchema {
    pub id: CommandId,
    pub request: &'static MessageSchema,
    pub response: &'static MessageSchema,
    /// The host answers immediately with a task handle and finishes later.
    pub returns_task: bool,
}

impl CommandSchema {
    pub const fn new(
        id: CommandId,
        request: &'static MessageSchema,
        response: &'static MessageSchema,
    ) -> Self {
        Self {
            id,
            request,
            response,
            returns_task: false,
        }
    }

    pub const fn long_running(
        id: CommandId,
        request: &'static MessageSchema,
        response: &'static MessageSchema,
    ) -> Self {
        Self {
            id,
            request,
            response,
            returns_task: true,
        }
    }
}

/// Lookup table consulted by the wire codec.
pub trait Catalog: Send + Sync {
    fn lookup(&self, id: CommandId) -> Option<&'static CommandSchema>;

    /// Enum used by the host to classify command failures.
    fn error_types(&self) -> &'static EnumSchema {
        &crate::builtin::COMMAND_ERROR_TYPE
    }
}

/// Catalog backed by a static slice of command schemas.
#[derive(Debug, Clone, Copy)]
pub struct StaticCatalog {
    commands: &'static [CommandSchema],
    error_types: &'static EnumSchema,
}

impl StaticCatalog {
    pub fn new(commands: &'static [CommandSchema]) -> Self {
        Self {
            commands,
            error_types: &crate::builtin::COMMAND_ERROR_TYPE,
        }
    }

    /// The commands shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(crate::builtin::COMMANDS)
    }

    pub fn with_error_types(mut self, error_types: &'static EnumSchema) -> Self {
        self.error_types = error_types;
        self
    }

    pub fn commands(&self) -> impl Iterator<Item = &'static CommandSchema> {
        self.commands.iter()
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog for StaticCatalog {
    fn lookup(&self, id: CommandId) -> Option<&'static CommandSchema> {
        self.commands.iter().find(|c| c.id == id)
    }

    fn error_types(&self) -> &'static EnumSchema {
        self.error_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLOUR: EnumSchema = EnumSchema::new("Colour", &[("Red", 0), ("Green", 4)]);

    #[test]
    fn enum_lookup_both_ways() {
        assert_eq!(COLOUR.number_of("Green"), Some(4));
        assert_eq!(COLOUR.name_of(0), Some("Red"));
        assert_eq!(COLOUR.number_of("Blue"), None);
        assert_eq!(COLOUR.name_of(1), None);
        assert_eq!(COLOUR.default_name(), Some("Red"));
    }

    #[test]
    fn empty_catalog_knows_nothing() {
        static NONE: &[CommandSchema] = &[];
        let catalog = StaticCatalog::new(NONE);
        assert!(catalog.lookup(CommandId::GetSessionName).is_none());
    }

    #[test]
    fn builtin_catalog_finds_handshake() {
        let catalog = StaticCatalog::builtin();
        let schema = catalog
            .lookup(CommandId::RegisterConnection)
            .expect("register is in the builtin table");
        assert!(schema.request.field("company_name").is_some());
        assert!(!schema.returns_task);
    }
}
