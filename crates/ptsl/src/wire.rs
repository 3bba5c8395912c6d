//! Schema-driven conversion between [`Value`] trees and command bodies.
//!
//! Bodies are JSON objects keyed by field name with enums carried as their
//! numeric wire value. Encoding is strict: unknown fields, missing required
//! fields, type mismatches and unknown enum names are all rejected before any
//! I/O happens. Decoding fills in the defaults the host leaves out.

use std::sync::Arc;

use ptsl_catalog::{
    Catalog, CommandId, CommandSchema, EnumSchema, FieldKind, FieldSchema, Label, MessageSchema,
};
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::bridge::protocol::HostErrorPayload;
use crate::error::{CommandError, CommandErrorType, Error, Result};
use crate::value::{Map, Value};

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: i64 = 1 << 53;

/// Failure at a specific field, before it is attributed to a command.
#[derive(Debug)]
struct FieldError {
    path: String,
    reason: String,
}

impl FieldError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    fn into_mismatch(self, command: CommandId) -> Error {
        Error::SchemaMismatch {
            command,
            path: self.path,
            reason: self.reason,
        }
    }

    fn into_malformed(self, command: CommandId) -> Error {
        let reason = if self.path.is_empty() {
            self.reason
        } else {
            format!("{}: {}", self.path, self.reason)
        };
        Error::MalformedResponse { command, reason }
    }
}

fn child_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

/// Encodes and decodes command bodies against a catalog.
#[derive(Clone)]
pub struct WireCodec {
    catalog: Arc<dyn Catalog>,
}

impl WireCodec {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn schema(&self, command: CommandId) -> Result<&'static CommandSchema> {
        self.catalog
            .lookup(command)
            .ok_or(Error::UnknownCommand(command))
    }

    /// Encode caller arguments into a request body.
    pub fn encode(&self, command: CommandId, args: &Value) -> Result<String> {
        let schema = self.schema(command)?;
        encode_body(schema.request, args).map_err(|e| e.into_mismatch(command))
    }

    /// Decode a response body. Enum numbers come back as symbolic names.
    pub fn decode(&self, command: CommandId, body: &str) -> Result<Value> {
        let schema = self.schema(command)?;
        decode_body(schema.response, body).map_err(|e| e.into_malformed(command))
    }

    /// Host-side inverse of [`encode`](Self::encode).
    pub fn decode_request(&self, command: CommandId, body: &str) -> Result<Value> {
        let schema = self.schema(command)?;
        decode_body(schema.request, body).map_err(|e| e.into_mismatch(command))
    }

    /// Host-side inverse of [`decode`](Self::decode).
    pub fn encode_response(&self, command: CommandId, payload: &Value) -> Result<String> {
        let schema = self.schema(command)?;
        encode_body(schema.response, payload).map_err(|e| e.into_mismatch(command))
    }

    /// Classify the host error field of a response.
    ///
    /// Returns `Ok(None)` when every entry is a warning; the warnings are
    /// logged and the response is treated as a success.
    pub fn classify_error(
        &self,
        command: CommandId,
        error_json: &str,
    ) -> Result<Option<CommandError>> {
        let payload: HostErrorPayload =
            serde_json::from_str(error_json).map_err(|e| Error::MalformedResponse {
                command,
                reason: format!("error field: {e}"),
            })?;

        let mut failure = None;
        for entry in payload.into_entries() {
            let error_type = self.error_type(&entry.command_error_type);
            if entry.is_warning {
                tracing::warn!(
                    %command,
                    error_type = error_type.name(),
                    detail = entry.command_error_message.as_deref().unwrap_or(""),
                    "Host reported a warning"
                );
                continue;
            }
            if failure.is_none() {
                failure = Some(CommandError {
                    command,
                    error_type,
                    message: entry.command_error_message,
                });
            }
        }
        Ok(failure)
    }

    fn error_type(&self, raw: &Json) -> CommandErrorType {
        let types = self.catalog.error_types();
        match raw {
            Json::String(name) => CommandErrorType::from_name(name),
            Json::Number(n) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .and_then(|n| types.name_of(n))
                .map(CommandErrorType::from_name)
                .unwrap_or(CommandErrorType::Unknown),
            _ => CommandErrorType::Unknown,
        }
    }
}

impl std::fmt::Debug for WireCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireCodec").finish_non_exhaustive()
    }
}

fn encode_body(schema: &MessageSchema, args: &Value) -> Result<String, FieldError> {
    let map = match args {
        Value::Map(map) => map,
        other => {
            return Err(FieldError::new(
                "",
                format!("arguments must be a map, got {}", other.type_name()),
            ));
        }
    };
    let json = encode_message(schema, map, "")?;
    serde_json::to_string(&json).map_err(|e| FieldError::new("", e.to_string()))
}

fn encode_message(schema: &MessageSchema, map: &Map, path: &str) -> Result<Json, FieldError> {
    let mut out = JsonMap::new();

    for (key, value) in map {
        let field_path = child_path(path, key);
        let field = schema.field(key).ok_or_else(|| {
            FieldError::new(&field_path, format!("unknown field for {}", schema.name))
        })?;
        out.insert(key.clone(), encode_field(field, value, &field_path)?);
    }

    for field in schema.fields {
        if map.contains_key(field.name) {
            continue;
        }
        let default = match field.label {
            Label::Required => {
                return Err(FieldError::new(
                    &child_path(path, field.name),
                    "missing required field",
                ));
            }
            Label::Optional => default_json(field.kind),
            Label::Repeated => Json::Array(Vec::new()),
        };
        out.insert(field.name.to_string(), default);
    }

    Ok(Json::Object(out))
}

fn encode_field(field: &FieldSchema, value: &Value, path: &str) -> Result<Json, FieldError> {
    if field.label != Label::Repeated {
        return encode_scalar(field.kind, value, path);
    }
    let items = value.as_list().ok_or_else(|| {
        FieldError::new(
            path,
            format!("expected list of {}, got {}", field.kind.describe(), value.type_name()),
        )
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| encode_scalar(field.kind, item, &format!("{path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Json::Array)
}

fn encode_scalar(kind: FieldKind, value: &Value, path: &str) -> Result<Json, FieldError> {
    let mismatch = || {
        FieldError::new(
            path,
            format!("expected {}, got {}", kind.describe(), value.type_name()),
        )
    };

    match (kind, value) {
        (FieldKind::Bool, Value::Bool(b)) => Ok(Json::Bool(*b)),
        (FieldKind::Int, Value::Int(n)) => Ok(Json::from(*n)),
        // Same leniency as decode: integers may be given as numeric strings.
        (FieldKind::Int, Value::String(s)) => s
            .parse::<i64>()
            .map(Json::from)
            .map_err(|_| FieldError::new(path, format!("expected int, got string '{s}'"))),
        (FieldKind::Float, Value::Float(f)) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| FieldError::new(path, "float is not finite")),
        (FieldKind::Float, Value::Int(n)) if n.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => {
            Ok(Json::from(*n as f64))
        }
        (FieldKind::String, Value::String(s)) => Ok(Json::String(s.clone())),
        (FieldKind::Enum(schema), Value::Enum(name) | Value::String(name)) => {
            encode_enum(schema, name, path)
        }
        (FieldKind::Message(schema), Value::Map(map)) => encode_message(schema, map, path),
        _ => Err(mismatch()),
    }
}

fn encode_enum(schema: &EnumSchema, name: &str, path: &str) -> Result<Json, FieldError> {
    schema
        .number_of(name)
        .map(Json::from)
        .ok_or_else(|| FieldError::new(path, format!("unknown {} value '{name}'", schema.name)))
}

fn default_json(kind: FieldKind) -> Json {
    match kind {
        FieldKind::Bool => Json::Bool(false),
        FieldKind::Int => Json::from(0),
        FieldKind::Float => Json::from(0.0),
        FieldKind::String => Json::String(String::new()),
        FieldKind::Enum(schema) => Json::from(schema.values.first().map_or(0, |(_, n)| *n)),
        FieldKind::Message(_) => Json::Object(JsonMap::new()),
    }
}

fn decode_body(schema: &MessageSchema, body: &str) -> Result<Value, FieldError> {
    if body.trim().is_empty() {
        return decode_message(schema, &Json::Object(JsonMap::new()), "").map(Value::Map);
    }
    let json: Json =
        serde_json::from_str(body).map_err(|e| FieldError::new("", format!("invalid JSON: {e}")))?;
    decode_message(schema, &json, "").map(Value::Map)
}

fn decode_message(schema: &MessageSchema, json: &Json, path: &str) -> Result<Map, FieldError> {
    let obj = json.as_object().ok_or_else(|| {
        FieldError::new(path, format!("expected {} object", schema.name))
    })?;

    for key in obj.keys() {
        if schema.field(key).is_none() {
            tracing::debug!(schema = schema.name, field = %key, "Ignoring unknown field");
        }
    }

    let mut out = Map::with_capacity(schema.fields.len());
    for field in schema.fields {
        let field_path = child_path(path, field.name);
        let value = match obj.get(field.name) {
            None | Some(Json::Null) => default_value(field, &field_path)?,
            Some(json) => decode_field(field, json, &field_path)?,
        };
        out.insert(field.name.to_string(), value);
    }
    Ok(out)
}

fn decode_field(field: &FieldSchema, json: &Json, path: &str) -> Result<Value, FieldError> {
    if field.label != Label::Repeated {
        return decode_scalar(field.kind, json, path);
    }
    let items = json
        .as_array()
        .ok_or_else(|| FieldError::new(path, "expected array"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_scalar(field.kind, item, &format!("{path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn decode_scalar(kind: FieldKind, json: &Json, path: &str) -> Result<Value, FieldError> {
    let mismatch = || FieldError::new(path, format!("expected {}, got {json}", kind.describe()));

    match kind {
        FieldKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        FieldKind::Int => match json {
            Json::Number(n) => n.as_i64().map(Value::Int).ok_or_else(mismatch),
            // 64-bit integers may arrive as strings.
            Json::String(s) => s.parse::<i64>().map(Value::Int).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldKind::Float => json.as_f64().map(Value::Float).ok_or_else(mismatch),
        FieldKind::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
        FieldKind::Enum(schema) => decode_enum(schema, json, path),
        FieldKind::Message(schema) => decode_message(schema, json, path).map(Value::Map),
    }
}

fn decode_enum(schema: &EnumSchema, json: &Json, path: &str) -> Result<Value, FieldError> {
    let name = match json {
        Json::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .and_then(|n| schema.name_of(n))
            .ok_or_else(|| FieldError::new(path, format!("unknown {} number {n}", schema.name)))?,
        Json::String(s) => {
            if schema.number_of(s).is_none() {
                return Err(FieldError::new(
                    path,
                    format!("unknown {} value '{s}'", schema.name),
                ));
            }
            s.as_str()
        }
        other => {
            return Err(FieldError::new(
                path,
                format!("expected {}, got {other}", schema.name),
            ));
        }
    };
    Ok(Value::Enum(name.to_string()))
}

fn default_value(field: &FieldSchema, path: &str) -> Result<Value, FieldError> {
    if field.label == Label::Repeated {
        return Ok(Value::List(Vec::new()));
    }
    Ok(match field.kind {
        FieldKind::Bool => Value::Bool(false),
        FieldKind::Int => Value::Int(0),
        FieldKind::Float => Value::Float(0.0),
        FieldKind::String => Value::String(String::new()),
        FieldKind::Enum(schema) => {
            let name = schema
                .default_name()
                .ok_or_else(|| FieldError::new(path, format!("{} has no values", schema.name)))?;
            Value::Enum(name.to_string())
        }
        FieldKind::Message(schema) => {
            Value::Map(decode_message(schema, &Json::Object(JsonMap::new()), path)?)
        }
    })
}
