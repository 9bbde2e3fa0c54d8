//! Wire-level messages of the WebSocket RPC protocol.
//!
//! Clients send `{"id", "method", "payload"}` objects. The server answers
//! with either `{"id", "method", "response"}` or an error envelope
//! `{"error": {"message", "errors"}, "id", "method"}`; absent values are
//! omitted. Channel events are pushed as `{"channel", "event", "data"}`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::fields::{Field, FnValidator, StrValidator, display_value};
use crate::domain::{DataSchema, ValidationError, ValidationErrors};

/// Message for every validation failure of an RPC call.
pub const INVALID_PARAMETERS: &str = "Invalid RPC parameters";

/// Frames that cannot be interpreted as an RPC call at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not JSON.
    #[error("JSON string expected")]
    NotJson,
    /// The frame is JSON but not an object.
    #[error("Malformed message; expected dictionary, got {kind}")]
    NotObject {
        /// JSON type of the frame.
        kind: &'static str,
    },
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn object_validator() -> FnValidator {
    FnValidator::new(|field, value| match value {
        Value::Object(_) => Ok(value.clone()),
        other => Err(ValidationError::new(
            field,
            format!("{} not valid", display_value(other)),
        )),
    })
}

/// Schema every RPC frame is validated against.
pub fn rpc_schema() -> DataSchema {
    DataSchema::new("RpcRequest")
        .field(Field::string("id", StrValidator::new().min_length(1)).required())
        .field(Field::string("method", StrValidator::new().min_length(1)).required())
        .field(
            Field::new("payload")
                .validator(object_validator())
                .default_value(Value::Object(Map::new())),
        )
}

/// A decoded RPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Client correlation id, echoed in the reply.
    pub id: String,
    /// Name of the method to run.
    pub method: String,
    /// Method arguments.
    pub payload: Map<String, Value>,
}

/// Outcome of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well formed call.
    Call(RpcRequest),
    /// The frame could not be read as JSON or was not an object.
    Protocol(ProtocolError),
    /// The object failed validation; `id` and `method` are echoed when present.
    Invalid {
        /// Raw `id` member, if it was a string.
        id: Option<String>,
        /// Field errors.
        errors: ValidationErrors,
    },
}

impl RpcRequest {
    /// Decode a text frame.
    pub fn decode(text: &str, schema: &DataSchema) -> Decoded {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            return Decoded::Protocol(ProtocolError::NotJson);
        };
        if !value.is_object() {
            return Decoded::Protocol(ProtocolError::NotObject {
                kind: json_kind(&value),
            });
        }
        let id = value.get("id").and_then(Value::as_str).map(str::to_owned);
        match schema.validate(&value) {
            Ok(mut data) => Decoded::Call(Self {
                id: take_string(&mut data, "id"),
                method: take_string(&mut data, "method"),
                payload: match data.remove("payload") {
                    Some(Value::Object(payload)) => payload,
                    _ => Map::new(),
                },
            }),
            Err(errors) => Decoded::Invalid { id, errors },
        }
    }
}

fn take_string(data: &mut Map<String, Value>, key: &str) -> String {
    match data.remove(key) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    }
}

/// Successful reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    /// Echoed call id.
    pub id: String,
    /// Echoed method name.
    pub method: String,
    /// Method result.
    pub response: Value,
}

/// Body of an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcErrorBody {
    /// Summary.
    pub message: String,
    /// Field failures.
    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub errors: ValidationErrors,
}

/// Error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcErrorEnvelope {
    /// What went wrong.
    pub error: RpcErrorBody,
    /// Echoed call id, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Echoed method name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl RpcErrorEnvelope {
    /// Envelope for an unreadable frame.
    pub fn protocol(error: &ProtocolError) -> Self {
        Self {
            error: RpcErrorBody {
                message: error.to_string(),
                errors: ValidationErrors::new(),
            },
            id: None,
            method: None,
        }
    }

    /// Envelope for a call that failed validation.
    pub fn invalid(errors: ValidationErrors, id: Option<String>, method: Option<String>) -> Self {
        Self {
            error: RpcErrorBody {
                message: INVALID_PARAMETERS.to_owned(),
                errors,
            },
            id,
            method,
        }
    }
}

/// Event pushed to channel subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEvent<'a> {
    /// Channel name.
    pub channel: &'a str,
    /// Event name.
    pub event: &'a str,
    /// Event data.
    pub data: &'a Value,
}
