//! RPC method registry and the built-in methods.
//!
//! Each text frame is decoded into an [`RpcRequest`], routed by `method` to
//! a registered [`RpcMethod`] and answered with exactly one reply frame.
//! Method failures are reported as validation errors in the standard error
//! envelope; they never terminate the connection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::domain::fields::{Field, StrValidator};
use crate::domain::{DataSchema, ValidationError, ValidationErrors};

use super::channels::{ANY_EVENT, Channels, Outbox};
use super::messages::{Decoded, RpcErrorEnvelope, RpcRequest, RpcResponse, rpc_schema};
use super::sockets::Sockets;

/// What a method can see of the calling connection.
pub struct RpcContext<'a> {
    /// Id of the calling socket.
    pub socket_id: &'a str,
    /// Queue feeding the calling socket.
    pub outbox: &'a Outbox,
    /// Every connected socket.
    pub sockets: &'a Sockets,
    /// Pub/sub channels.
    pub channels: &'a Channels,
}

/// A callable RPC method.
#[async_trait]
pub trait RpcMethod: Send + Sync {
    /// Run the method with an already decoded payload.
    async fn call(
        &self,
        ctx: &RpcContext<'_>,
        payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors>;
}

#[derive(Serialize)]
#[serde(untagged)]
enum Reply {
    Response(RpcResponse),
    Error(RpcErrorEnvelope),
}

/// Methods reachable over the socket, by name.
pub struct RpcRegistry {
    schema: DataSchema,
    methods: HashMap<String, Arc<dyn RpcMethod>>,
}

impl Default for RpcRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for RpcRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RpcRegistry").field("methods", &names).finish()
    }
}

impl RpcRegistry {
    /// A registry with no methods.
    pub fn empty() -> Self {
        Self {
            schema: rpc_schema(),
            methods: HashMap::new(),
        }
    }

    /// A registry with `echo`, `server_info`, `subscribe`, `unsubscribe`
    /// and `publish`.
    pub fn with_builtins() -> Self {
        Self::empty()
            .register("echo", Echo)
            .register("server_info", ServerInfo)
            .register("subscribe", Subscribe::new())
            .register("unsubscribe", Unsubscribe::new())
            .register("publish", Publish::new())
    }

    /// Add or replace a method.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, method: impl RpcMethod + 'static) -> Self {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Answer one text frame.
    ///
    /// # Errors
    ///
    /// Fails only when the reply cannot be serialised.
    pub async fn dispatch(
        &self,
        ctx: &RpcContext<'_>,
        text: &str,
    ) -> Result<String, serde_json::Error> {
        let reply = match RpcRequest::decode(text, &self.schema) {
            Decoded::Protocol(protocol) => {
                error!(error = %protocol, socket_id = ctx.socket_id, "protocol error");
                Reply::Error(RpcErrorEnvelope::protocol(&protocol))
            }
            Decoded::Invalid { id, errors } => {
                Reply::Error(RpcErrorEnvelope::invalid(errors, id, None))
            }
            Decoded::Call(request) => self.call(ctx, request).await,
        };
        serde_json::to_string(&reply)
    }

    async fn call(&self, ctx: &RpcContext<'_>, request: RpcRequest) -> Reply {
        let RpcRequest {
            id,
            method,
            payload,
        } = request;
        let Some(handler) = self.methods.get(&method) else {
            let errors = ValidationError::new("method", format!("{method} method not available"));
            return Reply::Error(RpcErrorEnvelope::invalid(
                errors.into(),
                Some(id),
                Some(method),
            ));
        };
        debug!(%method, socket_id = ctx.socket_id, "rpc call");
        match handler.call(ctx, payload).await {
            Ok(response) => Reply::Response(RpcResponse {
                id,
                method,
                response,
            }),
            Err(errors) => Reply::Error(RpcErrorEnvelope::invalid(errors, Some(id), Some(method))),
        }
    }
}

fn validated(schema: &DataSchema, payload: Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
    schema.validate(&Value::Object(payload))
}

fn text(data: &Map<String, Value>, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or(ANY_EVENT)
        .to_owned()
}

fn channel_field() -> Field {
    Field::string("channel", StrValidator::new().min_length(1).max_length(255)).required()
}

fn event_field() -> Field {
    Field::string("event", StrValidator::new().min_length(1).max_length(255))
}

/// Returns the payload unchanged.
struct Echo;

#[async_trait]
impl RpcMethod for Echo {
    async fn call(
        &self,
        _ctx: &RpcContext<'_>,
        payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors> {
        Ok(Value::Object(payload))
    }
}

/// Package identity and connection counts.
struct ServerInfo;

#[async_trait]
impl RpcMethod for ServerInfo {
    async fn call(
        &self,
        ctx: &RpcContext<'_>,
        _payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors> {
        Ok(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "socket_id": ctx.socket_id,
            "sockets": ctx.sockets.count().await,
        }))
    }
}

struct Subscribe {
    schema: DataSchema,
}

impl Subscribe {
    fn new() -> Self {
        Self {
            schema: DataSchema::new("Subscribe")
                .field(channel_field())
                .field(event_field().default_value(ANY_EVENT)),
        }
    }
}

#[async_trait]
impl RpcMethod for Subscribe {
    async fn call(
        &self,
        ctx: &RpcContext<'_>,
        payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors> {
        let data = validated(&self.schema, payload)?;
        let channel = text(&data, "channel");
        let event = text(&data, "event");
        ctx.channels
            .subscribe(&channel, &event, ctx.socket_id, ctx.outbox.clone())
            .await;
        Ok(json!({ "channel": channel, "event": event }))
    }
}

struct Unsubscribe {
    schema: DataSchema,
}

impl Unsubscribe {
    fn new() -> Self {
        Self {
            schema: DataSchema::new("Unsubscribe")
                .field(channel_field())
                .field(event_field().default_value(ANY_EVENT)),
        }
    }
}

#[async_trait]
impl RpcMethod for Unsubscribe {
    async fn call(
        &self,
        ctx: &RpcContext<'_>,
        payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors> {
        let data = validated(&self.schema, payload)?;
        let channel = text(&data, "channel");
        let event = text(&data, "event");
        ctx.channels
            .unsubscribe(&channel, &event, ctx.socket_id)
            .await;
        Ok(json!({ "channel": channel, "event": event }))
    }
}

struct Publish {
    schema: DataSchema,
}

impl Publish {
    fn new() -> Self {
        Self {
            schema: DataSchema::new("Publish")
                .field(channel_field())
                .field(event_field().required())
                .field(Field::json("data").default_value(Value::Null)),
        }
    }
}

#[async_trait]
impl RpcMethod for Publish {
    async fn call(
        &self,
        ctx: &RpcContext<'_>,
        payload: Map<String, Value>,
    ) -> Result<Value, ValidationErrors> {
        let data = validated(&self.schema, payload)?;
        let channel = text(&data, "channel");
        let event = text(&data, "event");
        let body = data.get("data").cloned().unwrap_or(Value::Null);
        let delivered = ctx.channels.publish(&channel, &event, &body).await;
        Ok(json!({ "channel": channel, "event": event, "delivered": delivered }))
    }
}
