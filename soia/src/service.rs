//! Method registry and request dispatch (§4.9, §6.3): a `Service` is built
//! by registering `(name, number, request serializer, response serializer,
//! handler)` tuples, then routes incoming request bodies to the matching
//! handler and serializes the result back to JSON.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use serde_json::Value as JsonValue;
use soia_core::{JsonFlavor, Serializer};

use crate::error::{HandlerError, RegistryError};

/// Response produced by [`Service::handle_request`] — status code, MIME
/// type, and body, ready to hand back to whatever HTTP layer wraps this
/// service (§6.3: no listener is implemented here).
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl RpcResponse {
    fn json(status: u16, body: JsonValue) -> Self {
        RpcResponse { status, content_type: "application/json", body: body.to_string() }
    }

    fn html(body: &str) -> Self {
        RpcResponse { status: 200, content_type: "text/html; charset=utf-8", body: body.to_string() }
    }

    fn error(e: &HandlerError) -> Self {
        RpcResponse {
            status: e.status_code(),
            content_type: "text/plain; charset=utf-8",
            body: e.to_string(),
        }
    }
}

type MethodCall = dyn Fn(JsonValue, JsonFlavor, bool) -> Pin<Box<dyn Future<Output = Result<JsonValue, HandlerError>> + Send>>
    + Send
    + Sync;

struct MethodEntry {
    name: String,
    number: i32,
    call: Box<MethodCall>,
}

/// Per-`Service` defaults (§2 A3): the `unrecognizedPolicy` used when a
/// request doesn't specify one, and the wire magic this service's own
/// encoders (see [`Service::encode_wire`]) stamp onto outgoing bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceConfig {
    pub keep_unrecognized_values: bool,
    pub wire_magic: &'static [u8; 4],
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig { keep_unrecognized_values: true, wire_magic: soia_core::WIRE_MAGIC }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_unrecognized_values(mut self, value: bool) -> Self {
        self.keep_unrecognized_values = value;
        self
    }

    pub fn wire_magic(mut self, magic: &'static [u8; 4]) -> Self {
        self.wire_magic = magic;
        self
    }
}

/// Accumulates method registrations before [`ServiceBuilder::build`]
/// finalizes them into a lookup table that is never mutated again, mirroring
/// the `HTTPBuilder`/`WebSocketBuilder` → `build()` split in the transport
/// layer this crate grew out of.
#[derive(Default)]
pub struct ServiceBuilder {
    methods: Vec<MethodEntry>,
    finalized: bool,
    config: ServiceConfig,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the defaults in [`ServiceConfig`] (unrecognized-values
    /// policy, wire magic) for the `Service` under construction.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers one RPC method. `handler` receives the decoded request and
    /// returns the response (or a [`HandlerError::Handler`] failure, mapped
    /// to a 500).
    pub fn with_method<Req, Res, F, Fut>(
        mut self,
        name: &str,
        number: i32,
        request_serializer: &'static Serializer<Req>,
        response_serializer: &'static Serializer<Res>,
        handler: F,
    ) -> Result<Self, RegistryError>
    where
        Req: Send + 'static,
        Res: Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, HandlerError>> + Send + 'static,
    {
        if self.finalized {
            return Err(RegistryError::FinalizedMutation { name: name.to_string() });
        }
        if let Some(existing) = self.methods.iter().find(|m| m.number == number) {
            return Err(RegistryError::DuplicateRegistration {
                name: existing.name.clone(),
                number,
            });
        }
        let handler = Arc::new(handler);
        let call: Box<MethodCall> = Box::new(move |json, flavor, keep_unrecognized| {
            let handler = handler.clone();
            Box::pin(async move {
                let request = (request_serializer.from_json)(&json, keep_unrecognized)?;
                let response = handler(request).await?;
                Ok((response_serializer.to_json)(&response, flavor))
            })
        });
        self.methods.push(MethodEntry { name: name.to_string(), number, call });
        Ok(self)
    }

    pub fn build(self) -> Service {
        let storage = self.methods;
        let by_number = storage.iter().enumerate().map(|(index, method)| (method.number, index)).collect();
        Service { methods: RwLock::new(by_number), storage, config: self.config }
    }
}

/// A finalized method registry plus the dispatch logic for §4.9's request
/// forms (empty/`"list"`, `"restudio"`/`"debug"`, JSON envelope, colon-framed
/// string envelope).
pub struct Service {
    methods: RwLock<HashMap<i32, usize>>,
    storage: Vec<MethodEntry>,
    config: ServiceConfig,
}

impl Service {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Encodes `value` to wire bytes using this service's configured magic
    /// (§2 A3), for handlers that hand raw wire bytes to a caller instead of
    /// going through the JSON dispatch path.
    pub fn encode_wire<T>(&self, serializer: &soia_core::Serializer<T>, value: &T) -> Vec<u8> {
        serializer.to_bytes_with_magic(value, self.config.wire_magic)
    }

    fn find_by_number(&self, number: i32) -> Option<&MethodEntry> {
        let index = *self.methods.read().ok()?.get(&number)?;
        self.storage.get(index)
    }

    fn find_by_name(&self, name: &str) -> Result<&MethodEntry, HandlerError> {
        let mut matches = self.storage.iter().filter(|m| m.name == name);
        let first = matches.next().ok_or_else(|| HandlerError::Routing(format!("unknown method {:?}", name)))?;
        if matches.next().is_some() {
            return Err(HandlerError::Routing(format!("method name {:?} is ambiguous", name)));
        }
        Ok(first)
    }

    fn resolve(&self, name: &str, number: Option<i32>) -> Result<&MethodEntry, HandlerError> {
        if let Some(number) = number {
            if let Some(method) = self.find_by_number(number) {
                return Ok(method);
            }
            if name.is_empty() {
                return Err(HandlerError::Routing(format!("unknown method number {}", number)));
            }
        }
        self.find_by_name(name)
    }

    fn listing(&self) -> JsonValue {
        let methods: Vec<JsonValue> = self
            .storage
            .iter()
            .map(|m| serde_json::json!({ "method": m.name, "number": m.number }))
            .collect();
        serde_json::json!({ "methods": methods })
    }

    /// Dispatches one request body (§4.9: `handleRequest(body, headers,
    /// unrecognizedPolicy)`). `headers` carry no routing information in this
    /// boundary since method/format are always encoded in the body, but are
    /// accepted so callers can thread request metadata (auth, tracing) for
    /// future use. `unrecognized_policy` overrides this service's
    /// [`ServiceConfig::keep_unrecognized_values`] default when given.
    pub async fn handle_request(
        &self,
        body: &str,
        headers: &HashMap<String, String>,
        unrecognized_policy: Option<bool>,
    ) -> RpcResponse {
        let _ = headers;
        let keep_unrecognized = unrecognized_policy.unwrap_or(self.config.keep_unrecognized_values);
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "list" {
            return RpcResponse::json(200, self.listing());
        }
        if trimmed == "restudio" || trimmed == "debug" {
            return RpcResponse::html(
                "<!doctype html><html><body><h1>soia service</h1><p>debug endpoint</p></body></html>",
            );
        }
        let result = if trimmed.starts_with('{') {
            self.dispatch_json_envelope(trimmed, keep_unrecognized).await
        } else {
            self.dispatch_string_envelope(trimmed, keep_unrecognized).await
        };
        match result {
            Ok(json) => RpcResponse::json(200, json),
            Err(e) => {
                warn!("rpc request failed: {}", e);
                RpcResponse::error(&e)
            }
        }
    }

    async fn dispatch_json_envelope(&self, body: &str, keep_unrecognized: bool) -> Result<JsonValue, HandlerError> {
        let envelope: JsonValue = serde_json::from_str(body).map_err(|e| HandlerError::Routing(e.to_string()))?;
        let method = envelope.get("method").ok_or_else(|| HandlerError::Routing("missing 'method'".to_string()))?;
        let request = envelope.get("request").cloned().unwrap_or(JsonValue::Null);
        let (name, number) = method_key(method)?;
        debug!("dispatching json envelope method={:?} number={:?}", name, number);
        let entry = self.resolve(&name, number)?;
        (entry.call)(request, JsonFlavor::Readable, keep_unrecognized).await
    }

    async fn dispatch_string_envelope(&self, body: &str, keep_unrecognized: bool) -> Result<JsonValue, HandlerError> {
        let mut parts = body.splitn(4, ':');
        let name = parts.next().unwrap_or("");
        let number_str = parts.next().unwrap_or("");
        let format = parts.next().unwrap_or("");
        let data = parts.next().unwrap_or("");
        let number = if number_str.is_empty() {
            None
        } else {
            Some(number_str.parse::<i32>().map_err(|_| HandlerError::Routing(format!("bad method number {:?}", number_str)))?)
        };
        let flavor = match format {
            "" | "readable" => JsonFlavor::Readable,
            other => return Err(HandlerError::Routing(format!("unknown request format {:?}", other))),
        };
        debug!("dispatching string envelope method={:?} number={:?} format={:?}", name, number, format);
        let entry = self.resolve(name, number)?;
        let request: JsonValue = if data.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(data).map_err(|e| HandlerError::Routing(e.to_string()))?
        };
        (entry.call)(request, flavor, keep_unrecognized).await
    }
}

fn method_key(method: &JsonValue) -> Result<(String, Option<i32>), HandlerError> {
    match method {
        JsonValue::String(name) => Ok((name.clone(), None)),
        JsonValue::Number(n) => {
            let number = n.as_i64().ok_or_else(|| HandlerError::Routing("method number out of range".to_string()))?;
            Ok((String::new(), Some(number as i32)))
        }
        other => Err(HandlerError::Routing(format!("'method' must be a string or number, found {}", other))),
    }
}
