//! Response assembly at the request boundary.
//!
//! [`ResponseAssembler`] turns a handler's outcome plus the errors collected
//! in the enclosing root scope into one outbound response:
//!
//! 1. Results that are not an [`OutboundResponse`] pass through untouched.
//! 2. A raised [`DomainError`] becomes a response with the error's status code
//!    (and its return value as body, for the "with-return" flavour).
//! 3. Collected errors are appended to the attached ones.
//! 4. With `code_from_error`, a `200 OK` response takes the highest error code.
//! 5. Errors are embedded under `error` or dropped, per `errors_in_body`.
//! 6. The internal `action` hint never reaches the wire.
//! 7. The result is framed as a gateway response or a bare JSON string.
//!
//! # Example
//!
//! ```rust
//! use http::StatusCode;
//! use pwext::{DomainError, Fault, OutboundResponse, Reply, ResponseAssembler, ResponseOptions};
//!
//! let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body());
//!
//! let reply = assembler
//!     .respond(|| -> Result<OutboundResponse, Fault> {
//!         Err(DomainError::http(StatusCode::NOT_FOUND, "Failed to find record").into())
//!     })
//!     .unwrap();
//!
//! let Reply::Gateway(response) = reply else { panic!("expected a gateway response") };
//! assert_eq!(response.status_code, 404);
//! assert_eq!(
//!     response.body,
//!     r#"{"error":{"code":404,"msg":"Failed to find record","classification":"NA"}}"#
//! );
//! ```

use crate::collector::highest_of;
use crate::config::{ResponseOptions, ServiceConfig};
use crate::encoder::{BodyEncoder, JsonBodyEncoder};
use crate::error::{DomainError, Fault, PwResult};
use crate::logging::{log_debug, log_warn, ExceptionSink, TracingSink};
use crate::response::{body_value, Body, OutboundResponse, JSON_CONTENT_TYPE};
use crate::scope;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Shape of the reply produced by the assembler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// API Gateway REST (v1) proxy response.
    #[default]
    ApiGatewayRest,
    /// API Gateway HTTP (v2) response.
    ApiGatewayHttp,
    /// Application load balancer response.
    Alb,
    /// Bare JSON string of the generic boundary form.
    Json,
}

impl ResponseFormat {
    /// Whether replies are framed as a [`GatewayResponse`].
    pub const fn is_gateway(self) -> bool {
        matches!(self, Self::ApiGatewayRest | Self::ApiGatewayHttp | Self::Alb)
    }
}

/// Proxy integration response understood by API gateways and load balancers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    /// Convert into an `http` response, decoding base64 bodies.
    ///
    /// # Errors
    ///
    /// Returns an internal error for invalid header names or values, an
    /// invalid status code, or a body flagged base64 that does not decode.
    pub fn into_http(self) -> PwResult<http::Response<Vec<u8>>> {
        use base64::Engine as _;

        let body = if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(self.body.as_bytes())
                .map_err(|e| DomainError::internal(format!("Invalid base64 body: {e}")))?
        } else {
            self.body.into_bytes()
        };

        let mut builder = http::Response::builder().status(self.status_code);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body)
            .map_err(|e| DomainError::internal(format!("Invalid gateway response: {e}")))
    }
}

/// What a handler hands to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// Structured response, subject to assembly.
    Response(OutboundResponse),
    /// Fully custom result, passed through unchanged.
    Custom(Value),
}

impl From<OutboundResponse> for HandlerResult {
    fn from(response: OutboundResponse) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for HandlerResult {
    fn from(value: Value) -> Self {
        Self::Custom(value)
    }
}

/// Finished reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Gateway(GatewayResponse),
    Serialized(String),
    /// Custom handler result, untouched.
    Custom(Value),
}

impl Reply {
    pub fn as_gateway(&self) -> Option<&GatewayResponse> {
        match self {
            Self::Gateway(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_gateway(self) -> Option<GatewayResponse> {
        match self {
            Self::Gateway(response) => Some(response),
            _ => None,
        }
    }

    pub fn as_serialized(&self) -> Option<&str> {
        match self {
            Self::Serialized(text) => Some(text),
            _ => None,
        }
    }
}

/// Builds outbound responses from handler outcomes and collected errors.
#[derive(Clone)]
pub struct ResponseAssembler {
    options: ResponseOptions,
    format: ResponseFormat,
    encoder: Arc<dyn BodyEncoder>,
    sink: Arc<dyn ExceptionSink>,
    label: Cow<'static, str>,
    root: bool,
}

impl fmt::Debug for ResponseAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseAssembler")
            .field("options", &self.options)
            .field("format", &self.format)
            .field("label", &self.label)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(ResponseOptions::default(), ResponseFormat::default())
    }
}

impl ResponseAssembler {
    pub fn new(options: ResponseOptions, format: ResponseFormat) -> Self {
        Self {
            options,
            format,
            encoder: Arc::new(JsonBodyEncoder),
            sink: Arc::new(TracingSink),
            label: Cow::Borrowed("handler"),
            root: false,
        }
    }

    /// Assembler producing API Gateway REST responses.
    pub fn gateway(options: ResponseOptions) -> Self {
        Self::new(options, ResponseFormat::ApiGatewayRest)
    }

    /// Assembler using the service's response policy.
    pub fn from_config(config: &ServiceConfig, format: ResponseFormat) -> Self {
        Self::new(config.response, format)
    }

    /// Encoder used for structured bodies.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn BodyEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Sink notified about uncaught non-domain failures.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ExceptionSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Name of the handler, used in logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Install a root collector around the handler when none is active.
    #[must_use]
    pub fn rooted(mut self) -> Self {
        self.root = true;
        self
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn options(&self) -> ResponseOptions {
        self.options
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Run `handler` and assemble its outcome.
    ///
    /// # Errors
    ///
    /// Only when `always_return` is off: a propagating domain error
    /// (`Raise`/`Indecisive`) or a non-domain failure is returned instead of a
    /// response.
    pub fn respond<R, F>(&self, handler: F) -> Result<Reply, Fault>
    where
        F: FnOnce() -> Result<R, Fault>,
        R: Into<HandlerResult>,
    {
        let _guard = if self.root { scope::enter_root() } else { None };
        let outcome = handler();
        self.finish(outcome)
    }

    /// Async counterpart of [`respond`](Self::respond).
    ///
    /// # Errors
    ///
    /// Same as [`respond`](Self::respond).
    pub async fn respond_async<R, Fut>(&self, handler: Fut) -> Result<Reply, Fault>
    where
        Fut: Future<Output = Result<R, Fault>>,
        R: Into<HandlerResult>,
    {
        if self.root {
            scope::scope_root(async move {
                let outcome = handler.await;
                self.finish(outcome)
            })
            .await
        } else {
            let outcome = handler.await;
            self.finish(outcome)
        }
    }

    /// Resolve a handler outcome into a reply.
    ///
    /// # Errors
    ///
    /// Same as [`respond`](Self::respond).
    pub fn finish<R>(&self, outcome: Result<R, Fault>) -> Result<Reply, Fault>
    where
        R: Into<HandlerResult>,
    {
        match outcome.map(Into::<HandlerResult>::into) {
            Ok(HandlerResult::Custom(value)) => Ok(Reply::Custom(value)),
            Ok(HandlerResult::Response(response)) => self.assemble(response),
            Err(Fault::Domain(err)) => self.respond_to_error(err),
            Err(Fault::Other(err)) => {
                self.sink.log_exception(&self.label, &*err);
                if !self.options.always_return {
                    return Err(Fault::Other(err));
                }
                Ok(self.internal_error_reply())
            }
        }
    }

    /// Build a response for an error raised by the handler itself.
    fn respond_to_error(&self, mut err: DomainError) -> Result<Reply, Fault> {
        let collector = scope::current();
        if let Some(collector) = &collector {
            collector.record(&mut err);
        }

        if !self.options.always_return && err.propagates() {
            log_debug!(
                label = %self.label,
                code = err.code().as_u16(),
                action = %err.action(),
                "Handler error propagated instead of answered"
            );
            return Err(Fault::Domain(err));
        }

        let body = match err.return_value().cloned().map(Body::from_value) {
            None => Body::default(),
            Some(Ok(body)) => body,
            Some(Err(unsupported)) => {
                log_warn!(
                    label = %self.label,
                    code = err.code().as_u16(),
                    "Return value cannot seed a response body"
                );
                return self.respond_to_error(unsupported.with_inner(err));
            }
        };

        let mut response = OutboundResponse::new(err.code()).with_body(body);
        if collector.is_none() {
            response = response.with_error(err);
        }

        self.assemble(response)
    }

    /// Merge collected errors into `response`, derive its status and frame it.
    ///
    /// # Errors
    ///
    /// Returns an internal error when the body cannot be encoded.
    pub fn assemble(&self, mut response: OutboundResponse) -> Result<Reply, Fault> {
        if let Some(collector) = scope::current() {
            response.errors.extend(collector.errors());
        }

        if self.options.code_from_error && response.status_code == StatusCode::OK {
            if let Some(highest) = highest_of(&response.errors) {
                response.status_code = highest.code();
            }
        }

        log_debug!(
            label = %self.label,
            status_code = response.status_code.as_u16(),
            errors = response.errors.len(),
            errors_in_body = self.options.errors_in_body,
            "Assembling response"
        );

        if !self.options.errors_in_body {
            response.errors.clear();
        }

        if self.format.is_gateway() {
            Ok(Reply::Gateway(self.to_gateway(&response)?))
        } else {
            let text = self.encoder.encode(&Value::Object(response.to_dict()))?;
            Ok(Reply::Serialized(text))
        }
    }

    fn to_gateway(&self, response: &OutboundResponse) -> PwResult<GatewayResponse> {
        let (body, is_base64_encoded) = match response.folded_body() {
            Body::Structured(map) => (self.encoder.encode(&Value::Object(map))?, false),
            Body::Text(text) => (text, false),
            binary @ Body::Binary(_) => match body_value(binary) {
                Value::String(encoded) => (encoded, true),
                _ => (String::new(), true),
            },
        };

        let mut headers = response.headers.clone().unwrap_or_default();
        if let Some(content_type) = &response.content_type {
            let explicit = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("Content-Type"));
            if !explicit {
                headers.insert("Content-Type".to_string(), content_type.clone());
            }
        }

        Ok(GatewayResponse {
            status_code: response.status_code.as_u16(),
            headers,
            body,
            is_base64_encoded,
        })
    }

    /// Fixed reply for failures that are not domain errors.
    fn internal_error_reply(&self) -> Reply {
        if self.format.is_gateway() {
            let mut headers = BTreeMap::new();
            headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
            Reply::Gateway(GatewayResponse {
                status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                headers,
                body: json!({ "error": INTERNAL_SERVER_ERROR }).to_string(),
                is_base64_encoded: false,
            })
        } else {
            Reply::Serialized(
                json!({
                    "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "error": INTERNAL_SERVER_ERROR,
                })
                .to_string(),
            )
        }
    }
}
