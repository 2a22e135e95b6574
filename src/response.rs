//! Structured handler response.
//!
//! [`OutboundResponse`] is what handlers return to opt into response
//! assembly. It still allows arbitrary bodies, custom headers and status
//! codes, but being structured it can be translated deterministically into a
//! gateway response with collected errors folded in.
//!
//! ```rust
//! use pwext::core_types::keys;
//! use pwext::OutboundResponse;
//!
//! let response = OutboundResponse::ok()
//!     .with_field(keys::OPERATION, "create-offer")
//!     .with_field(keys::MESSAGE, "Hello World!");
//!
//! assert_eq!(
//!     response.body().as_structured().unwrap()["operation"],
//!     "create-offer"
//! );
//! ```

use crate::collector::project;
use crate::core_types::keys;
use crate::error::{DomainError, PwResult};
use http::StatusCode;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default content type of every response.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Response body: pre-serialized text or bytes, or a structured map.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// String-keyed map, serialized at the boundary.
    Structured(Map<String, Value>),
    /// Opaque text, emitted as is.
    Text(String),
    /// Opaque bytes, base64-encoded by gateway framing.
    Binary(Vec<u8>),
}

impl Default for Body {
    fn default() -> Self {
        Self::Structured(Map::new())
    }
}

impl Body {
    /// Build a body from a JSON value.
    ///
    /// Objects become structured bodies, strings become text and `null` an
    /// empty structured body.
    ///
    /// # Errors
    ///
    /// Returns an internal error for any other JSON type.
    pub fn from_value(value: Value) -> PwResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::Structured(map)),
            Value::String(text) => Ok(Self::Text(text)),
            Value::Null => Ok(Self::default()),
            other => Err(DomainError::internal(format!(
                "Unsupported body type: expected object, string or null, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn as_structured(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Structured(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the body carries nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Structured(map) => map.is_empty(),
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
        }
    }

    /// Fold a projected error payload into the body.
    ///
    /// Structured bodies gain the reserved `error` key; opaque bodies are
    /// replaced by a map holding only that key.
    pub(crate) fn fold_errors(self, payload: Value) -> Map<String, Value> {
        match self {
            Self::Structured(mut map) => {
                map.insert(keys::ERROR.to_string(), payload);
                map
            }
            Self::Text(_) | Self::Binary(_) => {
                let mut map = Map::new();
                map.insert(keys::ERROR.to_string(), payload);
                map
            }
        }
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structured(map)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Handler response opting into error folding and status derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResponse {
    pub(crate) status_code: StatusCode,
    pub(crate) content_type: Option<String>,
    pub(crate) body: Body,
    pub(crate) headers: Option<BTreeMap<String, String>>,
    pub(crate) errors: Vec<DomainError>,
}

impl Default for OutboundResponse {
    fn default() -> Self {
        Self {
            status_code: StatusCode::OK,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            body: Body::default(),
            headers: None,
            errors: Vec::new(),
        }
    }
}

impl OutboundResponse {
    /// `200 OK` with an empty structured body.
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// Build from a JSON body value.
    ///
    /// # Errors
    ///
    /// Returns an internal error when `body` is neither object, string nor null.
    pub fn from_json(status_code: StatusCode, body: Value) -> PwResult<Self> {
        Ok(Self::new(status_code).with_body(Body::from_value(body)?))
    }

    #[must_use]
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a top-level body field.
    ///
    /// Only structured bodies take fields; opaque bodies ignore them.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Body::Structured(map) = &mut self.body {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Override the content type; `None` omits it.
    #[must_use]
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Attach an error at construction time.
    #[must_use]
    pub fn with_error(mut self, err: DomainError) -> Self {
        self.errors.push(err);
        self
    }

    /// Attach several errors at construction time.
    #[must_use]
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = DomainError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    pub fn errors(&self) -> &[DomainError] {
        &self.errors
    }

    /// Attached errors projected with the single-vs-list rule.
    pub fn error_value(&self) -> Option<Value> {
        project(&self.errors)
    }

    /// Body with attached errors folded in and internal fields stripped.
    ///
    /// An opaque body without errors is returned unchanged.
    pub fn folded_body(&self) -> Body {
        match self.error_value() {
            None => self.body.clone(),
            Some(mut payload) => {
                strip_action(&mut payload);
                Body::Structured(self.body.clone().fold_errors(payload))
            }
        }
    }

    /// Generic boundary representation.
    ///
    /// `{"status_code", "content_type", "headers" (omitted if absent), "body"}`,
    /// where a binary body is rendered as base64 text.
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert(
            "status_code".to_string(),
            Value::from(self.status_code.as_u16()),
        );
        dict.insert(
            "content_type".to_string(),
            self.content_type.clone().map_or(Value::Null, Value::from),
        );
        if let Some(headers) = &self.headers {
            let headers = headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect();
            dict.insert("headers".to_string(), Value::Object(headers));
        }
        dict.insert("body".to_string(), body_value(self.folded_body()));
        dict
    }
}

/// Remove the internal `action` hint from serialized errors, nested causes included.
pub(crate) fn strip_action(payload: &mut Value) {
    match payload {
        Value::Array(errors) => errors.iter_mut().for_each(strip_action),
        Value::Object(error) => {
            error.retain(|key, _| key != "action");
            if let Some(inner) = error.get_mut("inner") {
                strip_action(inner);
            }
        }
        _ => {}
    }
}

pub(crate) fn body_value(body: Body) -> Value {
    use base64::Engine as _;

    match body {
        Body::Structured(map) => Value::Object(map),
        Body::Text(text) => Value::String(text),
        Body::Binary(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
