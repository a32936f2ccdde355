//! Request parsing and response envelopes shared by every entry point.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::constants::SAFE_ERROR_SLICE;
use crate::env::parse_flag;
use crate::models::CloudProvider;

use super::HandlerError;

/// CORS headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "*"),
    ("Access-Control-Max-Age", "86400"),
];

/// HTTP-style response with a JSON-encoded body string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn json(status_code: u16, body: &Value) -> Self {
        let mut headers: IndexMap<String, String> = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    /// Error envelope. Debug mode adds the error type and the start of
    /// its message; otherwise upstream errors only expose a short code.
    pub fn error(err: &HandlerError, request_id: Option<&str>, debug: bool) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::from(err.reason()));
        if let Some(id) = request_id {
            body.insert("request_id".to_string(), Value::from(id));
        }
        if debug {
            let message: String = err.to_string().chars().take(SAFE_ERROR_SLICE).collect();
            body.insert(
                "detail".to_string(),
                json!({ "type": err.kind(), "message": message }),
            );
        } else if let Some(code) = err.code() {
            body.insert("detail".to_string(), json!({ "type": err.kind(), "code": code }));
        }
        Self::json(err.status(), &Value::Object(body))
    }

    /// Decode the body back into JSON.
    pub fn body_json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Fields of an incoming event.
///
/// Fields are looked up in the body first (a JSON string or an object),
/// then at the top level of the event.
#[derive(Debug, Clone, Default)]
pub struct Request {
    body: Map<String, Value>,
    top: Map<String, Value>,
    query: Map<String, Value>,
}

impl Request {
    pub fn from_event(event: &Value) -> Self {
        let top = event.as_object().cloned().unwrap_or_default();
        let body = match top.get("body") {
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let query = top
            .get("queryStringParameters")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { body, top, query }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body
            .get(name)
            .filter(|v| !v.is_null())
            .or_else(|| self.top.get(name).filter(|v| !v.is_null()))
    }

    /// Non-empty string field.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn require_str(&self, name: &'static str) -> Result<&str, HandlerError> {
        self.str_field(name).ok_or(HandlerError::MissingField(name))
    }

    pub fn request_id(&self) -> Result<&str, HandlerError> {
        self.require_str("request_id")
    }

    pub fn cloud(&self) -> Result<CloudProvider, HandlerError> {
        let raw = self.require_str("cloud")?;
        raw.parse().map_err(|_| HandlerError::InvalidField {
            field: "cloud",
            reason: "must be one of: aws, azure, gcp".to_string(),
        })
    }

    /// Whether `?debug=` is set to a truthy value.
    pub fn query_debug(&self) -> bool {
        match self.query.get("debug") {
            Some(Value::String(s)) => parse_flag(s).unwrap_or(false),
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_u64() == Some(1),
            _ => false,
        }
    }
}
