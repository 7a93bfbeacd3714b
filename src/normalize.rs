//! Response normalization: one place that turns a raw HTTP response into either a
//! parsed payload or a structured `ApiError`.
//!
//! The response is consumed by value, so the body is read at most once per response.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Successful response content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// No content (204/205, or an empty body).
    Empty,
    Json(Value),
    /// Body that did not parse as JSON, kept verbatim.
    Text(String),
}

impl Payload {
    pub fn is_empty(&self) -> bool { matches!(self, Payload::Empty) }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// String content: raw text, or a JSON string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s.as_str()),
            Payload::Json(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Field lookup on a JSON object body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.get(key))
    }

    pub fn into_json(self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(v) => v,
            Payload::Text(s) => Value::String(s),
        }
    }
}

fn is_no_content(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT
}

/// Read and classify a response. No-content statuses never touch the body.
pub async fn normalize(response: reqwest::Response) -> ApiResult<Payload> {
    let status = response.status();
    let url = response.url().to_string();
    if is_no_content(status) {
        return Ok(Payload::Empty);
    }
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::network(e.to_string()))?;
    classify(status, &url, &text)
}

/// Pure classification of an already-read body.
pub fn classify(status: StatusCode, url: &str, text: &str) -> ApiResult<Payload> {
    if is_no_content(status) {
        return Ok(Payload::Empty);
    }
    let payload = parse_body(text);
    if status.is_success() {
        return Ok(payload);
    }
    let message = failure_message(status.as_u16(), &payload, text);
    Err(ApiError::Http { status: status.as_u16(), message, body: payload, url: url.to_string() })
}

pub fn parse_body(text: &str) -> Payload {
    if text.is_empty() {
        return Payload::Empty;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(v) => Payload::Json(v),
        Err(_) => Payload::Text(text.to_string()),
    }
}

/// Message precedence: `detail` list, `detail` string, `message`, raw text, `HTTP <status>`.
pub fn failure_message(status: u16, payload: &Payload, raw: &str) -> String {
    if let Some(detail) = payload.get("detail") {
        match detail {
            Value::Array(items) => return items.iter().map(detail_item).collect::<Vec<_>>().join(", "),
            Value::String(s) => return s.clone(),
            _ => {}
        }
    }
    if let Some(Value::String(m)) = payload.get("message") {
        return m.clone();
    }
    if !raw.is_empty() {
        return raw.to_string();
    }
    format!("HTTP {}", status)
}

fn detail_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => match other.get("msg") {
            Some(Value::String(m)) => m.clone(),
            _ => other.to_string(),
        },
    }
}
