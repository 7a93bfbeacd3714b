//! Thin resource clients: map calls onto candidate plans, no policy of their own.

mod tasks;
mod users;

pub use tasks::TasksClient;
pub use users::UsersClient;

use serde_json::Value;

use crate::normalize::Payload;

/// Envelope keys that may wrap a list response, in precedence order.
pub const LIST_ENVELOPE_KEYS: &[&str] = &["items", "results", "data"];

/// A bare array, or the first array found under `items`, `results` or `data`.
pub fn list_payload(payload: Payload) -> Vec<Value> {
    match payload.into_json() {
        Value::Array(items) => items,
        Value::Object(mut map) => LIST_ENVELOPE_KEYS
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
