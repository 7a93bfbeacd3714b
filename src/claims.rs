//! Bearer token claim reader.
//!
//! Decodes the payload segment of a `header.payload.signature` token. Decoding never
//! fails the caller: any malformed input simply yields no claims.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::{Map, Value};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Claim names that may carry the role, in precedence order.
pub const ROLE_CLAIM_KEYS: &[&str] = &["role", "roles", "user_role"];

// Standard alphabet after the URL-safe substitution; tolerant of sloppy encoders.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> { self.0.get(name) }
    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }
    pub fn into_map(self) -> Map<String, Value> { self.0 }

    pub fn subject(&self) -> Option<&str> { self.0.get("sub").and_then(|v| v.as_str()) }

    /// `exp` as seconds since the epoch.
    pub fn expires_at(&self) -> Option<i64> { self.0.get("exp").and_then(|v| v.as_i64()) }

    /// First role found across `ROLE_CLAIM_KEYS`: a string value directly, or the first
    /// string element of a list. Other value types are skipped.
    pub fn role(&self) -> Option<String> {
        ROLE_CLAIM_KEYS.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => items
                .iter()
                .find_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            _ => None,
        })
    }
}

/// Strip an optional `Bearer ` scheme marker.
pub fn strip_scheme(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token)
}

pub fn decode_claims(token: &str) -> Option<Claims> {
    let bare = strip_scheme(token.trim());
    let mut parts = bare.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;
    let json = base64url_to_utf8(payload)?;
    match serde_json::from_str::<Value>(&json).ok()? {
        Value::Object(map) => Some(Claims(map)),
        _ => None,
    }
}

pub fn role_from_token(token: &str) -> Option<String> {
    decode_claims(token)?.role()
}

fn base64url_to_utf8(segment: &str) -> Option<String> {
    let mut s: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while s.len() % 4 != 0 {
        s.push('=');
    }
    let bytes = PAYLOAD_ENGINE.decode(s.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn decodes_exact_payload_object() {
        let payload = json!({"sub": "alice", "role": "admin", "exp": 1_900_000_000i64, "name": "Äl?ce>>"});
        let claims = decode_claims(&token_with(&payload)).expect("claims");
        assert_eq!(Value::Object(claims.clone().into_map()), payload);
        assert_eq!(claims.subject(), Some("alice"));
        assert_eq!(claims.expires_at(), Some(1_900_000_000));
    }

    #[test]
    fn strips_bearer_prefix() {
        let t = format!("Bearer {}", token_with(&json!({"role": "manager"})));
        assert_eq!(role_from_token(&t).as_deref(), Some("manager"));
    }

    #[test]
    fn malformed_tokens_yield_no_claims() {
        assert!(decode_claims("").is_none());
        assert!(decode_claims("single-segment").is_none());
        assert!(decode_claims("abc.!!!!.sig").is_none());
        // valid base64 but not JSON
        let not_json = URL_SAFE_NO_PAD.encode(b"hello world");
        assert!(decode_claims(&format!("h.{not_json}.s")).is_none());
        // valid base64 but not UTF-8
        let not_utf8 = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(decode_claims(&format!("h.{not_utf8}.s")).is_none());
        // JSON but not an object
        let arr = URL_SAFE_NO_PAD.encode(b"[1,2]");
        assert!(decode_claims(&format!("h.{arr}.s")).is_none());
        // the scenario token from login fixtures
        assert!(decode_claims("abc.def.ghi").is_none());
    }

    #[test]
    fn two_segments_are_enough() {
        let body = URL_SAFE_NO_PAD.encode(br#"{"roles":["employee"]}"#);
        assert_eq!(role_from_token(&format!("h.{body}")).as_deref(), Some("employee"));
    }

    #[test]
    fn role_precedence_follows_claim_key_order() {
        let t = token_with(&json!({"user_role": "employee", "roles": ["manager"], "role": "admin"}));
        assert_eq!(role_from_token(&t).as_deref(), Some("admin"));

        let t = token_with(&json!({"user_role": "employee", "roles": [7, "manager"]}));
        assert_eq!(role_from_token(&t).as_deref(), Some("manager"));

        // non-string role objects are skipped, not stringified
        let t = token_with(&json!({"role": {"name": "admin"}, "user_role": "employee"}));
        assert_eq!(role_from_token(&t).as_deref(), Some("employee"));

        let t = token_with(&json!({"roles": [1, 2]}));
        assert_eq!(role_from_token(&t), None);
    }
}
