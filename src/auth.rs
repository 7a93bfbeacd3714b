//! Login and role discovery.
//!
//! Trust order for the role: login response body, then token claims, then (only if both
//! are empty) an identity endpoint probed with the fresh token.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::claims::role_from_token;
use crate::credentials::{CredentialStore, Role};
use crate::dispatch::{bearer_value, walk, Dispatcher};
use crate::endpoints::EndpointResolver;
use crate::error::{ApiError, ApiResult};
use crate::normalize::Payload;

pub const NO_TOKEN_MESSAGE: &str = "No token in response";

/// Body fields that may carry a role label, in precedence order.
pub const LOGIN_ROLE_FIELDS: &[&str] = &["role", "roles", "user_role", "role_label", "userRole"];

pub type TokenExtractor = fn(&Payload) -> Option<String>;

fn access_token_field(p: &Payload) -> Option<String> { string_field(p.as_json()?, "access_token") }
fn token_field(p: &Payload) -> Option<String> { string_field(p.as_json()?, "token") }
fn raw_string_body(p: &Payload) -> Option<String> {
    p.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Token sources in precedence order.
pub const TOKEN_EXTRACTORS: &[TokenExtractor] = &[access_token_field, token_field, raw_string_body];

pub fn extract_token(payload: &Payload) -> Option<String> {
    TOKEN_EXTRACTORS.iter().find_map(|f| f(payload))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    LoginResponse,
    TokenClaim,
    IdentityEndpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleResolution {
    pub role: Option<String>,
    pub source: Option<RoleSource>,
}

impl RoleResolution {
    fn found(role: String, source: RoleSource) -> Self { Self { role: Some(role), source: Some(source) } }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Option<String>,
    pub role_source: Option<RoleSource>,
    /// The successful login response, as received.
    pub body: Payload,
}

fn string_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Role-ish fields on one object level: plain strings first, then `role.name`.
fn role_in_object(v: &Value) -> Option<String> {
    if !v.is_object() { return None; }
    LOGIN_ROLE_FIELDS
        .iter()
        .find_map(|key| string_field(v, key))
        .or_else(|| v.get("role").and_then(|r| string_field(r, "name")))
}

/// Role from a login (or identity) body, including one level of nesting under `user`.
pub fn role_from_body(payload: &Payload) -> Option<String> {
    let v = payload.as_json()?;
    role_in_object(v).or_else(|| v.get("user").and_then(role_in_object))
}

pub struct AuthFlow<'a> {
    dispatcher: &'a Dispatcher,
    resolver: &'a EndpointResolver,
}

impl<'a> AuthFlow<'a> {
    pub fn new(dispatcher: &'a Dispatcher, resolver: &'a EndpointResolver) -> Self {
        Self { dispatcher, resolver }
    }

    fn store(&self) -> &CredentialStore { self.dispatcher.credentials() }

    /// Walk every login path and encoding until one yields a token, persist it, then
    /// resolve and persist the role. A missing role is not an error.
    pub async fn login(&self, identifier: &str, password: &str, remember: bool) -> ApiResult<LoginOutcome> {
        let plan = self.resolver.login(identifier, password);
        info!(target: "auth", candidates = plan.len(), remember, "login started for '{}'", identifier);

        let (token, body) = walk(&plan, |candidate| async move {
            let body = self.dispatcher.send(candidate).await?;
            let found: ApiResult<(String, Payload)> = match extract_token(&body) {
                Some(token) => Ok((token, body)),
                None => Err(ApiError::protocol(NO_TOKEN_MESSAGE)),
            };
            found
        })
        .await?;

        // Persist first: the identity probe may need the token.
        self.store().save_token(&token, remember);

        let resolution = self.resolve_role(&token, &body).await;
        self.store().save_role(resolution.role.as_deref(), remember);
        info!(
            target: "auth",
            role = resolution.role.as_deref().unwrap_or("<none>"),
            source = ?resolution.source,
            "login succeeded for '{}'", identifier
        );
        Ok(LoginOutcome { token, role: resolution.role, role_source: resolution.source, body })
    }

    pub async fn resolve_role(&self, token: &str, login_body: &Payload) -> RoleResolution {
        if let Some(r) = role_from_body(login_body) {
            return RoleResolution::found(r, RoleSource::LoginResponse);
        }
        if let Some(r) = role_from_token(token) {
            return RoleResolution::found(r, RoleSource::TokenClaim);
        }
        match self.probe_identity(token).await {
            Some(r) => RoleResolution::found(r, RoleSource::IdentityEndpoint),
            None => RoleResolution::default(),
        }
    }

    /// Try identity endpoints with an explicit bearer header. Discovery is best effort:
    /// a success without a role or any failure moves on to the next endpoint.
    async fn probe_identity(&self, token: &str) -> Option<String> {
        let auth = match HeaderValue::from_str(&bearer_value(token)) {
            Ok(v) => v,
            Err(_) => {
                warn!(target: "auth", "token is not a valid header value; skipping identity probe");
                return None;
            }
        };
        for candidate in self.resolver.identity().candidates() {
            let candidate = candidate.clone().with_header(AUTHORIZATION, auth.clone());
            let path = candidate.path().to_string();
            match self.dispatcher.send(candidate).await {
                Ok(body) => {
                    if let Some(role) = role_from_body(&body) {
                        return Some(role);
                    }
                    debug!(target: "auth", path = %path, "identity response carried no role");
                }
                Err(err) => {
                    warn!(target: "auth", path = %path, status = ?err.status(), "identity probe failed: {}", err);
                }
            }
        }
        None
    }

    /// Identity payload for the stored credential.
    pub async fn me(&self) -> ApiResult<Payload> {
        self.dispatcher.execute(&self.resolver.identity()).await
    }

    pub fn logout(&self) {
        self.store().clear();
        info!(target: "auth", "logged out");
    }

    pub fn is_authenticated(&self) -> bool { self.store().is_authenticated() }

    pub fn current_role(&self) -> Option<Role> {
        self.store().role().as_deref().and_then(Role::parse)
    }

    /// "No role" is authenticated but not elevated.
    pub fn has_elevated_access(&self) -> bool {
        self.is_authenticated() && self.current_role().is_some_and(|r| r.grants_elevated_access())
    }
}
