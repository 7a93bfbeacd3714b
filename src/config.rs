//! Client configuration: base URL and the candidate route tables.
//!
//! Resolved once at startup and handed to the dispatcher; nothing reads the environment
//! per request.

use std::path::Path;

use anyhow::Context;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};

pub const ENV_API_URL: &str = "TASKDESK_API_URL";
pub const ENV_API_PREFIX: &str = "TASKDESK_API_PREFIX";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Route layout of one resource family, relative to a prefix.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ResourceRoutes {
    /// Collection path, e.g. `/tasks`. Item paths are `<collection>/<id>`.
    pub collection: String,
    /// "My items" listing variants, most specific first.
    #[serde(default)]
    pub mine: Vec<String>,
    /// Filtered/team listing variants, most specific first.
    #[serde(default)]
    pub search: Vec<String>,
}

impl ResourceRoutes {
    pub fn collection_only(collection: &str) -> Self {
        Self { collection: collection.to_string(), mine: Vec::new(), search: Vec::new() }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RouteConfig {
    /// Path prefixes tried in order for every route; `""` is the unprefixed form.
    pub prefixes: Vec<String>,
    pub tasks: ResourceRoutes,
    pub users: ResourceRoutes,
    pub login_paths: Vec<String>,
    pub identity_paths: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["/api".into(), String::new()],
            tasks: ResourceRoutes {
                collection: "/tasks".into(),
                mine: vec!["/tasks/me".into(), "/tasks/my".into()],
                search: vec!["/tasks/search".into(), "/tasks/team".into(), "/tasks".into()],
            },
            users: ResourceRoutes::collection_only("/users"),
            login_paths: vec!["/auth/login".into(), "/login".into(), "/auth/token".into(), "/token".into()],
            identity_paths: vec!["/users/me".into(), "/auth/me".into(), "/me".into()],
        }
    }
}

impl RouteConfig {
    /// Put `prefix` first, keeping the unprefixed form as the fallback.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let p = prefix.trim().trim_end_matches('/');
        self.prefixes = if p.is_empty() { vec![String::new()] } else { vec![normalize_path(p), String::new()] };
        self
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub routes: RouteConfig,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            routes: RouteConfig::default(),
            user_agent: concat!("taskdesk-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.to_string(), ..Default::default() }
    }

    /// `TASKDESK_API_URL` selects the backend; `TASKDESK_API_PREFIX` (if non-empty) replaces
    /// the default `/api` prefix.
    pub fn from_env() -> Self {
        let base = std::env::var(ENV_API_URL).ok().filter(|s| !s.trim().is_empty());
        let prefix = std::env::var(ENV_API_PREFIX).ok().filter(|s| !s.trim().is_empty());
        let mut cfg = Self::new(base.as_deref().unwrap_or(DEFAULT_BASE_URL));
        if let Some(p) = prefix.as_deref() {
            cfg.routes = cfg.routes.with_prefix(p);
        }
        info!(
            target: "config",
            "client config from env: base_url='{}', prefixes={:?}",
            cfg.base_url, cfg.routes.prefixes
        );
        cfg
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading client config {:?}", path))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing client config {:?}", path))?;
        Ok(cfg)
    }

    /// Base URL without trailing slashes, validated as absolute.
    pub fn resolved_base(&self) -> ApiResult<String> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| ApiError::config(format!("invalid base URL '{}': {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::config(format!("base URL '{}' cannot carry paths", self.base_url)));
        }
        Ok(trimmed.to_string())
    }
}

/// Ensure a single leading slash and no trailing slash.
pub(crate) fn normalize_path(path: &str) -> String {
    let p = path.trim().trim_end_matches('/');
    if p.is_empty() {
        String::new()
    } else if p.starts_with('/') {
        p.to_string()
    } else {
        format!("/{}", p)
    }
}
