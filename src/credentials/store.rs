use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::backend::{CredentialBackend, MemoryBackend, Scope};

pub const TOKEN_KEY: &str = "auth_token";
pub const ROLE_KEY: &str = "user_role"; // "admin" | "manager" | "employee" (string)

/// Process-wide holder for the bearer token and resolved role.
///
/// Constructed once and cloned into the dispatcher and auth flow. A write to one scope
/// clears the same key from the other, and Durable wins on reads. Read/write pairs run
/// under one lock so a reader never observes a half-saved credential.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn CredentialBackend>,
    lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").field("authenticated", &self.is_authenticated()).finish()
    }
}

fn scope_for(remember: bool) -> (Scope, Scope) {
    if remember { (Scope::Durable, Scope::Session) } else { (Scope::Session, Scope::Durable) }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self { backend, lock: Arc::new(Mutex::new(())) }
    }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryBackend::new())) }

    /// Persist token and role together. `role = None` drops any previously stored role.
    pub fn save(&self, token: &str, role: Option<&str>, remember: bool) {
        let _g = self.lock.lock();
        self.write_key(TOKEN_KEY, Some(token), remember);
        self.write_key(ROLE_KEY, role, remember);
        debug!(target: "credentials", remember, has_role = role.is_some(), "credential saved");
    }

    /// Persist a fresh token and drop any stored role in the same locked section, so a
    /// reader never pairs the new token with the previous holder's role.
    pub fn save_token(&self, token: &str, remember: bool) {
        let _g = self.lock.lock();
        self.write_key(TOKEN_KEY, Some(token), remember);
        self.backend.remove(Scope::Durable, ROLE_KEY);
        self.backend.remove(Scope::Session, ROLE_KEY);
    }

    pub fn save_role(&self, role: Option<&str>, remember: bool) {
        let _g = self.lock.lock();
        self.write_key(ROLE_KEY, role, remember);
    }

    /// Durable value if present, else Session value.
    pub fn read(&self, key: &str) -> Option<String> {
        let _g = self.lock.lock();
        self.read_key(key)
    }

    pub fn token(&self) -> Option<String> { self.read(TOKEN_KEY) }
    pub fn role(&self) -> Option<String> { self.read(ROLE_KEY) }

    /// Token and role read together under one lock.
    pub fn snapshot(&self) -> (Option<String>, Option<String>) {
        let _g = self.lock.lock();
        (self.read_key(TOKEN_KEY), self.read_key(ROLE_KEY))
    }

    pub fn is_authenticated(&self) -> bool { self.token().is_some() }

    pub fn clear(&self) {
        let _g = self.lock.lock();
        for key in [TOKEN_KEY, ROLE_KEY] {
            self.backend.remove(Scope::Durable, key);
            self.backend.remove(Scope::Session, key);
        }
        debug!(target: "credentials", "credential cleared");
    }

    fn read_key(&self, key: &str) -> Option<String> {
        self.backend
            .get(Scope::Durable, key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.backend.get(Scope::Session, key).filter(|v| !v.is_empty()))
    }

    fn write_key(&self, key: &str, value: Option<&str>, remember: bool) {
        let (active, other) = scope_for(remember);
        self.backend.remove(other, key);
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.backend.set(active, key, v),
            None => self.backend.remove(active, key),
        }
    }
}
