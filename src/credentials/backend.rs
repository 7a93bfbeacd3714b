use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

/// Persistence lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Survives application restarts.
    Durable,
    /// Cleared when the session (process) ends.
    Session,
}

/// Key/value backing for the credential store. Implementations must not touch the network.
pub trait CredentialBackend: Send + Sync {
    fn get(&self, scope: Scope, key: &str) -> Option<String>;
    fn set(&self, scope: Scope, key: &str, value: &str);
    fn remove(&self, scope: Scope, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    durable: RwLock<HashMap<String, String>>,
    session: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }

    fn map(&self, scope: Scope) -> &RwLock<HashMap<String, String>> {
        match scope {
            Scope::Durable => &self.durable,
            Scope::Session => &self.session,
        }
    }
}

impl CredentialBackend for MemoryBackend {
    fn get(&self, scope: Scope, key: &str) -> Option<String> {
        self.map(scope).read().get(key).cloned()
    }
    fn set(&self, scope: Scope, key: &str, value: &str) {
        self.map(scope).write().insert(key.to_string(), value.to_string());
    }
    fn remove(&self, scope: Scope, key: &str) {
        self.map(scope).write().remove(key);
    }
}

/// Durable scope mirrored to `<dir>/credentials.json`; session scope held in memory only.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    durable: RwLock<HashMap<String, String>>,
    session: RwLock<HashMap<String, String>>,
}

impl FileBackend {
    pub const FILE_NAME: &'static str = "credentials.json";

    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(target: "credentials", "could not create credential dir {:?}: {}", dir, e);
        }
        let path = dir.join(Self::FILE_NAME);
        let durable = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<HashMap<String, String>>(&bytes).unwrap_or_else(|e| {
                warn!(target: "credentials", "ignoring unreadable {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, durable: RwLock::new(durable), session: RwLock::new(HashMap::new()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn persist(&self, map: &HashMap<String, String>) {
        let bytes = match serde_json::to_vec_pretty(map) {
            Ok(b) => b,
            Err(e) => {
                warn!(target: "credentials", "could not encode credentials: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, bytes) {
            warn!(target: "credentials", "could not write {:?}: {}", self.path, e);
        }
    }
}

impl CredentialBackend for FileBackend {
    fn get(&self, scope: Scope, key: &str) -> Option<String> {
        match scope {
            Scope::Durable => self.durable.read().get(key).cloned(),
            Scope::Session => self.session.read().get(key).cloned(),
        }
    }

    fn set(&self, scope: Scope, key: &str, value: &str) {
        match scope {
            Scope::Durable => {
                let mut m = self.durable.write();
                m.insert(key.to_string(), value.to_string());
                self.persist(&m);
            }
            Scope::Session => {
                self.session.write().insert(key.to_string(), value.to_string());
            }
        }
    }

    fn remove(&self, scope: Scope, key: &str) {
        match scope {
            Scope::Durable => {
                let mut m = self.durable.write();
                if m.remove(key).is_some() {
                    self.persist(&m);
                }
            }
            Scope::Session => {
                self.session.write().remove(key);
            }
        }
    }
}
