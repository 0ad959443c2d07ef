use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HummError, HummResult};

/// Session key holding the visitor's language
pub const LANGUAGE_KEY: &str = "HUMM_LANGUAGE";

/// Per-client key/value store that survives between requests
pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);

    /// Snapshot of every stored value
    fn values(&self) -> BTreeMap<String, String>;
}

/// Session that lives only as long as the value itself
#[derive(Debug, Clone, Default)]
pub struct MemorySession(pub BTreeMap<String, String>);

impl MemorySession {
    pub fn new() -> Self {
        MemorySession(BTreeMap::new())
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    fn values(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

/// Session persisted as a JSON object in a file
///
/// Changes stay in memory until [`JsonFileSession::save`] is called.
#[derive(Debug, Clone)]
pub struct JsonFileSession {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileSession {
    /// Open the session file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> HummResult<Self> {
        let path = path.into();
        let values = if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| HummError::io(&path, e))?;
            serde_json::from_str(&content)
                .map_err(|e| HummError::Session(format!("{}: {}", path.display(), e)))?
        } else {
            debug!(path = %path.display(), "Starting a new session file");
            BTreeMap::new()
        };
        Ok(JsonFileSession { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> HummResult<()> {
        let content = serde_json::to_string_pretty(&self.values)
            .map_err(|e| HummError::Session(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| HummError::io(&self.path, e))
    }
}

impl SessionStore for JsonFileSession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn values(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}
