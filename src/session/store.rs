//! Local state that outlives a single view: token, player id of the active
//! match and the queue-membership flag.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    #[serde(default)]
    pub token: Option<String>,
    /// Our player id in the active match.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Set while queueing or paired; cleared on return to idle.
    #[serde(default)]
    pub in_queue: bool,
}

pub trait LocalStore: Send + Sync {
    fn load(&self) -> PersistedState;
    fn save(&mut self, state: &PersistedState) -> Result<(), ClientError>;
}

/// Process-local store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<PersistedState>>,
}

impl MemoryStore {
    pub fn new(state: PersistedState) -> Self {
        MemoryStore {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self::new(PersistedState {
            token: Some(token.to_owned()),
            ..PersistedState::default()
        })
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> PersistedState {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), ClientError> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = state.clone();
        Ok(())
    }
}

/// JSON file on disk; a missing or unreadable file loads as empty state.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> PersistedState {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(ClientError::Store)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).map_err(ClientError::Store)
    }
}
