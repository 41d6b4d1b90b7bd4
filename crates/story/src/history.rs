//! Story session history.
//!
//! Sessions are kept behind a small key-value interface so the backing store
//! can change without touching generation or retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use storyloom_core::config::STATE_DIR;
use storyloom_core::{AppError, AppResult};

/// One generated story and what produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySession {
    pub user: String,
    pub prompt: String,
    pub category: Option<String>,
    pub story: String,
    pub timestamp: DateTime<Utc>,
}

impl StorySession {
    pub fn new(
        user: impl Into<String>,
        prompt: impl Into<String>,
        category: Option<String>,
        story: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            prompt: prompt.into(),
            category,
            story: story.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Key-value store of sessions by id.
pub trait SessionStore: Send + Sync {
    fn put(&self, id: &str, session: &StorySession) -> AppResult<()>;

    fn get(&self, id: &str) -> AppResult<Option<StorySession>>;

    /// All sessions, oldest first.
    fn list(&self) -> AppResult<Vec<(String, StorySession)>>;

    /// Store `session` under a fresh id and return the id.
    fn record(&self, session: &StorySession) -> AppResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.put(&id, session)?;
        Ok(id)
    }
}

/// Sessions in a single pretty-printed JSON object file.
///
/// No durability guarantees: an unreadable or corrupt file is logged and
/// treated as empty, and is overwritten on the next write.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The store at `.storyloom/sessions.json`.
    pub fn for_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(STATE_DIR).join("sessions.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, StorySession> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::error!("Error loading sessions from {:?}: {}", self.path, e);
                return BTreeMap::new();
            }
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::error!("Invalid sessions file {:?}, starting fresh: {}", self.path, e);
            BTreeMap::new()
        })
    }

    fn write_all(&self, sessions: &BTreeMap<String, StorySession>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let json = serde_json::to_string_pretty(sessions)?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::Storage(format!("Failed to write sessions to {:?}: {}", self.path, e))
        })
    }

    fn guard(&self) -> AppResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AppError::Storage("Session store lock poisoned".to_string()))
    }
}

impl SessionStore for JsonFileSessionStore {
    fn put(&self, id: &str, session: &StorySession) -> AppResult<()> {
        let _guard = self.guard()?;
        let mut sessions = self.read_all();
        sessions.insert(id.to_string(), session.clone());
        self.write_all(&sessions)?;
        tracing::debug!("Recorded session {} ({} total)", id, sessions.len());
        Ok(())
    }

    fn get(&self, id: &str) -> AppResult<Option<StorySession>> {
        let _guard = self.guard()?;
        Ok(self.read_all().remove(id))
    }

    fn list(&self) -> AppResult<Vec<(String, StorySession)>> {
        let _guard = self.guard()?;
        let mut sessions: Vec<_> = self.read_all().into_iter().collect();
        sessions.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp).then(a.0.cmp(&b.0)));
        Ok(sessions)
    }
}
