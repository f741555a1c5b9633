//! Persistence for the admin's featured event selection.
//!
//! One string id, kept in a small JSON file in the platform config directory.
//! The public front page reads it at load time; the admin dashboard sets and
//! clears it. A stale id (one the service can no longer resolve) is cleared
//! by the sync client.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::StoreError;

const STORE_FILE: &str = "featured_event.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSelection {
    featured_event_id: Option<String>,
}

/// File-backed store for the pinned event id.
#[derive(Debug, Clone)]
pub struct FeaturedEventStore {
    path: PathBuf,
}

impl FeaturedEventStore {
    /// Store in the application config directory
    pub fn open_default() -> Self {
        Self::at(Config::app_dir().join(STORE_FILE))
    }

    /// Store at an explicit path (used by tests)
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Currently pinned event id, if any
    pub fn get(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| StoreError::ReadFailed {
            path: self.path.display().to_string(),
            source: Box::new(e),
        })?;
        let stored: StoredSelection =
            serde_json::from_str(&content).map_err(|e| StoreError::ReadFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })?;

        Ok(stored.featured_event_id.filter(|id| !id.is_empty()))
    }

    /// Pin an event id
    pub fn set(&self, event_id: &str) -> Result<(), StoreError> {
        self.write(StoredSelection {
            featured_event_id: Some(event_id.to_string()),
        })
    }

    /// Unpin, falling back to the default upcoming-event selection
    pub fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            self.write(StoredSelection::default())?;
        }
        Ok(())
    }

    fn write(&self, stored: StoredSelection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                path: parent.display().to_string(),
                source: Box::new(e),
            })?;
        }

        let json = serde_json::to_string_pretty(&stored).map_err(|e| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(&self.path, json).map_err(|e| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source: Box::new(e),
        })
    }
}
