// Database Settings
// Named connection groups supplied by the hosting application

use crate::db::traits::{ConnectionParameters, DatabaseError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Named connection groups plus the group used when no key is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub active_group: Option<String>,
    #[serde(default)]
    pub databases: std::collections::HashMap<String, ConnectionParameters>,
}

impl DatabaseSettings {
    /// Resolve a bare group key to its connection parameters.
    ///
    /// An empty key selects the configured active group.
    pub fn resolve_group(&self, key: &str) -> Result<ConnectionParameters, DatabaseError> {
        if self.databases.is_empty() {
            return Err(DatabaseError::NoConnectionSettings);
        }

        let group = if key.is_empty() {
            self.active_group
                .as_deref()
                .ok_or(DatabaseError::NoActiveGroupSpecified)?
        } else {
            key
        };

        self.databases
            .get(group)
            .cloned()
            .ok_or_else(|| DatabaseError::UnknownConnectionGroup(group.to_string()))
    }
}

/// Source of database settings.
///
/// The resolver consults this only when a bare key is given instead of a
/// locator string.
pub trait SettingsSource: Send + Sync {
    fn database_settings(&self) -> Result<DatabaseSettings, DatabaseError>;
}

/// In-memory settings, for embedding and tests.
pub struct StaticSettings(pub DatabaseSettings);

impl SettingsSource for StaticSettings {
    fn database_settings(&self) -> Result<DatabaseSettings, DatabaseError> {
        Ok(self.0.clone())
    }
}

/// Settings read from a JSON file on every lookup, so edits take effect on
/// the next resolution without a restart.
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Per-user default settings location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "dbresolve", "dbresolve")
            .map(|dirs| dirs.config_dir().join("database.json"))
    }
}

impl SettingsSource for JsonSettingsFile {
    fn database_settings(&self) -> Result<DatabaseSettings, DatabaseError> {
        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| DatabaseError::InvalidConfig(e.to_string()))
    }
}
