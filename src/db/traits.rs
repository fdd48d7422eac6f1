// Database Driver Traits
// Defines the core abstraction every driver family implements, plus the
// parameter set and error type shared across the resolver

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A typed extra option attached to a connection.
///
/// Locator query values spelled `TRUE`/`FALSE`/`NULL` (any casing) are
/// normalized to their typed form; everything else stays a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    String(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Unified connection parameter set.
///
/// Produced by the locator parser or looked up from a named configuration
/// group. The driver family must name a registered implementation; an empty
/// family is rejected by the driver factory, never defaulted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionParameters {
    /// Driver family identifier, lower-case (e.g. "sqlite3", "mysql")
    pub driver: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Database name; for file-based families this is the file path
    #[serde(default)]
    pub database: String,
    /// Driver-specific extra options
    #[serde(default)]
    pub options: HashMap<String, OptionValue>,
}

impl ConnectionParameters {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            hostname: String::new(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            options: HashMap::new(),
        }
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }
}

/// Common database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Invalid database connection string: {0}")]
    MalformedLocator(String),

    #[error("No database connection settings were found")]
    NoConnectionSettings,

    #[error("No active database connection group has been specified")]
    NoActiveGroupSpecified,

    #[error("Invalid database connection group: {0}")]
    UnknownConnectionGroup(String),

    #[error("No database driver selected")]
    NoDriverSelected,

    #[error("Invalid database driver: {0}")]
    UnknownDriver(String),

    #[error("Could not load forge, driver is not registered: {0}")]
    ForgeLoadFailure(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Operation not supported by the {driver} driver: {operation}")]
    Unsupported { driver: String, operation: String },

    #[error("Schema operation failed: {0}")]
    SchemaError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Column definition handed to a forge when creating tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            is_primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }
}

/// Database driver trait - one instance per live connection handle.
///
/// A driver owns its family tag and, optionally, a sub-driver tag. The
/// sub-driver tag re-routes factory lookup to a more specific implementation
/// of the same family after the family driver has been constructed.
#[async_trait::async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver family identifier this instance belongs to
    fn driver_name(&self) -> &str;

    /// Sub-driver the constructed instance asks for, if any.
    ///
    /// Stays set on instances built through the sub-driver factory; forge
    /// and utility dispatch rely on it.
    fn subdriver(&self) -> Option<String> {
        None
    }

    /// Parameters the driver was constructed with
    fn parameters(&self) -> &ConnectionParameters;

    /// Bring up the underlying link.
    ///
    /// Invoked once by the driver factory after construction; assigns a
    /// fresh link identifier on success. Failures surface unchanged as the
    /// driver's own connection errors.
    async fn initialize(&self) -> Result<(), DatabaseError>;

    /// Link identifier; empty when the driver never connected or was closed
    fn conn_id(&self) -> String;

    /// A handle is live while its link identifier is non-empty
    fn is_connected(&self) -> bool {
        !self.conn_id().is_empty()
    }

    /// Whether the query builder layer was attached at construction
    fn query_builder(&self) -> bool;

    /// Tear down the link and clear the link identifier
    async fn close(&self);

    /// Allow downcasting for driver-specific operations
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Schema-manipulation handle scoped to one connection.
///
/// Holds a shared reference to the connection that produced it; dropping a
/// forge never tears down its connection.
#[async_trait::async_trait]
pub trait DatabaseForge: Send + Sync {
    /// Driver family this forge belongs to
    fn driver_name(&self) -> &str;

    /// The connection this forge operates on
    fn db(&self) -> Arc<dyn DatabaseDriver>;

    async fn create_database(&self, name: &str) -> Result<(), DatabaseError>;

    async fn drop_database(&self, name: &str) -> Result<(), DatabaseError>;

    async fn create_table(
        &self,
        name: &str,
        columns: &[ColumnDef],
        if_not_exists: bool,
    ) -> Result<(), DatabaseError>;

    async fn drop_table(&self, name: &str, if_exists: bool) -> Result<(), DatabaseError>;
}

/// Administrative handle scoped to one connection.
#[async_trait::async_trait]
pub trait DatabaseUtility: Send + Sync {
    /// Driver family this utility belongs to
    fn driver_name(&self) -> &str;

    /// The connection this utility operates on
    fn db(&self) -> Arc<dyn DatabaseDriver>;

    async fn list_databases(&self) -> Result<Vec<String>, DatabaseError>;

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    async fn optimize_table(&self, name: &str) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_value_accessors() {
        assert_eq!(OptionValue::Bool(true).as_bool(), Some(true));
        assert_eq!(OptionValue::Null.as_bool(), None);
        assert_eq!(
            OptionValue::String("strict".to_string()).as_str(),
            Some("strict")
        );
    }

    #[test]
    fn test_parameters_round_trip_without_password() {
        let mut params = ConnectionParameters::new("mysql");
        params.hostname = "db.internal".to_string();
        params.port = Some(3306);
        params.username = "app".to_string();
        params.password = "hunter2".to_string();
        params.database = "orders".to_string();
        params
            .options
            .insert("strict".to_string(), OptionValue::Bool(true));

        let json = serde_json::to_string(&params).unwrap();
        // The password never leaves the process through serialization
        assert!(!json.contains("hunter2"));

        let back: ConnectionParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back.driver, "mysql");
        assert_eq!(back.port, Some(3306));
        assert_eq!(back.password, "");
        assert_eq!(back.option("strict"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_option_value_deserializes_untagged() {
        let raw = r#"{"a": true, "b": null, "c": "utf8mb4"}"#;
        let options: HashMap<String, OptionValue> = serde_json::from_str(raw).unwrap();
        assert_eq!(options["a"], OptionValue::Bool(true));
        assert_eq!(options["b"], OptionValue::Null);
        assert_eq!(options["c"], OptionValue::String("utf8mb4".to_string()));
    }

    #[test]
    fn test_column_def_builders() {
        let id = ColumnDef::new("id", "INTEGER").primary_key();
        assert!(id.is_primary_key);
        assert!(!id.is_nullable);

        let name = ColumnDef::new("name", "TEXT").not_null();
        assert!(!name.is_primary_key);
        assert!(!name.is_nullable);
    }
}
