// SQLite Driver Family
// Implements the driver, forge and utility traits over rusqlite

use crate::db::traits::{
    ColumnDef, ConnectionParameters, DatabaseDriver, DatabaseError, DatabaseForge,
    DatabaseUtility,
};
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub const FAMILY: &str = "sqlite3";

/// SQLite connection handle.
///
/// The database field of the parameter set is the file path; `:memory:`
/// opens an in-memory database.
pub struct SqliteDriver {
    params: ConnectionParameters,
    query_builder: bool,
    conn: Mutex<Option<RusqliteConnection>>,
    conn_id: parking_lot::RwLock<String>,
}

impl SqliteDriver {
    pub fn new(params: ConnectionParameters, query_builder: bool) -> Self {
        Self {
            params,
            query_builder,
            conn: Mutex::new(None),
            conn_id: parking_lot::RwLock::new(String::new()),
        }
    }

    /// Extract the database path, expanding a leading `~`
    fn database_path(&self) -> Result<String, DatabaseError> {
        let database = &self.params.database;
        if database.is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "SQLite database path is required".to_string(),
            ));
        }

        if let Some(rest) = database.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return Ok(Path::new(&home).join(rest).to_string_lossy().to_string());
            }
        }

        Ok(database.clone())
    }

    fn open_connection(path: &str) -> Result<RusqliteConnection, DatabaseError> {
        if path == ":memory:" {
            return RusqliteConnection::open_in_memory().map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to open SQLite database: {}", e))
            });
        }
        RusqliteConnection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open SQLite database: {}", e))
        })
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| DatabaseError::ConnectionFailed("not connected".to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| DatabaseError::SchemaError(e.to_string()))
    }

    async fn query_strings(&self, sql: &str) -> Result<Vec<String>, DatabaseError> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| DatabaseError::ConnectionFailed("not connected".to_string()))?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::SchemaError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DatabaseDriver for SqliteDriver {
    fn driver_name(&self) -> &str {
        FAMILY
    }

    fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        let path = self.database_path()?;
        let conn = Self::open_connection(&path)?;

        *self.conn.lock().await = Some(conn);
        *self.conn_id.write() = uuid::Uuid::new_v4().to_string();
        debug!(database = %path, "sqlite connection opened");
        Ok(())
    }

    fn conn_id(&self) -> String {
        self.conn_id.read().clone()
    }

    fn query_builder(&self) -> bool {
        self.query_builder
    }

    async fn close(&self) {
        *self.conn.lock().await = None;
        self.conn_id.write().clear();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sqlite_of(db: &Arc<dyn DatabaseDriver>) -> Result<&SqliteDriver, DatabaseError> {
    db.as_any()
        .downcast_ref::<SqliteDriver>()
        .ok_or_else(|| DatabaseError::ConnectionFailed("not a sqlite3 connection".to_string()))
}

/// Schema manipulation for SQLite databases.
///
/// Database-level operations do not exist for a file database and report
/// `Unsupported`.
pub struct SqliteForge {
    db: Arc<dyn DatabaseDriver>,
}

impl SqliteForge {
    pub fn new(db: Arc<dyn DatabaseDriver>) -> Self {
        Self { db }
    }

    fn render_column(column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            quote_identifier(&column.name),
            column.data_type
        );
        if column.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if !column.is_nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

#[async_trait::async_trait]
impl DatabaseForge for SqliteForge {
    fn driver_name(&self) -> &str {
        FAMILY
    }

    fn db(&self) -> Arc<dyn DatabaseDriver> {
        Arc::clone(&self.db)
    }

    async fn create_database(&self, _name: &str) -> Result<(), DatabaseError> {
        Err(DatabaseError::Unsupported {
            driver: FAMILY.to_string(),
            operation: "create_database".to_string(),
        })
    }

    async fn drop_database(&self, _name: &str) -> Result<(), DatabaseError> {
        Err(DatabaseError::Unsupported {
            driver: FAMILY.to_string(),
            operation: "drop_database".to_string(),
        })
    }

    async fn create_table(
        &self,
        name: &str,
        columns: &[ColumnDef],
        if_not_exists: bool,
    ) -> Result<(), DatabaseError> {
        if columns.is_empty() {
            return Err(DatabaseError::SchemaError(
                "a table needs at least one column".to_string(),
            ));
        }

        let rendered: Vec<String> = columns.iter().map(Self::render_column).collect();
        let sql = format!(
            "CREATE TABLE {}{} ({})",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_identifier(name),
            rendered.join(", ")
        );
        sqlite_of(&self.db)?.execute_batch(&sql).await
    }

    async fn drop_table(&self, name: &str, if_exists: bool) -> Result<(), DatabaseError> {
        let sql = format!(
            "DROP TABLE {}{}",
            if if_exists { "IF EXISTS " } else { "" },
            quote_identifier(name)
        );
        sqlite_of(&self.db)?.execute_batch(&sql).await
    }
}

/// Administrative operations for SQLite databases.
pub struct SqliteUtility {
    db: Arc<dyn DatabaseDriver>,
}

impl SqliteUtility {
    pub fn new(db: Arc<dyn DatabaseDriver>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl DatabaseUtility for SqliteUtility {
    fn driver_name(&self) -> &str {
        FAMILY
    }

    fn db(&self) -> Arc<dyn DatabaseDriver> {
        Arc::clone(&self.db)
    }

    async fn list_databases(&self) -> Result<Vec<String>, DatabaseError> {
        sqlite_of(&self.db)?
            .query_strings("SELECT name FROM pragma_database_list ORDER BY seq")
            .await
    }

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        sqlite_of(&self.db)?
            .query_strings(
                "SELECT name FROM sqlite_master WHERE type = 'table' \
                 AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .await
    }

    async fn optimize_table(&self, _name: &str) -> Result<(), DatabaseError> {
        // VACUUM is database-wide in SQLite; a per-table request compacts
        // the whole file
        sqlite_of(&self.db)?.execute_batch("VACUUM").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_params() -> ConnectionParameters {
        let mut params = ConnectionParameters::new(FAMILY);
        params.database = ":memory:".to_string();
        params
    }

    async fn connected_driver() -> Arc<dyn DatabaseDriver> {
        let driver: Arc<dyn DatabaseDriver> = Arc::new(SqliteDriver::new(memory_params(), true));
        driver.initialize().await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_initialize_assigns_link_identifier() {
        let driver = SqliteDriver::new(memory_params(), true);
        assert!(!driver.is_connected());

        driver.initialize().await.unwrap();
        assert!(driver.is_connected());
        assert!(!driver.conn_id().is_empty());
    }

    #[tokio::test]
    async fn test_close_clears_link_identifier() {
        let driver = SqliteDriver::new(memory_params(), true);
        driver.initialize().await.unwrap();

        driver.close().await;
        assert!(!driver.is_connected());
        assert_eq!(driver.conn_id(), "");
    }

    #[tokio::test]
    async fn test_missing_path_is_rejected() {
        let driver = SqliteDriver::new(ConnectionParameters::new(FAMILY), true);
        assert!(matches!(
            driver.initialize().await,
            Err(DatabaseError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_file_database_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = ConnectionParameters::new(FAMILY);
        params.database = dir
            .path()
            .join("app.db")
            .to_string_lossy()
            .to_string();

        let driver = SqliteDriver::new(params.clone(), true);
        driver.initialize().await.unwrap();
        assert!(Path::new(&params.database).exists());
    }

    #[tokio::test]
    async fn test_forge_creates_and_drops_tables() {
        let db = connected_driver().await;
        let forge = SqliteForge::new(Arc::clone(&db));
        let utility = SqliteUtility::new(Arc::clone(&db));

        let columns = vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("name", "TEXT").not_null(),
            ColumnDef::new("note", "TEXT"),
        ];
        forge.create_table("people", &columns, false).await.unwrap();
        assert_eq!(utility.list_tables().await.unwrap(), vec!["people"]);

        // IF NOT EXISTS tolerates the duplicate
        forge.create_table("people", &columns, true).await.unwrap();
        assert!(forge.create_table("people", &columns, false).await.is_err());

        forge.drop_table("people", false).await.unwrap();
        assert!(utility.list_tables().await.unwrap().is_empty());
        forge.drop_table("people", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_forge_rejects_database_operations() {
        let db = connected_driver().await;
        let forge = SqliteForge::new(db);

        assert!(matches!(
            forge.create_database("other").await,
            Err(DatabaseError::Unsupported { .. })
        ));
        assert!(matches!(
            forge.drop_database("other").await,
            Err(DatabaseError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_utility_lists_main_database() {
        let db = connected_driver().await;
        let utility = SqliteUtility::new(db);

        let databases = utility.list_databases().await.unwrap();
        assert_eq!(databases, vec!["main"]);
    }

    #[tokio::test]
    async fn test_utility_optimize() {
        let db = connected_driver().await;
        let utility = SqliteUtility::new(Arc::clone(&db));
        utility.optimize_table("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_satellites_share_the_connection() {
        let db = connected_driver().await;
        let forge = SqliteForge::new(Arc::clone(&db));
        let utility = SqliteUtility::new(Arc::clone(&db));

        assert!(Arc::ptr_eq(&forge.db(), &db));
        assert!(Arc::ptr_eq(&utility.db(), &db));

        // Dropping the satellites leaves the connection open
        drop(forge);
        drop(utility);
        assert!(db.is_connected());
    }
}
