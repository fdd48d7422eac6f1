// Built-in Driver Families
// Reference implementations shipped with the resolver

pub mod sqlite;

pub use sqlite::{SqliteDriver, SqliteForge, SqliteUtility};

use crate::db::registry::{
    DriverFactory, DriverKey, DriverRegistry, ForgeFactory, UtilityFactory,
};
use std::sync::Arc;

/// Register every built-in family with the given registry.
pub fn register_builtin(registry: &DriverRegistry) {
    let driver: DriverFactory = Arc::new(|params, query_builder| {
        Ok(Arc::new(SqliteDriver::new(params, query_builder))
            as Arc<dyn crate::db::traits::DatabaseDriver>)
    });
    let forge: ForgeFactory =
        Arc::new(|db| Arc::new(SqliteForge::new(db)) as Arc<dyn crate::db::traits::DatabaseForge>);
    let utility: UtilityFactory = Arc::new(|db| {
        Arc::new(SqliteUtility::new(db)) as Arc<dyn crate::db::traits::DatabaseUtility>
    });

    registry.register_driver(DriverKey::family(sqlite::FAMILY), driver);
    registry.register_forge(DriverKey::family(sqlite::FAMILY), forge);
    registry.register_utility(DriverKey::family(sqlite::FAMILY), utility);
}
