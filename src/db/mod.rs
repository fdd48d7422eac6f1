// Database Resolution Module
// Locator parsing, driver dispatch and the connection/forge/utility caches

pub mod config;
pub mod database;
pub mod drivers;
pub mod events;
pub mod factory;
pub mod locator;
pub mod registry;
pub mod traits;

pub use config::{DatabaseSettings, JsonSettingsFile, SettingsSource, StaticSettings};
pub use database::Database;
pub use events::{
    CancellableEvent, ConnectionResolveEvent, EventGate, ExtensionOutcome, ForgeResolveEvent,
    ObserverId, UtilityResolveEvent,
};
pub use factory::build_driver;
pub use locator::{is_locator, parse_locator};
pub use registry::{DriverFactory, DriverKey, DriverRegistry, ForgeFactory, UtilityFactory};
pub use traits::{
    ColumnDef, ConnectionParameters, DatabaseDriver, DatabaseError, DatabaseForge,
    DatabaseUtility, OptionValue,
};
