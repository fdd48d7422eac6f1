// dbresolve
// Named-connection resolution and driver-dispatch registry.
//
// A `Database` value resolves connection identifiers - locator strings,
// named configuration groups, or observer-supplied handles - to exactly one
// live driver instance per cache key, plus forge and utility satellites
// bound to the same driver family. Three priority-ordered event gates let
// embedding code substitute, mutate, or veto any resolution.

pub mod db;

pub use db::{
    build_driver, is_locator, parse_locator, CancellableEvent, ColumnDef, ConnectionParameters,
    ConnectionResolveEvent, Database, DatabaseDriver, DatabaseError, DatabaseForge,
    DatabaseSettings, DatabaseUtility, DriverFactory, DriverKey, DriverRegistry, EventGate,
    ExtensionOutcome, ForgeFactory, ForgeResolveEvent, JsonSettingsFile, ObserverId, OptionValue,
    SettingsSource, StaticSettings, UtilityFactory, UtilityResolveEvent,
};
