// Driver Dispatch Registry
// Registration-time mapping from (family, subfamily) to the factories that
// construct drivers, forges and utilities

use crate::db::traits::{
    ConnectionParameters, DatabaseDriver, DatabaseError, DatabaseForge, DatabaseUtility,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Two-part driver lookup key.
///
/// A bare family selects the family-level implementation; a subfamily
/// selects the more specific one nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverKey {
    pub family: String,
    pub subfamily: Option<String>,
}

impl DriverKey {
    pub fn family(family: &str) -> Self {
        Self {
            family: family.to_ascii_lowercase(),
            subfamily: None,
        }
    }

    pub fn subfamily(family: &str, subfamily: &str) -> Self {
        Self {
            family: family.to_ascii_lowercase(),
            subfamily: Some(subfamily.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for DriverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subfamily {
            Some(sub) => write!(f, "{}_{}", self.family, sub),
            None => write!(f, "{}", self.family),
        }
    }
}

/// Constructs a driver instance from a parameter set and the query-builder
/// flag. Construction must not touch the network; `initialize()` does that.
pub type DriverFactory = Arc<
    dyn Fn(ConnectionParameters, bool) -> Result<Arc<dyn DatabaseDriver>, DatabaseError>
        + Send
        + Sync,
>;

/// Constructs a forge bound to an existing connection.
pub type ForgeFactory =
    Arc<dyn Fn(Arc<dyn DatabaseDriver>) -> Arc<dyn DatabaseForge> + Send + Sync>;

/// Constructs a utility bound to an existing connection.
pub type UtilityFactory =
    Arc<dyn Fn(Arc<dyn DatabaseDriver>) -> Arc<dyn DatabaseUtility> + Send + Sync>;

/// Registry of driver-family implementations.
///
/// Lookup is a pure mapping from key to factory; an absent key is a
/// definite, reportable failure surfaced by the caller, never a retry.
pub struct DriverRegistry {
    drivers: RwLock<HashMap<DriverKey, DriverFactory>>,
    forges: RwLock<HashMap<DriverKey, ForgeFactory>>,
    utilities: RwLock<HashMap<DriverKey, UtilityFactory>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
            forges: RwLock::new(HashMap::new()),
            utilities: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-loaded with the built-in driver families
    pub fn with_builtin_drivers() -> Self {
        let registry = Self::new();
        crate::db::drivers::register_builtin(&registry);
        registry
    }

    /// Register a driver factory under a key, replacing any previous one
    pub fn register_driver(&self, key: DriverKey, factory: DriverFactory) {
        debug!(driver = %key, "registering database driver");
        self.drivers.write().insert(key, factory);
    }

    /// Register a forge factory under a key
    pub fn register_forge(&self, key: DriverKey, factory: ForgeFactory) {
        debug!(driver = %key, "registering database forge");
        self.forges.write().insert(key, factory);
    }

    /// Register a utility factory under a key
    pub fn register_utility(&self, key: DriverKey, factory: UtilityFactory) {
        debug!(driver = %key, "registering database utility");
        self.utilities.write().insert(key, factory);
    }

    pub fn driver_factory(&self, key: &DriverKey) -> Option<DriverFactory> {
        self.drivers.read().get(key).cloned()
    }

    pub fn forge_factory(&self, key: &DriverKey) -> Option<ForgeFactory> {
        self.forges.read().get(key).cloned()
    }

    pub fn utility_factory(&self, key: &DriverKey) -> Option<UtilityFactory> {
        self.utilities.read().get(key).cloned()
    }

    pub fn has_driver(&self, key: &DriverKey) -> bool {
        self.drivers.read().contains_key(key)
    }

    /// Remove a family and all of its subfamilies from every table
    pub fn unregister_family(&self, family: &str) {
        let family = family.to_ascii_lowercase();
        self.drivers.write().retain(|key, _| key.family != family);
        self.forges.write().retain(|key, _| key.family != family);
        self.utilities.write().retain(|key, _| key.family != family);
        debug!(driver = %family, "unregistered database driver family");
    }

    /// All registered driver families, sorted and de-duplicated
    pub fn supported_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .drivers
            .read()
            .keys()
            .map(|key| key.family.clone())
            .collect();
        families.sort();
        families.dedup();
        families
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
