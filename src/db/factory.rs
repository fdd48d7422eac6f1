// Driver Construction
// Family dispatch with the two-level sub-driver fallback

use crate::db::registry::{DriverKey, DriverRegistry};
use crate::db::traits::{ConnectionParameters, DatabaseDriver, DatabaseError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Build and initialize a driver for the given parameter set.
///
/// The family driver is constructed first. If the constructed instance
/// self-reports a sub-driver, lookup is re-routed to `(family, sub)` and the
/// instance is rebuilt through that factory; an unregistered sub-driver is
/// not an error - the family-level instance is kept. The final instance is
/// `initialize()`d before it is handed back, so connection bring-up failures
/// surface here as the driver's own errors.
pub async fn build_driver(
    registry: &DriverRegistry,
    params: ConnectionParameters,
    query_builder: Option<bool>,
) -> Result<Arc<dyn DatabaseDriver>, DatabaseError> {
    if params.driver.is_empty() {
        return Err(DatabaseError::NoDriverSelected);
    }

    let family_key = DriverKey::family(&params.driver);
    let factory = registry
        .driver_factory(&family_key)
        .ok_or_else(|| DatabaseError::UnknownDriver(params.driver.clone()))?;

    let query_builder = query_builder.unwrap_or(true);
    let mut db = factory(params.clone(), query_builder)?;

    if let Some(sub) = db.subdriver() {
        let sub_key = DriverKey::subfamily(&params.driver, &sub);
        match registry.driver_factory(&sub_key) {
            Some(sub_factory) => {
                debug!(driver = %sub_key, "re-dispatching to subdriver");
                db = sub_factory(params, query_builder)?;
            }
            None => {
                // Deliberate soft fallback: the family-level instance serves
                warn!(driver = %sub_key, "subdriver not registered, keeping family driver");
            }
        }
    }

    db.initialize().await?;
    Ok(db)
}
