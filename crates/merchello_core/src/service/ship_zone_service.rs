//! Ship zone use-case service.
//!
//! # Responsibility
//! - Create, save and delete zones under the ship-zone write lock.
//! - Provide catalog-oriented read queries.
//!
//! # Invariants
//! - Empty catalog keys and blank names are rejected before any I/O.
//! - A duplicate `(catalog_key, name)` is reported as
//!   `AttemptFailure::Constraint`, both from the early check and from the
//!   repository's atomic insert check.
//! - Deleting a zone that was never stored is a successful no-op.

use crate::db::Database;
use crate::model::entity::{Entity, EntityKey};
use crate::model::ship_zone::ShipZone;
use crate::model::validation::ValidationError;
use crate::repo::base::Repository;
use crate::repo::error::RepoResult;
use crate::repo::query::Query;
use crate::repo::ship_zone_repo::SqliteShipZoneRepository;
use crate::service::attempt::{Attempt, AttemptFailure};
use crate::service::base::ServiceCore;
use crate::service::events::{Interceptors, ServiceEvent};
use crate::service::lock::WriteLock;
use log::{debug, warn};

/// Service facade for ship zones.
pub struct ShipZoneService {
    core: ServiceCore<ShipZone>,
}

impl ShipZoneService {
    /// Service with its own write lock and no interceptors.
    pub fn new(db: Database) -> Self {
        Self::with_parts(db, WriteLock::new(), Interceptors::new())
    }

    /// Service sharing `write_lock` with other ship-zone services.
    pub fn with_parts(
        db: Database,
        write_lock: WriteLock,
        interceptors: Interceptors<ShipZone>,
    ) -> Self {
        Self {
            core: ServiceCore::new("ship_zone", db, write_lock, interceptors),
        }
    }

    pub fn write_lock(&self) -> &WriteLock {
        self.core.write_lock()
    }

    /// Creates and stores a zone for a warehouse catalog.
    ///
    /// # Contract
    /// - `Failed(Validation)` for a nil catalog key or blank name.
    /// - `Cancelled(zone)` when a create interceptor vetoed; `zone.was_cancelled()` is set.
    /// - `Failed(Constraint)` when the catalog already has a zone with this exact name.
    /// - `Err` only for storage faults.
    pub fn create_with_key(
        &self,
        catalog_key: EntityKey,
        name: &str,
        raise_events: bool,
    ) -> RepoResult<Attempt<ShipZone>> {
        if catalog_key.is_nil() {
            return Ok(Attempt::Failed(ValidationError::EmptyCatalogKey.into()));
        }
        if name.trim().is_empty() {
            return Ok(Attempt::Failed(ValidationError::BlankName.into()));
        }

        let mut zone = ShipZone::new(catalog_key, name);
        if self.core.intercept(ServiceEvent::Create, &mut zone, raise_events) {
            return Ok(Attempt::Cancelled(zone));
        }

        let duplicate = self
            .get_by_catalog_key(catalog_key)?
            .iter()
            .any(|existing| existing.name() == zone.name());
        if duplicate {
            warn!(
                "event=ship_zone_create module=service status=rejected error_code=duplicate_name"
            );
            return Ok(Attempt::Failed(AttemptFailure::Constraint(format!(
                "a ship zone named `{}` is already associated with warehouse catalog {catalog_key}",
                zone.name()
            ))));
        }

        let attempt = self.core.commit(
            ServiceEvent::Create,
            &mut zone,
            raise_events,
            |conn, zone| SqliteShipZoneRepository::try_new(conn)?.add_or_update(zone),
        )?;
        Ok(attempt.map(|()| zone))
    }

    /// Inserts a new zone or updates a stored one.
    pub fn save(&self, zone: &mut ShipZone, raise_events: bool) -> RepoResult<Attempt<()>> {
        self.core
            .write(ServiceEvent::Save, zone, raise_events, |conn, zone| {
                SqliteShipZoneRepository::try_new(conn)?.add_or_update(zone)
            })
    }

    /// Deletes a zone and detaches its ship countries.
    pub fn delete(&self, zone: &mut ShipZone, raise_events: bool) -> RepoResult<Attempt<()>> {
        self.core
            .write(ServiceEvent::Delete, zone, raise_events, |conn, zone| {
                let removed = SqliteShipZoneRepository::try_new(conn)?.delete(zone)?;
                if !removed {
                    debug!(
                        "event=ship_zone_delete module=service status=noop key={}",
                        zone.key()
                    );
                }
                Ok(())
            })
    }

    pub fn get_by_key(&self, key: EntityKey) -> RepoResult<Option<ShipZone>> {
        self.core
            .read(|conn| SqliteShipZoneRepository::try_new(conn)?.get(key))
    }

    /// All zones owned by one warehouse catalog.
    pub fn get_by_catalog_key(&self, catalog_key: EntityKey) -> RepoResult<Vec<ShipZone>> {
        let query = Query::new().where_key_eq("catalog_key", catalog_key);
        self.core
            .read(|conn| SqliteShipZoneRepository::try_new(conn)?.get_by_query(&query))
    }

    /// Zone of the catalog whose name equals `name` exactly.
    pub fn get_by_name(&self, catalog_key: EntityKey, name: &str) -> RepoResult<Option<ShipZone>> {
        Ok(self
            .get_by_catalog_key(catalog_key)?
            .into_iter()
            .find(|zone| zone.name() == name))
    }

    /// Every stored zone. Order is unspecified.
    pub fn get_all(&self) -> RepoResult<Vec<ShipZone>> {
        self.core
            .read(|conn| SqliteShipZoneRepository::try_new(conn)?.get_all(&[]))
    }
}
