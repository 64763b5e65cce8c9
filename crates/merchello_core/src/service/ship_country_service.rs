//! Ship country use-case service.
//!
//! # Responsibility
//! - Enable destination countries for a warehouse catalog and assign them
//!   to ship zones.
//!
//! # Invariants
//! - A catalog ships to each country code at most once.
//! - A zone assignment must reference a stored zone of the same catalog.

use crate::db::Database;
use crate::model::entity::EntityKey;
use crate::model::ship_country::{is_valid_country_code, Province, ShipCountry};
use crate::model::validation::ValidationError;
use crate::repo::base::Repository;
use crate::repo::error::RepoResult;
use crate::repo::query::Query;
use crate::repo::ship_country_repo::SqliteShipCountryRepository;
use crate::repo::ship_zone_repo::SqliteShipZoneRepository;
use crate::service::attempt::{Attempt, AttemptFailure};
use crate::service::base::ServiceCore;
use crate::service::events::{Interceptors, ServiceEvent};
use crate::service::lock::WriteLock;
use log::warn;

pub struct ShipCountryService {
    core: ServiceCore<ShipCountry>,
}

impl ShipCountryService {
    pub fn new(db: Database) -> Self {
        Self::with_parts(db, WriteLock::new(), Interceptors::new())
    }

    pub fn with_parts(
        db: Database,
        write_lock: WriteLock,
        interceptors: Interceptors<ShipCountry>,
    ) -> Self {
        Self {
            core: ServiceCore::new("ship_country", db, write_lock, interceptors),
        }
    }

    pub fn write_lock(&self) -> &WriteLock {
        self.core.write_lock()
    }

    /// Creates and stores a ship country.
    ///
    /// # Contract
    /// - `Failed(Validation)` for a nil catalog key, a malformed country
    ///   code, or a zone outside the catalog.
    /// - `Failed(Constraint)` when the catalog already ships to the code.
    pub fn create_with_key(
        &self,
        catalog_key: EntityKey,
        zone_key: Option<EntityKey>,
        country_code: &str,
        provinces: Vec<Province>,
        raise_events: bool,
    ) -> RepoResult<Attempt<ShipCountry>> {
        if catalog_key.is_nil() {
            return Ok(Attempt::Failed(ValidationError::EmptyCatalogKey.into()));
        }
        if !is_valid_country_code(country_code) {
            return Ok(Attempt::Failed(
                ValidationError::InvalidCountryCode(country_code.to_string()).into(),
            ));
        }
        if let Some(zone_key) = zone_key {
            if let Some(failure) = self.check_zone(catalog_key, zone_key)? {
                return Ok(Attempt::Failed(failure));
            }
        }

        let mut country = ShipCountry::new(catalog_key, country_code, provinces);
        country.set_zone_key(zone_key);
        if self
            .core
            .intercept(ServiceEvent::Create, &mut country, raise_events)
        {
            return Ok(Attempt::Cancelled(country));
        }

        let duplicate = self
            .get_by_catalog_key(catalog_key)?
            .iter()
            .any(|existing| existing.country_code() == country.country_code());
        if duplicate {
            warn!(
                "event=ship_country_create module=service status=rejected error_code=duplicate_country"
            );
            return Ok(Attempt::Failed(AttemptFailure::Constraint(format!(
                "country `{country_code}` is already associated with warehouse catalog {catalog_key}"
            ))));
        }

        let attempt = self.core.commit(
            ServiceEvent::Create,
            &mut country,
            raise_events,
            |conn, country| SqliteShipCountryRepository::try_new(conn)?.add_or_update(country),
        )?;
        Ok(attempt.map(|()| country))
    }

    /// Inserts or updates a country. A changed zone assignment is checked
    /// against the catalog first.
    pub fn save(&self, country: &mut ShipCountry, raise_events: bool) -> RepoResult<Attempt<()>> {
        if let Some(zone_key) = country.zone_key() {
            if let Some(failure) = self.check_zone(country.catalog_key(), zone_key)? {
                return Ok(Attempt::Failed(failure));
            }
        }
        self.core
            .write(ServiceEvent::Save, country, raise_events, |conn, country| {
                SqliteShipCountryRepository::try_new(conn)?.add_or_update(country)
            })
    }

    pub fn delete(&self, country: &mut ShipCountry, raise_events: bool) -> RepoResult<Attempt<()>> {
        self.core
            .write(ServiceEvent::Delete, country, raise_events, |conn, country| {
                SqliteShipCountryRepository::try_new(conn)?.delete(country)?;
                Ok(())
            })
    }

    pub fn get_by_key(&self, key: EntityKey) -> RepoResult<Option<ShipCountry>> {
        self.core
            .read(|conn| SqliteShipCountryRepository::try_new(conn)?.get(key))
    }

    pub fn get_by_catalog_key(&self, catalog_key: EntityKey) -> RepoResult<Vec<ShipCountry>> {
        let query = Query::new().where_key_eq("catalog_key", catalog_key);
        self.core
            .read(|conn| SqliteShipCountryRepository::try_new(conn)?.get_by_query(&query))
    }

    /// Countries assigned to one ship zone.
    pub fn get_by_zone_key(&self, zone_key: EntityKey) -> RepoResult<Vec<ShipCountry>> {
        let query = Query::new().where_optional_key_eq("zone_key", Some(zone_key));
        self.core
            .read(|conn| SqliteShipCountryRepository::try_new(conn)?.get_by_query(&query))
    }

    /// The catalog's country with `country_code`, if enabled.
    pub fn get_by_country_code(
        &self,
        catalog_key: EntityKey,
        country_code: &str,
    ) -> RepoResult<Option<ShipCountry>> {
        let query = Query::new()
            .where_key_eq("catalog_key", catalog_key)
            .where_text_eq("country_code", country_code);
        let found = self
            .core
            .read(|conn| SqliteShipCountryRepository::try_new(conn)?.get_by_query(&query))?;
        Ok(found.into_iter().next())
    }

    fn check_zone(
        &self,
        catalog_key: EntityKey,
        zone_key: EntityKey,
    ) -> RepoResult<Option<AttemptFailure>> {
        let zone = self
            .core
            .read(|conn| SqliteShipZoneRepository::try_new(conn)?.get(zone_key))?;
        match zone {
            Some(zone) if zone.catalog_key() == catalog_key => Ok(None),
            _ => Ok(Some(AttemptFailure::Validation(
                ValidationError::ZoneCatalogMismatch {
                    zone_key,
                    catalog_key,
                },
            ))),
        }
    }
}
