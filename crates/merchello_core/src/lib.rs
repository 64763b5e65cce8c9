//! Shipping-zone core for Merchello warehouse catalogs.
//! Owns the entity model, SQLite persistence and write-serialized services.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{Database, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Entity, EntityKey};
pub use model::ship_country::{Province, ShipCountry, ELSEWHERE_COUNTRY_CODE};
pub use model::ship_zone::ShipZone;
pub use model::validation::ValidationError;
pub use repo::base::Repository;
pub use repo::error::{RepoError, RepoResult};
pub use repo::query::Query;
pub use repo::ship_country_repo::{ShipCountryRepository, SqliteShipCountryRepository};
pub use repo::ship_zone_repo::{ShipZoneRepository, SqliteShipZoneRepository};
pub use service::attempt::{Attempt, AttemptFailure};
pub use service::events::{EventDecision, Interceptors, ServiceEvent, ServiceInterceptor};
pub use service::lock::WriteLock;
pub use service::ship_country_service::ShipCountryService;
pub use service::ship_zone_service::ShipZoneService;

/// Minimal health-check API for embedding hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
