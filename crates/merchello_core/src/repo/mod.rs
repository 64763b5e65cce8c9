//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Entity::validate()` before persistence.
//! - Reads return `None`/empty results for missing rows, never errors.

pub mod base;
pub mod error;
pub mod mapper;
pub mod query;
pub mod ship_country_repo;
pub mod ship_zone_repo;
