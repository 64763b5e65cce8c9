//! Use-case services for shipping entities.
//!
//! # Responsibility
//! - Serialize writes per entity type and surround them with interceptors.
//! - Report expected failures as `Attempt` values instead of errors.

pub mod attempt;
pub mod base;
pub mod events;
pub mod lock;
pub mod ship_country_service;
pub mod ship_zone_service;
