//! Shipping domain model.
//!
//! # Responsibility
//! - Define persisted shipping entities and their change tracking.
//! - Keep domain invariants next to the data they guard.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityKey`.
//! - All settable fields are written through the `ChangeTracker` funnel.

pub mod entity;
pub mod ship_country;
pub mod ship_zone;
pub mod validation;
