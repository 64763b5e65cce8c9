//! Domain validation errors shared by shipping entities.

use crate::model::entity::EntityKey;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected domain input. Raised before any storage I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Owning warehouse catalog key is nil.
    EmptyCatalogKey,
    /// Zone name is empty after trim.
    BlankName,
    /// Zone code is empty after trim.
    BlankZoneCode,
    /// Country code is not two upper-case letters or `ELSE`.
    InvalidCountryCode(String),
    /// Target zone is missing or owned by another catalog.
    ZoneCatalogMismatch {
        zone_key: EntityKey,
        catalog_key: EntityKey,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalogKey => write!(f, "catalog key must not be empty"),
            Self::BlankName => write!(f, "zone name must not be blank"),
            Self::BlankZoneCode => write!(f, "zone code must not be blank"),
            Self::InvalidCountryCode(code) => write!(f, "invalid country code `{code}`"),
            Self::ZoneCatalogMismatch {
                zone_key,
                catalog_key,
            } => write!(
                f,
                "ship zone {zone_key} does not exist in warehouse catalog {catalog_key}"
            ),
        }
    }
}

impl Error for ValidationError {}
