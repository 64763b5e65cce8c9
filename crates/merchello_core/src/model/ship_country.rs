//! Ship country domain model.
//!
//! # Invariants
//! - `catalog_key` is never nil.
//! - `(catalog_key, country_code)` is unique among stored countries.
//! - `zone_key`, when set, references a zone of the same catalog.

use crate::model::entity::{Entity, EntityBase, EntityKey};
use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Country code that matches every destination not listed explicitly.
pub const ELSEWHERE_COUNTRY_CODE: &str = "ELSE";

static COUNTRY_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Z]{2}|ELSE)$").expect("valid country code regex"));

/// Province or state inside a ship country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub code: String,
    pub name: String,
}

impl Province {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Destination country enabled for shipping in one warehouse catalog.
#[derive(Debug, Clone)]
pub struct ShipCountry {
    base: EntityBase,
    catalog_key: EntityKey,
    zone_key: Option<EntityKey>,
    country_code: String,
    provinces: Vec<Province>,
}

impl ShipCountry {
    pub fn new(
        catalog_key: EntityKey,
        country_code: impl Into<String>,
        provinces: Vec<Province>,
    ) -> Self {
        Self {
            base: EntityBase::new(),
            catalog_key,
            zone_key: None,
            country_code: country_code.into(),
            provinces,
        }
    }

    /// Creates a country already assigned to a ship zone.
    pub fn in_zone(
        catalog_key: EntityKey,
        zone_key: EntityKey,
        country_code: impl Into<String>,
        provinces: Vec<Province>,
    ) -> Self {
        Self {
            zone_key: Some(zone_key),
            ..Self::new(catalog_key, country_code, provinces)
        }
    }

    pub(crate) fn blank() -> Self {
        Self::new(Uuid::nil(), String::new(), Vec::new())
    }

    pub fn catalog_key(&self) -> EntityKey {
        self.catalog_key
    }

    pub fn zone_key(&self) -> Option<EntityKey> {
        self.zone_key
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn has_provinces(&self) -> bool {
        !self.provinces.is_empty()
    }

    pub fn create_date(&self) -> i64 {
        self.base.create_date()
    }

    pub fn update_date(&self) -> i64 {
        self.base.update_date()
    }

    pub(crate) fn set_catalog_key(&mut self, catalog_key: EntityKey) {
        self.base
            .tracker_mut()
            .set_property_value(&mut self.catalog_key, catalog_key, "catalog_key");
    }

    /// Moves the country into another zone, or out of any zone with `None`.
    pub fn set_zone_key(&mut self, zone_key: Option<EntityKey>) {
        self.base
            .tracker_mut()
            .set_property_value(&mut self.zone_key, zone_key, "zone_key");
    }

    pub(crate) fn set_country_code(&mut self, country_code: impl Into<String>) {
        self.base.tracker_mut().set_property_value(
            &mut self.country_code,
            country_code.into(),
            "country_code",
        );
    }

    pub fn set_provinces(&mut self, provinces: Vec<Province>) {
        self.base
            .tracker_mut()
            .set_property_value(&mut self.provinces, provinces, "provinces");
    }
}

/// Whether `code` is a two-letter upper-case code or the `ELSE` wildcard.
pub fn is_valid_country_code(code: &str) -> bool {
    COUNTRY_CODE_RE.is_match(code)
}

impl Entity for ShipCountry {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.catalog_key.is_nil() {
            return Err(ValidationError::EmptyCatalogKey);
        }
        if !is_valid_country_code(&self.country_code) {
            return Err(ValidationError::InvalidCountryCode(
                self.country_code.clone(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for ShipCountry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
            && self.catalog_key == other.catalog_key
            && self.zone_key == other.zone_key
            && self.country_code == other.country_code
            && self.provinces == other.provinces
            && self.create_date() == other.create_date()
            && self.update_date() == other.update_date()
    }
}

impl Eq for ShipCountry {}
