//! Ship zone domain model.
//!
//! # Responsibility
//! - Group ship countries of one warehouse catalog under a named zone.
//!
//! # Invariants
//! - `catalog_key` is never nil and does not change after creation.
//! - `(catalog_key, name)` is unique among stored zones.
//! - `zone_code` defaults to a freshly generated unique token.

use crate::model::entity::{Entity, EntityBase, EntityKey};
use crate::model::validation::ValidationError;
use uuid::Uuid;

/// Named grouping of ship countries under one warehouse catalog.
#[derive(Debug, Clone)]
pub struct ShipZone {
    base: EntityBase,
    catalog_key: EntityKey,
    name: String,
    zone_code: String,
}

impl ShipZone {
    /// Creates a new, not yet persisted zone with a generated zone code.
    pub fn new(catalog_key: EntityKey, name: impl Into<String>) -> Self {
        Self {
            base: EntityBase::new(),
            catalog_key,
            name: name.into(),
            zone_code: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a new zone whose key is chosen by the caller.
    ///
    /// The zone stays new until the first insert; the insert keeps this key.
    pub fn with_key(key: EntityKey, catalog_key: EntityKey, name: impl Into<String>) -> Self {
        Self {
            base: EntityBase::with_key(key),
            ..Self::new(catalog_key, name)
        }
    }

    pub(crate) fn blank() -> Self {
        Self {
            base: EntityBase::new(),
            catalog_key: Uuid::nil(),
            name: String::new(),
            zone_code: String::new(),
        }
    }

    pub fn catalog_key(&self) -> EntityKey {
        self.catalog_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_code(&self) -> &str {
        &self.zone_code
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

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base
            .tracker_mut()
            .set_property_value(&mut self.name, name.into(), "name");
    }

    pub fn set_zone_code(&mut self, zone_code: impl Into<String>) {
        self.base
            .tracker_mut()
            .set_property_value(&mut self.zone_code, zone_code.into(), "zone_code");
    }
}

impl Entity for ShipZone {
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
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if self.zone_code.trim().is_empty() {
            return Err(ValidationError::BlankZoneCode);
        }
        Ok(())
    }
}

/// Equality over mapped fields only; change state is ignored.
impl PartialEq for ShipZone {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
            && self.catalog_key == other.catalog_key
            && self.name == other.name
            && self.zone_code == other.zone_code
            && self.create_date() == other.create_date()
            && self.update_date() == other.update_date()
    }
}

impl Eq for ShipZone {}

#[cfg(test)]
mod tests {
    use super::ShipZone;
    use crate::model::entity::Entity;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn new_zone_is_new_and_clean_with_generated_code() {
        let zone = ShipZone::new(Uuid::new_v4(), "West");
        assert!(zone.is_new());
        assert!(!zone.is_dirty());
        assert!(zone.key().is_nil());
        assert!(Uuid::parse_str(zone.zone_code()).is_ok());
    }

    #[test]
    fn zone_codes_are_unique_per_instance() {
        let catalog = Uuid::new_v4();
        let first = ShipZone::new(catalog, "West");
        let second = ShipZone::new(catalog, "West");
        assert_ne!(first.zone_code(), second.zone_code());
    }

    #[test]
    fn setters_track_only_real_changes() {
        let mut zone = ShipZone::new(Uuid::new_v4(), "West");
        zone.set_name("West");
        assert!(!zone.is_dirty());

        zone.set_name("West Coast");
        assert!(zone.is_property_dirty("name"));
        assert!(!zone.is_property_dirty("zone_code"));

        zone.reset_dirty_properties();
        assert!(!zone.is_dirty());
    }

    #[test]
    fn renaming_back_to_original_name_is_clean() {
        let mut zone = ShipZone::new(Uuid::new_v4(), "West");
        zone.set_name("East");
        zone.set_name("Mid");
        assert_eq!(zone.dirty_properties(), vec!["name"]);

        zone.set_name("West");
        assert!(!zone.is_dirty(), "dirty after revert: {:?}", zone.dirty_properties());

        let cloned = {
            let mut moved = zone.clone();
            moved.set_name("North");
            moved
        };
        let mut reverted = cloned.clone();
        reverted.set_name("West");
        assert!(!reverted.is_dirty());
    }

    #[test]
    fn validate_rejects_nil_catalog_and_blank_name() {
        let zone = ShipZone::new(Uuid::nil(), "West");
        assert_eq!(zone.validate(), Err(ValidationError::EmptyCatalogKey));

        let zone = ShipZone::new(Uuid::new_v4(), "   ");
        assert_eq!(zone.validate(), Err(ValidationError::BlankName));
    }
}
