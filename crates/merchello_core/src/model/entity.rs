//! Entity base state and property change tracking.
//!
//! # Responsibility
//! - Hold identity and audit timestamps shared by every persisted entity.
//! - Record which properties changed since load or last persist.
//!
//! # Invariants
//! - A property is dirty iff its current value differs from the value held
//!   at the last reset.
//! - Assigning an equal value never marks a property dirty.
//! - `reset_dirty_properties` always leaves zero dirty properties.

use crate::model::validation::ValidationError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every persisted entity.
pub type EntityKey = Uuid;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

trait OriginalValue: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn OriginalValue>;
}

/// Value a property held at the last reset.
#[derive(Clone)]
struct Snapshot<T>(T);

impl<T> OriginalValue for Snapshot<T>
where
    T: Any + Clone + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn OriginalValue> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn OriginalValue> {
    fn clone(&self) -> Self {
        self.as_ref().clone_boxed()
    }
}

/// Change-set of modified property names.
///
/// For every dirty property the tracker keeps the value it had at the last
/// reset, so assigning that value back clears the flag again.
#[derive(Clone, Default)]
pub struct ChangeTracker {
    dirty: BTreeMap<&'static str, Box<dyn OriginalValue>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single mutation funnel for tracked properties.
    ///
    /// Returns `true` when the stored value changed.
    pub fn set_property_value<T>(&mut self, field: &mut T, value: T, property: &'static str) -> bool
    where
        T: PartialEq + Clone + Send + Sync + 'static,
    {
        if *field == value {
            return false;
        }

        let previous = std::mem::replace(field, value);
        if !self.dirty.contains_key(property) {
            self.dirty.insert(property, Box::new(Snapshot(previous)));
            return true;
        }

        let reverted = self
            .dirty
            .get(property)
            .and_then(|original| original.as_ref().as_any().downcast_ref::<Snapshot<T>>())
            .is_some_and(|original| original.0 == *field);
        if reverted {
            self.dirty.remove(property);
        }
        true
    }

    /// Whether any property differs from its value at the last reset.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_property_dirty(&self, property: &str) -> bool {
        self.dirty.contains_key(property)
    }

    /// Dirty property names in lexical order.
    pub fn dirty_properties(&self) -> Vec<&'static str> {
        self.dirty.keys().copied().collect()
    }

    /// Forgets all recorded changes. Called once after a successful persist.
    pub fn reset_dirty_properties(&mut self) {
        self.dirty.clear();
    }
}

impl Debug for ChangeTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("dirty", &self.dirty_properties())
            .finish()
    }
}

/// Identity, audit timestamps and change state shared by all entities.
#[derive(Debug, Clone, Default)]
pub struct EntityBase {
    key: EntityKey,
    create_date: i64,
    update_date: i64,
    has_identity: bool,
    was_cancelled: bool,
    tracker: ChangeTracker,
}

impl EntityBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base with a caller-provided key. The entity is still new until persisted.
    pub fn with_key(key: EntityKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn create_date(&self) -> i64 {
        self.create_date
    }

    pub fn update_date(&self) -> i64 {
        self.update_date
    }

    pub fn has_identity(&self) -> bool {
        self.has_identity
    }

    pub fn was_cancelled(&self) -> bool {
        self.was_cancelled
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    pub(crate) fn set_key(&mut self, key: EntityKey) {
        self.tracker.set_property_value(&mut self.key, key, "key");
    }

    pub(crate) fn set_create_date(&mut self, value: i64) {
        self.tracker
            .set_property_value(&mut self.create_date, value, "create_date");
    }

    pub(crate) fn set_update_date(&mut self, value: i64) {
        self.tracker
            .set_property_value(&mut self.update_date, value, "update_date");
    }

    pub(crate) fn set_was_cancelled(&mut self, value: bool) {
        self.was_cancelled = value;
    }

    /// Fills generated fields before the first insert.
    pub(crate) fn adding_entity(&mut self, now: i64) {
        if self.key.is_nil() {
            self.set_key(Uuid::new_v4());
        }
        self.set_create_date(now);
        self.set_update_date(now);
    }

    pub(crate) fn updating_entity(&mut self, now: i64) {
        self.set_update_date(now);
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.has_identity = true;
    }
}

/// Common behavior of persisted domain objects.
pub trait Entity {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    /// Checks domain invariants that must hold before any write.
    fn validate(&self) -> Result<(), ValidationError>;

    fn key(&self) -> EntityKey {
        self.base().key()
    }

    fn has_identity(&self) -> bool {
        self.base().has_identity()
    }

    /// `true` until the entity has been persisted or loaded from storage.
    fn is_new(&self) -> bool {
        !self.has_identity()
    }

    fn is_dirty(&self) -> bool {
        self.base().tracker().is_dirty()
    }

    fn is_property_dirty(&self, property: &str) -> bool {
        self.base().tracker().is_property_dirty(property)
    }

    fn dirty_properties(&self) -> Vec<&'static str> {
        self.base().tracker().dirty_properties()
    }

    /// Set when a before-event interceptor vetoed the last write.
    fn was_cancelled(&self) -> bool {
        self.base().was_cancelled()
    }

    fn reset_dirty_properties(&mut self) {
        self.base_mut().tracker_mut().reset_dirty_properties();
    }
}
