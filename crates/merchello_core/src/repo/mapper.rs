//! Declarative entity/column mapping and row factories.
//!
//! # Responsibility
//! - Declare, per entity type, which property maps to which storage column.
//! - Build flat storage rows from entities and entities from rows.
//! - Cache the property → column lookup once per entity type.
//!
//! # Invariants
//! - The column table is static; nothing is discovered at runtime.
//! - `build_entity` always returns a clean entity with identity.
//! - `build_row` projects every mapped column, generated ones included.

use crate::model::entity::{Entity, EntityKey};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// One (getter, setter, column) triple of an entity mapping.
pub struct ColumnMap<E> {
    pub property: &'static str,
    pub column: &'static str,
    pub read: fn(&E) -> RepoResult<Value>,
    pub write: fn(&mut E, &Value) -> RepoResult<()>,
}

/// Property name → column name lookup for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMap {
    table: &'static str,
    columns: HashMap<&'static str, &'static str>,
}

impl PropertyMap {
    pub fn build<E>(table: &'static str, columns: &[ColumnMap<E>]) -> Self {
        Self {
            table,
            columns: columns
                .iter()
                .map(|mapping| (mapping.property, mapping.column))
                .collect(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn column_for(&self, property: &str) -> Option<&'static str> {
        self.columns.get(property).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Static mapping contract between one entity type and its table.
///
/// Implementations cache `property_map()` in a `OnceCell` static so the
/// lookup is built once per process. Concurrent first calls may race to
/// build; only one result is kept and all builds are identical.
pub trait EntityMapper {
    type Entity: Entity + 'static;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str = "pk";

    fn columns() -> &'static [ColumnMap<Self::Entity>];

    /// Empty entity the column setters are applied to.
    fn blank() -> Self::Entity;

    fn property_map() -> &'static PropertyMap;
}

/// Ordered (column, value) cells of one storage row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StorageRow {
    cells: Vec<(&'static str, Value)>,
}

impl StorageRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &'static str, value: Value) {
        self.cells.push((column, value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(column, _)| *column)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.cells.into_iter().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Projects every mapped field of `entity` into a storage row.
pub fn build_row<M: EntityMapper>(entity: &M::Entity) -> RepoResult<StorageRow> {
    let mut row = StorageRow::new();
    for mapping in M::columns() {
        row.push(mapping.column, (mapping.read)(entity)?);
    }
    Ok(row)
}

/// Builds a loaded entity from a storage row and clears its dirty state.
pub fn build_entity<M: EntityMapper>(row: &StorageRow) -> RepoResult<M::Entity> {
    let mut entity = M::blank();
    for mapping in M::columns() {
        let value = row.get(mapping.column).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "missing column `{}` for `{}`",
                mapping.column,
                M::TABLE
            ))
        })?;
        (mapping.write)(&mut entity, value)?;
    }
    entity.base_mut().mark_persisted();
    entity.reset_dirty_properties();
    Ok(entity)
}

/// Reads the mapped columns of a SQL result row.
pub fn read_storage_row<M: EntityMapper>(row: &Row<'_>) -> RepoResult<StorageRow> {
    let mut storage_row = StorageRow::new();
    for mapping in M::columns() {
        storage_row.push(mapping.column, row.get::<_, Value>(mapping.column)?);
    }
    Ok(storage_row)
}

pub fn uuid_value(key: EntityKey) -> Value {
    Value::Text(key.to_string())
}

pub fn optional_uuid_value(key: Option<EntityKey>) -> Value {
    key.map_or(Value::Null, uuid_value)
}

pub fn json_value<T: Serialize>(value: &T, column: &str) -> RepoResult<Value> {
    serde_json::to_string(value)
        .map(Value::Text)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode `{column}`: {err}")))
}

pub fn value_to_text(value: &Value, column: &str) -> RepoResult<String> {
    match value {
        Value::Text(text) => Ok(text.clone()),
        other => Err(unexpected_type(column, "text", other)),
    }
}

pub fn value_to_i64(value: &Value, column: &str) -> RepoResult<i64> {
    match value {
        Value::Integer(number) => Ok(*number),
        other => Err(unexpected_type(column, "integer", other)),
    }
}

pub fn value_to_uuid(value: &Value, column: &str) -> RepoResult<EntityKey> {
    let text = value_to_text(value, column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in `{column}`")))
}

pub fn value_to_optional_uuid(value: &Value, column: &str) -> RepoResult<Option<EntityKey>> {
    match value {
        Value::Null => Ok(None),
        other => value_to_uuid(other, column).map(Some),
    }
}

pub fn value_to_json<T: DeserializeOwned>(value: &Value, column: &str) -> RepoResult<T> {
    let text = value_to_text(value, column)?;
    serde_json::from_str(&text)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in `{column}`: {err}")))
}

fn unexpected_type(column: &str, expected: &str, actual: &Value) -> RepoError {
    RepoError::InvalidData(format!(
        "expected {expected} in `{column}`, found {:?}",
        actual.data_type()
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        optional_uuid_value, value_to_i64, value_to_optional_uuid, value_to_uuid, ColumnMap,
        PropertyMap, StorageRow,
    };
    use crate::repo::error::RepoError;
    use rusqlite::types::Value;
    use uuid::Uuid;

    #[test]
    fn storage_row_lookup_by_column() {
        let mut row = StorageRow::new();
        assert!(row.is_empty());
        row.push("pk", Value::Text("a".to_string()));
        row.push("name", Value::Text("West".to_string()));

        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
        assert_eq!(row.get("name"), Some(&Value::Text("West".to_string())));
        assert!(row.get("missing").is_none());
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["pk", "name"]);
    }

    #[test]
    fn property_map_without_columns_is_empty() {
        let columns: &[ColumnMap<()>] = &[];
        let map = PropertyMap::build("ship_zones", columns);
        assert!(map.is_empty());
        assert_eq!(map.table(), "ship_zones");
        assert_eq!(map.column_for("name"), None);
    }

    #[test]
    fn optional_uuid_roundtrips_null() {
        assert_eq!(
            value_to_optional_uuid(&optional_uuid_value(None), "zone").expect("null decodes"),
            None
        );
        let key = Uuid::new_v4();
        assert_eq!(
            value_to_optional_uuid(&optional_uuid_value(Some(key)), "zone")
                .expect("text decodes"),
            Some(key)
        );
    }

    #[test]
    fn malformed_values_are_invalid_data() {
        let err = value_to_uuid(&Value::Text("nope".to_string()), "pk")
            .expect_err("bad uuid must fail");
        assert!(matches!(err, RepoError::InvalidData(_)));

        let err = value_to_i64(&Value::Text("1".to_string()), "create_date")
            .expect_err("text is not integer");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
