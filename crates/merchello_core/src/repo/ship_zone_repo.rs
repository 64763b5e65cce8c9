//! Ship zone repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Map `ShipZone` to the `ship_zones` table.
//! - Guard the `(catalog_key, name)` uniqueness rule on insert and rename.
//!
//! # Invariants
//! - The uniqueness check and the write run in one immediate transaction.
//! - Deleting a zone detaches its countries instead of deleting them.

use crate::model::entity::{Entity, EntityKey};
use crate::model::ship_zone::ShipZone;
use crate::repo::base::{
    delete_entity, ensure_connection_ready, fetch_by_key, fetch_by_query, fetch_many,
    in_immediate_transaction, insert_entity, update_entity, Repository,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::mapper::{
    uuid_value, value_to_i64, value_to_text, value_to_uuid, ColumnMap, EntityMapper, PropertyMap,
};
use crate::repo::query::Query;
use once_cell::sync::OnceCell;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

const SHIP_ZONE_DELETE_CLAUSES: &[&str] =
    &["UPDATE ship_countries SET ship_zone_key = NULL WHERE ship_zone_key = ?1;"];

static SHIP_ZONE_COLUMNS: &[ColumnMap<ShipZone>] = &[
    ColumnMap {
        property: "key",
        column: "pk",
        read: read_key,
        write: write_key,
    },
    ColumnMap {
        property: "catalog_key",
        column: "catalog_key",
        read: read_catalog_key,
        write: write_catalog_key,
    },
    ColumnMap {
        property: "zone_code",
        column: "zone_code",
        read: read_zone_code,
        write: write_zone_code,
    },
    ColumnMap {
        property: "name",
        column: "name",
        read: read_name,
        write: write_name,
    },
    ColumnMap {
        property: "update_date",
        column: "update_date",
        read: read_update_date,
        write: write_update_date,
    },
    ColumnMap {
        property: "create_date",
        column: "create_date",
        read: read_create_date,
        write: write_create_date,
    },
];

/// Column mapping for `ShipZone`.
pub struct ShipZoneMapper;

impl EntityMapper for ShipZoneMapper {
    type Entity = ShipZone;

    const TABLE: &'static str = "ship_zones";

    fn columns() -> &'static [ColumnMap<ShipZone>] {
        SHIP_ZONE_COLUMNS
    }

    fn blank() -> ShipZone {
        ShipZone::blank()
    }

    fn property_map() -> &'static PropertyMap {
        static CACHE: OnceCell<PropertyMap> = OnceCell::new();
        CACHE.get_or_init(|| PropertyMap::build(Self::TABLE, Self::columns()))
    }
}

fn read_key(zone: &ShipZone) -> RepoResult<Value> {
    Ok(uuid_value(zone.key()))
}

fn write_key(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.base_mut().set_key(value_to_uuid(value, "pk")?);
    Ok(())
}

fn read_catalog_key(zone: &ShipZone) -> RepoResult<Value> {
    Ok(uuid_value(zone.catalog_key()))
}

fn write_catalog_key(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.set_catalog_key(value_to_uuid(value, "catalog_key")?);
    Ok(())
}

fn read_zone_code(zone: &ShipZone) -> RepoResult<Value> {
    Ok(Value::Text(zone.zone_code().to_string()))
}

fn write_zone_code(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.set_zone_code(value_to_text(value, "zone_code")?);
    Ok(())
}

fn read_name(zone: &ShipZone) -> RepoResult<Value> {
    Ok(Value::Text(zone.name().to_string()))
}

fn write_name(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.set_name(value_to_text(value, "name")?);
    Ok(())
}

fn read_update_date(zone: &ShipZone) -> RepoResult<Value> {
    Ok(Value::Integer(zone.update_date()))
}

fn write_update_date(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.base_mut()
        .set_update_date(value_to_i64(value, "update_date")?);
    Ok(())
}

fn read_create_date(zone: &ShipZone) -> RepoResult<Value> {
    Ok(Value::Integer(zone.create_date()))
}

fn write_create_date(zone: &mut ShipZone, value: &Value) -> RepoResult<()> {
    zone.base_mut()
        .set_create_date(value_to_i64(value, "create_date")?);
    Ok(())
}

/// Repository interface for ship zones.
pub trait ShipZoneRepository: Repository<Entity = ShipZone> {
    /// Whether a zone named exactly `name` exists in the catalog.
    fn exists(&self, catalog_key: EntityKey, name: &str) -> RepoResult<bool>;
}

/// SQLite-backed ship zone repository.
pub struct SqliteShipZoneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShipZoneRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["ship_zones", "ship_countries"])?;
        Ok(Self { conn })
    }
}

fn zone_exists(conn: &Connection, catalog_key: EntityKey, name: &str) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM ship_zones WHERE catalog_key = ?1 AND name = ?2
        );",
        params![catalog_key.to_string(), name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn name_taken_by_other_zone(conn: &Connection, zone: &ShipZone) -> RepoResult<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM ship_zones WHERE catalog_key = ?1 AND name = ?2 AND pk <> ?3
        );",
        params![
            zone.catalog_key().to_string(),
            zone.name(),
            zone.key().to_string()
        ],
        |row| row.get(0),
    )?;
    Ok(taken)
}

fn duplicate_name(zone: &ShipZone) -> RepoError {
    RepoError::ConstraintViolation(format!(
        "a ship zone named `{}` already exists in warehouse catalog {}",
        zone.name(),
        zone.catalog_key()
    ))
}

impl ShipZoneRepository for SqliteShipZoneRepository<'_> {
    fn exists(&self, catalog_key: EntityKey, name: &str) -> RepoResult<bool> {
        zone_exists(self.conn, catalog_key, name)
    }
}

impl Repository for SqliteShipZoneRepository<'_> {
    type Entity = ShipZone;

    fn get(&self, key: EntityKey) -> RepoResult<Option<ShipZone>> {
        fetch_by_key::<ShipZoneMapper>(self.conn, key)
    }

    fn get_all(&self, keys: &[EntityKey]) -> RepoResult<Vec<ShipZone>> {
        fetch_many::<ShipZoneMapper>(self.conn, keys)
    }

    fn get_by_query(&self, query: &Query) -> RepoResult<Vec<ShipZone>> {
        fetch_by_query::<ShipZoneMapper>(self.conn, query)
    }

    fn add_or_update(&self, zone: &mut ShipZone) -> RepoResult<()> {
        if !zone.is_new() {
            if !zone.is_property_dirty("name") {
                return update_entity::<ShipZoneMapper>(self.conn, zone);
            }
            return in_immediate_transaction(self.conn, |tx| {
                if name_taken_by_other_zone(tx, zone)? {
                    return Err(duplicate_name(zone));
                }
                update_entity::<ShipZoneMapper>(tx, zone)
            });
        }

        in_immediate_transaction(self.conn, |tx| {
            if zone_exists(tx, zone.catalog_key(), zone.name())? {
                return Err(duplicate_name(zone));
            }
            insert_entity::<ShipZoneMapper>(tx, zone)
        })
    }

    fn delete(&self, zone: &ShipZone) -> RepoResult<bool> {
        delete_entity::<ShipZoneMapper>(self.conn, zone.key(), self.delete_clauses())
    }

    fn delete_clauses(&self) -> &'static [&'static str] {
        SHIP_ZONE_DELETE_CLAUSES
    }
}

#[cfg(test)]
mod tests {
    use super::ShipZoneMapper;
    use crate::model::entity::Entity;
    use crate::model::ship_zone::ShipZone;
    use crate::repo::mapper::{build_entity, build_row, EntityMapper};
    use uuid::Uuid;

    #[test]
    fn build_entity_of_build_row_reproduces_mapped_fields() {
        let mut zone = ShipZone::new(Uuid::new_v4(), "West");
        zone.base_mut().adding_entity(1_700_000_000_000);
        zone.base_mut().updating_entity(1_700_000_000_500);

        let row = build_row::<ShipZoneMapper>(&zone).expect("row builds");
        assert_eq!(row.len(), ShipZoneMapper::columns().len());

        let rebuilt = build_entity::<ShipZoneMapper>(&row).expect("entity builds");
        assert_eq!(rebuilt, zone);
        assert_eq!(rebuilt.zone_code(), zone.zone_code());
        assert_eq!(rebuilt.create_date(), 1_700_000_000_000);
        assert_eq!(rebuilt.update_date(), 1_700_000_000_500);
    }

    #[test]
    fn built_entity_is_clean_and_persisted() {
        let mut zone = ShipZone::new(Uuid::new_v4(), "East");
        zone.base_mut().adding_entity(42);
        let row = build_row::<ShipZoneMapper>(&zone).expect("row builds");

        let rebuilt = build_entity::<ShipZoneMapper>(&row).expect("entity builds");
        assert!(!rebuilt.is_dirty());
        assert!(!rebuilt.is_new());
    }

    #[test]
    fn property_map_is_built_once() {
        let first = ShipZoneMapper::property_map();
        let second = ShipZoneMapper::property_map();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.column_for("key"), Some("pk"));
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn concurrent_first_calls_share_one_cache() {
        let pointers = std::thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| {
                    scope.spawn(|| ShipZoneMapper::property_map() as *const _ as usize)
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread finishes"))
                .collect::<Vec<_>>()
        });
        assert!(pointers.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
