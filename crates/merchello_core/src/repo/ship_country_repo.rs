//! Ship country repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(catalog_key, country_code)` is checked and inserted atomically.
//! - Provinces are stored as a JSON array in `ship_countries.provinces`.

use crate::model::entity::{Entity, EntityKey};
use crate::model::ship_country::{Province, ShipCountry};
use crate::repo::base::{
    delete_entity, ensure_connection_ready, fetch_by_key, fetch_by_query, fetch_many,
    in_immediate_transaction, insert_entity, update_entity, Repository,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::mapper::{
    json_value, optional_uuid_value, uuid_value, value_to_i64, value_to_json,
    value_to_optional_uuid, value_to_text, value_to_uuid, ColumnMap, EntityMapper, PropertyMap,
};
use crate::repo::query::Query;
use once_cell::sync::OnceCell;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

static SHIP_COUNTRY_COLUMNS: &[ColumnMap<ShipCountry>] = &[
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
        property: "zone_key",
        column: "ship_zone_key",
        read: read_zone_key,
        write: write_zone_key,
    },
    ColumnMap {
        property: "country_code",
        column: "country_code",
        read: read_country_code,
        write: write_country_code,
    },
    ColumnMap {
        property: "provinces",
        column: "provinces",
        read: read_provinces,
        write: write_provinces,
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

/// Column mapping for `ShipCountry`.
pub struct ShipCountryMapper;

impl EntityMapper for ShipCountryMapper {
    type Entity = ShipCountry;

    const TABLE: &'static str = "ship_countries";

    fn columns() -> &'static [ColumnMap<ShipCountry>] {
        SHIP_COUNTRY_COLUMNS
    }

    fn blank() -> ShipCountry {
        ShipCountry::blank()
    }

    fn property_map() -> &'static PropertyMap {
        static CACHE: OnceCell<PropertyMap> = OnceCell::new();
        CACHE.get_or_init(|| PropertyMap::build(Self::TABLE, Self::columns()))
    }
}

fn read_key(country: &ShipCountry) -> RepoResult<Value> {
    Ok(uuid_value(country.key()))
}

fn write_key(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country.base_mut().set_key(value_to_uuid(value, "pk")?);
    Ok(())
}

fn read_catalog_key(country: &ShipCountry) -> RepoResult<Value> {
    Ok(uuid_value(country.catalog_key()))
}

fn write_catalog_key(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country.set_catalog_key(value_to_uuid(value, "catalog_key")?);
    Ok(())
}

fn read_zone_key(country: &ShipCountry) -> RepoResult<Value> {
    Ok(optional_uuid_value(country.zone_key()))
}

fn write_zone_key(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country.set_zone_key(value_to_optional_uuid(value, "ship_zone_key")?);
    Ok(())
}

fn read_country_code(country: &ShipCountry) -> RepoResult<Value> {
    Ok(Value::Text(country.country_code().to_string()))
}

fn write_country_code(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country.set_country_code(value_to_text(value, "country_code")?);
    Ok(())
}

fn read_provinces(country: &ShipCountry) -> RepoResult<Value> {
    json_value(&country.provinces(), "provinces")
}

fn write_provinces(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country.set_provinces(value_to_json::<Vec<Province>>(value, "provinces")?);
    Ok(())
}

fn read_update_date(country: &ShipCountry) -> RepoResult<Value> {
    Ok(Value::Integer(country.update_date()))
}

fn write_update_date(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country
        .base_mut()
        .set_update_date(value_to_i64(value, "update_date")?);
    Ok(())
}

fn read_create_date(country: &ShipCountry) -> RepoResult<Value> {
    Ok(Value::Integer(country.create_date()))
}

fn write_create_date(country: &mut ShipCountry, value: &Value) -> RepoResult<()> {
    country
        .base_mut()
        .set_create_date(value_to_i64(value, "create_date")?);
    Ok(())
}

/// Repository interface for ship countries.
pub trait ShipCountryRepository: Repository<Entity = ShipCountry> {
    /// Whether the catalog already ships to `country_code`.
    fn exists(&self, catalog_key: EntityKey, country_code: &str) -> RepoResult<bool>;
}

/// SQLite-backed ship country repository.
pub struct SqliteShipCountryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShipCountryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["ship_countries", "ship_zones"])?;
        Ok(Self { conn })
    }
}

fn country_exists(conn: &Connection, catalog_key: EntityKey, country_code: &str) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM ship_countries WHERE catalog_key = ?1 AND country_code = ?2
        );",
        params![catalog_key.to_string(), country_code],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl ShipCountryRepository for SqliteShipCountryRepository<'_> {
    fn exists(&self, catalog_key: EntityKey, country_code: &str) -> RepoResult<bool> {
        country_exists(self.conn, catalog_key, country_code)
    }
}

impl Repository for SqliteShipCountryRepository<'_> {
    type Entity = ShipCountry;

    fn get(&self, key: EntityKey) -> RepoResult<Option<ShipCountry>> {
        fetch_by_key::<ShipCountryMapper>(self.conn, key)
    }

    fn get_all(&self, keys: &[EntityKey]) -> RepoResult<Vec<ShipCountry>> {
        fetch_many::<ShipCountryMapper>(self.conn, keys)
    }

    fn get_by_query(&self, query: &Query) -> RepoResult<Vec<ShipCountry>> {
        fetch_by_query::<ShipCountryMapper>(self.conn, query)
    }

    fn add_or_update(&self, country: &mut ShipCountry) -> RepoResult<()> {
        if !country.is_new() {
            return update_entity::<ShipCountryMapper>(self.conn, country);
        }

        in_immediate_transaction(self.conn, |tx| {
            if country_exists(tx, country.catalog_key(), country.country_code())? {
                return Err(RepoError::ConstraintViolation(format!(
                    "country `{}` is already associated with warehouse catalog {}",
                    country.country_code(),
                    country.catalog_key()
                )));
            }
            insert_entity::<ShipCountryMapper>(tx, country)
        })
    }

    fn delete(&self, country: &ShipCountry) -> RepoResult<bool> {
        delete_entity::<ShipCountryMapper>(self.conn, country.key(), self.delete_clauses())
    }

    /// Ship countries have no dependent rows in this schema.
    fn delete_clauses(&self) -> &'static [&'static str] {
        &[]
    }
}
