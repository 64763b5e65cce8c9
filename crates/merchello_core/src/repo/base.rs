//! Repository contract and generic SQLite persistence helpers.
//!
//! # Responsibility
//! - Define the CRUD contract every entity repository implements.
//! - Generate point, bulk and predicate reads plus insert/update/delete SQL
//!   from an `EntityMapper` column table.
//!
//! # Invariants
//! - Writes call `Entity::validate()` before any SQL mutation.
//! - Successful writes leave the entity with zero dirty properties.
//! - Failed writes leave the entity's key, dates and dirty state untouched.
//! - Dependent cleanup statements run before the root row is deleted, in
//!   the same transaction.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::entity::{now_epoch_ms, Entity, EntityKey};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::mapper::{build_entity, build_row, read_storage_row, uuid_value, EntityMapper};
use crate::repo::query::{translate, Query};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::collections::HashSet;

/// CRUD contract shared by entity repositories.
pub trait Repository {
    type Entity: Entity;

    /// Point lookup. `Ok(None)` when no row has `key`.
    fn get(&self, key: EntityKey) -> RepoResult<Option<Self::Entity>>;

    /// Every row when `keys` is empty; otherwise the matching rows, silently
    /// skipping keys that do not exist. Order is unspecified.
    fn get_all(&self, keys: &[EntityKey]) -> RepoResult<Vec<Self::Entity>>;

    fn get_by_query(&self, query: &Query) -> RepoResult<Vec<Self::Entity>>;

    /// Inserts new entities and fully updates persisted ones.
    fn add_or_update(&self, entity: &mut Self::Entity) -> RepoResult<()>;

    /// Deletes the entity and runs its dependent cleanup. Returns whether a
    /// row was removed; a missing row is not an error.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<bool>;

    /// Cleanup statements run, in order, before the root row is deleted.
    /// Each statement binds the root key as `?1`.
    fn delete_clauses(&self) -> &'static [&'static str];
}

/// Rejects connections that were not opened through `db::open_db`.
pub fn ensure_connection_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [*table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// The write lock is taken up front so a check-then-write sequence cannot
/// interleave with another connection's writer.
pub fn in_immediate_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn select_sql<M: EntityMapper>() -> String {
    let columns = M::columns()
        .iter()
        .map(|mapping| mapping.column)
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", M::TABLE)
}

pub fn fetch_by_key<M: EntityMapper>(
    conn: &Connection,
    key: EntityKey,
) -> RepoResult<Option<M::Entity>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} = ?1;",
        select_sql::<M>(),
        M::KEY_COLUMN
    ))?;
    let mut rows = stmt.query([key.to_string()])?;
    if let Some(row) = rows.next()? {
        let storage_row = read_storage_row::<M>(row)?;
        return build_entity::<M>(&storage_row).map(Some);
    }

    Ok(None)
}

pub fn fetch_all<M: EntityMapper>(conn: &Connection) -> RepoResult<Vec<M::Entity>> {
    let mut stmt = conn.prepare(&select_sql::<M>())?;
    let mut rows = stmt.query([])?;
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(build_entity::<M>(&read_storage_row::<M>(row)?)?);
    }
    Ok(entities)
}

pub fn fetch_many<M: EntityMapper>(
    conn: &Connection,
    keys: &[EntityKey],
) -> RepoResult<Vec<M::Entity>> {
    if keys.is_empty() {
        return fetch_all::<M>(conn);
    }

    let mut entities = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(entity) = fetch_by_key::<M>(conn, *key)? {
            entities.push(entity);
        }
    }
    Ok(entities)
}

/// Resolves matching keys first, then loads each entity by key.
pub fn fetch_by_query<M: EntityMapper>(
    conn: &Connection,
    query: &Query,
) -> RepoResult<Vec<M::Entity>> {
    let translated = translate::<M>(query)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {key} FROM {table} WHERE {where_sql};",
        key = M::KEY_COLUMN,
        table = M::TABLE,
        where_sql = translated.where_sql
    ))?;
    let mut rows = stmt.query(params_from_iter(translated.bind_values))?;

    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    while let Some(row) = rows.next()? {
        let key_text: String = row.get(0)?;
        if seen.insert(key_text.clone()) {
            keys.push(key_text);
        }
    }

    let mut entities = Vec::with_capacity(keys.len());
    for key_text in keys {
        let key = uuid::Uuid::parse_str(&key_text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid uuid value `{key_text}` in {}.{}",
                M::TABLE,
                M::KEY_COLUMN
            ))
        })?;
        if let Some(entity) = fetch_by_key::<M>(conn, key)? {
            entities.push(entity);
        }
    }
    Ok(entities)
}

/// Inserts a new entity, filling generated key and timestamps first.
///
/// On failure the entity's key, dates and dirty state are left as they were.
pub fn insert_entity<M: EntityMapper>(conn: &Connection, entity: &mut M::Entity) -> RepoResult<()> {
    entity.validate()?;
    let unstamped = entity.base().clone();
    entity.base_mut().adding_entity(now_epoch_ms());

    if let Err(err) = insert_row::<M>(conn, entity) {
        *entity.base_mut() = unstamped;
        return Err(err);
    }

    entity.base_mut().mark_persisted();
    entity.reset_dirty_properties();
    Ok(())
}

fn insert_row<M: EntityMapper>(conn: &Connection, entity: &M::Entity) -> RepoResult<()> {
    let row = build_row::<M>(entity)?;
    let columns = row.columns().collect::<Vec<_>>();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            M::TABLE,
            columns.join(", ")
        ),
        params_from_iter(row.into_values()),
    )?;
    Ok(())
}

/// Writes every mapped column of a persisted entity.
pub fn update_entity<M: EntityMapper>(conn: &Connection, entity: &mut M::Entity) -> RepoResult<()> {
    entity.validate()?;
    let unstamped = entity.base().clone();
    entity.base_mut().updating_entity(now_epoch_ms());

    if let Err(err) = update_row::<M>(conn, entity) {
        *entity.base_mut() = unstamped;
        return Err(err);
    }

    entity.reset_dirty_properties();
    Ok(())
}

fn update_row<M: EntityMapper>(conn: &Connection, entity: &M::Entity) -> RepoResult<()> {
    let row = build_row::<M>(entity)?;
    let mut assignments = Vec::with_capacity(row.len());
    let mut bind_values = Vec::with_capacity(row.len());
    let columns = row.columns().collect::<Vec<_>>();
    for (column, value) in columns.into_iter().zip(row.into_values()) {
        if column == M::KEY_COLUMN {
            continue;
        }
        bind_values.push(value);
        assignments.push(format!("{column} = ?{}", bind_values.len()));
    }
    bind_values.push(uuid_value(entity.key()));

    let changed = conn.execute(
        &format!(
            "UPDATE {} SET {} WHERE {} = ?{};",
            M::TABLE,
            assignments.join(", "),
            M::KEY_COLUMN,
            bind_values.len()
        ),
        params_from_iter(bind_values),
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(entity.key()));
    }
    Ok(())
}

/// Runs cleanup clauses then deletes the root row, atomically.
pub fn delete_entity<M: EntityMapper>(
    conn: &Connection,
    key: EntityKey,
    clauses: &[&str],
) -> RepoResult<bool> {
    in_immediate_transaction(conn, |tx| {
        let key_text = key.to_string();
        for clause in clauses {
            tx.execute(clause, [key_text.as_str()])?;
        }
        let removed = tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", M::TABLE, M::KEY_COLUMN),
            [key_text.as_str()],
        )?;
        Ok(removed > 0)
    })
}
