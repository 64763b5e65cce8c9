//! Shared write orchestration for entity services.
//!
//! # Responsibility
//! - Run every write as `before → lock → unit of work → unlock → after`.
//! - Turn expected domain failures into `Attempt::Failed` and let storage
//!   faults propagate.
//!
//! # Invariants
//! - A cancelled write never takes the lock nor touches storage.
//! - The write lock is released before `after` interceptors run, also when
//!   the unit of work fails.
//! - Reads never take the write lock.

use crate::db::Database;
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use crate::service::attempt::{Attempt, AttemptFailure};
use crate::service::events::{Interceptors, ServiceEvent};
use crate::service::lock::WriteLock;
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Storage handle, write lock and interceptors of one entity service.
pub struct ServiceCore<E> {
    entity_name: &'static str,
    db: Database,
    write_lock: WriteLock,
    interceptors: Interceptors<E>,
}

impl<E: Entity> ServiceCore<E> {
    pub fn new(
        entity_name: &'static str,
        db: Database,
        write_lock: WriteLock,
        interceptors: Interceptors<E>,
    ) -> Self {
        Self {
            entity_name,
            db,
            write_lock,
            interceptors,
        }
    }

    pub fn write_lock(&self) -> &WriteLock {
        &self.write_lock
    }

    /// Runs a read-only unit of work without taking the write lock.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        self.db.with_connection(f)
    }

    /// Runs the `before` interceptors. Returns `true` and flags the entity
    /// as cancelled when any of them vetoed.
    pub fn intercept(&self, event: ServiceEvent, entity: &mut E, raise_events: bool) -> bool {
        if raise_events && self.interceptors.is_cancelled(event, entity) {
            entity.base_mut().set_was_cancelled(true);
            info!(
                "event={}_{event} module=service status=cancelled key={}",
                self.entity_name,
                entity.key()
            );
            return true;
        }
        entity.base_mut().set_was_cancelled(false);
        false
    }

    /// Full write pipeline: interceptors, then `commit`.
    pub fn write(
        &self,
        event: ServiceEvent,
        entity: &mut E,
        raise_events: bool,
        unit_of_work: impl FnOnce(&Connection, &mut E) -> RepoResult<()>,
    ) -> RepoResult<Attempt<()>> {
        if self.intercept(event, entity, raise_events) {
            return Ok(Attempt::Cancelled(()));
        }
        self.commit(event, entity, raise_events, unit_of_work)
    }

    /// Runs one unit of work under the write lock, then the `after` hooks.
    ///
    /// Callers that skip `write` must have called `intercept` first.
    pub fn commit(
        &self,
        event: ServiceEvent,
        entity: &mut E,
        raise_events: bool,
        unit_of_work: impl FnOnce(&Connection, &mut E) -> RepoResult<()>,
    ) -> RepoResult<Attempt<()>> {
        let started_at = Instant::now();
        let result = {
            let _guard = self.write_lock.acquire();
            self.db.with_connection(|conn| unit_of_work(conn, entity))
        };

        match result {
            Ok(()) => {
                info!(
                    "event={}_{event} module=service status=ok key={} duration_ms={}",
                    self.entity_name,
                    entity.key(),
                    started_at.elapsed().as_millis()
                );
                if raise_events {
                    self.interceptors.notify(event, entity);
                }
                Ok(Attempt::Succeeded(()))
            }
            Err(RepoError::ConstraintViolation(message)) => {
                warn!(
                    "event={}_{event} module=service status=rejected error_code=constraint_violation",
                    self.entity_name
                );
                Ok(Attempt::Failed(AttemptFailure::Constraint(message)))
            }
            Err(RepoError::Validation(err)) => {
                warn!(
                    "event={}_{event} module=service status=rejected error_code=validation error={err}",
                    self.entity_name
                );
                Ok(Attempt::Failed(AttemptFailure::Validation(err)))
            }
            Err(err) => {
                error!(
                    "event={}_{event} module=service status=error duration_ms={} error={err}",
                    self.entity_name,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}
