//! Before/after interceptors for service write operations.
//!
//! # Invariants
//! - Interceptors observe the entity by shared reference; they may veto a
//!   write but never change it.
//! - Interceptors run in registration order; the first `Cancel` stops the
//!   remaining `before` hooks.
//! - `after` hooks run only for committed writes.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Mutating operation an interceptor is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceEvent {
    Create,
    Save,
    Delete,
}

impl ServiceEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Save => "save",
            Self::Delete => "delete",
        }
    }
}

impl Display for ServiceEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a `before` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDecision {
    #[default]
    Proceed,
    Cancel,
}

/// Hook pair around one entity type's writes.
pub trait ServiceInterceptor<E>: Send + Sync {
    /// Called before the write lock is taken.
    fn before(&self, _event: ServiceEvent, _entity: &E) -> EventDecision {
        EventDecision::Proceed
    }

    /// Called after the write committed and the lock was released.
    fn after(&self, _event: ServiceEvent, _entity: &E) {}
}

/// Ordered interceptor list handed to a service at construction.
pub struct Interceptors<E> {
    entries: Vec<Arc<dyn ServiceInterceptor<E>>>,
}

impl<E> Default for Interceptors<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Clone for Interceptors<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<E> Interceptors<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor; it runs after every earlier registration.
    pub fn with(mut self, interceptor: Arc<dyn ServiceInterceptor<E>>) -> Self {
        self.entries.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn ServiceInterceptor<E>>) {
        self.entries.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `before` hooks in order and reports whether any vetoed.
    pub fn is_cancelled(&self, event: ServiceEvent, entity: &E) -> bool {
        self.entries
            .iter()
            .any(|interceptor| interceptor.before(event, entity) == EventDecision::Cancel)
    }

    pub fn notify(&self, event: ServiceEvent, entity: &E) {
        for interceptor in &self.entries {
            interceptor.after(event, entity);
        }
    }
}
