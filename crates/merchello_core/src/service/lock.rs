//! Per-entity-type write lock.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Exclusive lock serializing writes of one entity type.
///
/// Clones share the same lock, so services that must not interleave writes
/// are built from clones of one `WriteLock`. Independent instances never
/// contend with each other.
#[derive(Clone, Default)]
pub struct WriteLock {
    inner: Arc<Mutex<()>>,
}

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock is free. Released when the guard drops.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Whether both handles guard the same lock.
    pub fn shares_with(&self, other: &WriteLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::WriteLock;

    #[test]
    fn guard_releases_on_scope_exit() {
        let lock = WriteLock::new();
        {
            let _guard = lock.acquire();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_releases_on_panic() {
        let lock = WriteLock::new();
        let cloned = lock.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cloned.acquire();
            panic!("unit of work failed");
        }));
        assert!(result.is_err());
        assert!(!lock.is_locked());
    }

    #[test]
    fn clones_share_and_fresh_instances_do_not() {
        let lock = WriteLock::new();
        assert!(lock.shares_with(&lock.clone()));
        assert!(!lock.shares_with(&WriteLock::new()));
    }
}
