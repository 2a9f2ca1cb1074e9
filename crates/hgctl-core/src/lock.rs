//! Per-working-directory serialization.
//!
//! Nothing in this crate locks on its own. Callers running operations in
//! parallel take a [`WorkdirGuard`] for the working copy first; operations on
//! the same root then run one at a time, different roots never contend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of async mutexes keyed by working-copy root
#[derive(Debug, Default)]
pub struct WorkdirLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one working copy; released on drop
#[derive(Debug)]
pub struct WorkdirGuard {
    _guard: OwnedMutexGuard<()>,
}

impl WorkdirLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other guard for `root` is alive
    pub async fn lock(&self, root: &Path) -> WorkdirGuard {
        let (key, mutex) = self.entry(root);
        trace!(root = %key.display(), "Waiting for working directory lock");
        WorkdirGuard {
            _guard: mutex.lock_owned().await,
        }
    }

    /// Take the lock only if it is free right now
    pub fn try_lock(&self, root: &Path) -> Option<WorkdirGuard> {
        let (_, mutex) = self.entry(root);
        mutex
            .try_lock_owned()
            .ok()
            .map(|guard| WorkdirGuard { _guard: guard })
    }

    fn entry(&self, root: &Path) -> (PathBuf, Arc<AsyncMutex<()>>) {
        let key = normalize(root);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries only the registry refers to have no holder and no waiter
        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        let mutex = locks.entry(key.clone()).or_default().clone();
        (key, mutex)
    }
}

/// `./repo`, `repo/` and the absolute path all name the same working copy
fn normalize(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.components().collect())
}
