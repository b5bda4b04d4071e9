pub use super::lock_error::CaskLockError;
use crate::id::CaskId;
use crate::layout::Store;
use rustc_hash::FxHashMap;
use starbase_utils::fs::{self, DirLock};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument, trace};

// How long a no-wait acquisition tolerates another process holding the lock.
const NO_WAIT_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LockMode {
    /// Fail right away if the identifier is already locked.
    NoWait,
    /// Wait up to the duration, then fail.
    Wait(Duration),
}

impl LockMode {
    fn wait_duration(&self) -> Duration {
        match self {
            Self::NoWait => NO_WAIT_GRACE,
            Self::Wait(duration) => *duration,
        }
    }
}

/// Held while an identifier is being installed, uninstalled, or zapped.
/// Releases both the in-process and cross-process locks on drop.
pub struct LockGuard {
    _dir_lock: DirLock,
    _guard: OwnedMutexGuard<()>,
    id: CaskId,
}

impl LockGuard {
    pub fn id(&self) -> &CaskId {
        &self.id
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        trace!(cask = self.id.as_str(), "Releasing install lock");
    }
}

/// Serializes operations per cask identifier. Different identifiers
/// never block each other.
#[derive(Debug, Default)]
pub struct InstallLocks {
    locks: Mutex<FxHashMap<CaskId, Arc<AsyncMutex<()>>>>,
}

impl InstallLocks {
    // Entries only referenced by the map have no holder or waiter left.
    fn get_mutex(&self, id: &CaskId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);

        Arc::clone(locks.entry(id.clone()).or_default())
    }

    pub fn is_locked(&self, id: &CaskId) -> bool {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        locks
            .get(id)
            .is_some_and(|mutex| mutex.try_lock().is_err())
    }

    /// Number of identifiers with an entry in the lock map. Released
    /// entries are pruned on the next acquisition.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[instrument(skip(self, store))]
    pub async fn acquire(
        &self,
        store: &Store,
        id: &CaskId,
        mode: LockMode,
    ) -> Result<LockGuard, CaskLockError> {
        let started = Instant::now();
        let in_progress = || CaskLockError::InProgress {
            id: id.to_string(),
        };
        let mutex = self.get_mutex(id);

        let guard = match mode {
            LockMode::NoWait => mutex.try_lock_owned().map_err(|_| in_progress())?,
            LockMode::Wait(duration) => tokio::time::timeout(duration, mutex.lock_owned())
                .await
                .map_err(|_| in_progress())?,
        };

        let lock_dir = store.get_lock_dir(id);

        debug!(lock_dir = ?lock_dir, "Acquiring install lock");

        fs::create_dir_all(&lock_dir)?;

        // Directory locks block the thread, so wait for them off the runtime
        let task = tokio::task::spawn_blocking(move || fs::lock_directory(lock_dir));

        // Both phases share one wait budget
        let remaining = match mode {
            LockMode::NoWait => mode.wait_duration(),
            LockMode::Wait(duration) => duration.saturating_sub(started.elapsed()),
        };

        let dir_lock = match tokio::time::timeout(remaining, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(error)) => {
                return Err(CaskLockError::Failed {
                    id: id.to_string(),
                    error: Box::new(error),
                });
            }
            Err(_) => return Err(in_progress()),
        };

        Ok(LockGuard {
            _dir_lock: dir_lock,
            _guard: guard,
            id: id.to_owned(),
        })
    }
}
