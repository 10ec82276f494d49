use std::collections::{HashMap, HashSet};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::common::{DbError, PageId, Permissions, Result, TransactionId, DEADLOCK_TIMEOUT};

/// Who currently holds a page and how.
#[derive(Debug, Default)]
struct PageLock {
    holders: HashSet<TransactionId>,
    exclusive: bool,
}

impl PageLock {
    fn grantable(&self, tid: TransactionId, perm: Permissions) -> bool {
        match perm {
            // shared locks coexist; a transaction's own exclusive lock
            // covers its reads
            Permissions::ReadOnly => {
                !self.exclusive || (self.holders.len() == 1 && self.holders.contains(&tid))
            }
            // exclusive requires sole ownership; S -> X upgrade only when
            // no other holder exists
            Permissions::ReadWrite => {
                self.holders.is_empty() || (self.holders.len() == 1 && self.holders.contains(&tid))
            }
        }
    }
}

/// Grants per-page shared and exclusive locks to transactions.
///
/// Acquisition blocks until the lock is compatible; a transaction that
/// waits past `DEADLOCK_TIMEOUT` is presumed to be part of a cycle and is
/// aborted. Waiters are woken by a broadcast on every release.
pub struct LockManager {
    locks: Mutex<HashMap<PageId, PageLock>>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Blocks until `tid` holds the requested lock on `pid`. Re-entrant:
    /// requesting a lock already held (including a read under the
    /// transaction's own exclusive lock) succeeds immediately, and a sole
    /// shared holder upgrades in place.
    pub fn acquire_lock(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<()> {
        let deadline = Instant::now() + DEADLOCK_TIMEOUT;
        let mut locks = self.locks.lock();

        loop {
            let grantable = locks.get(&pid).map_or(true, |e| e.grantable(tid, perm));
            if grantable {
                let entry = locks.entry(pid).or_default();
                entry.holders.insert(tid);
                if perm == Permissions::ReadWrite {
                    entry.exclusive = true;
                }
                return Ok(());
            }

            if self.released.wait_until(&mut locks, deadline).timed_out() {
                warn!(%tid, %pid, ?perm, "lock wait exceeded deadlock threshold, aborting");
                return Err(DbError::TransactionAborted(tid));
            }
        }
    }

    /// Drops whatever lock `tid` holds on `pid`; a no-op if none. Releasing
    /// a read lock mid-transaction can break repeatable reads, so callers
    /// other than `transaction_complete` should think twice.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        let mut locks = self.locks.lock();
        if let Some(entry) = locks.get_mut(&pid) {
            entry.holders.remove(&tid);
            if entry.holders.is_empty() {
                locks.remove(&pid);
            }
        }
        self.released.notify_all();
    }

    /// Drops every lock held by `tid`.
    pub fn release_pages(&self, tid: TransactionId) {
        let mut locks = self.locks.lock();
        locks.retain(|_, entry| {
            entry.holders.remove(&tid);
            !entry.holders.is_empty()
        });
        self.released.notify_all();
    }

    /// Returns true if `tid` holds any lock on `pid`.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.locks
            .lock()
            .get(&pid)
            .map(|entry| entry.holders.contains(&tid))
            .unwrap_or(false)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
