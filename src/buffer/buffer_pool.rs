use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::catalog::Catalog;
use crate::common::{DbError, PageId, Permissions, Result, TransactionId, DEFAULT_POOL_SIZE};
use crate::concurrency::LockManager;
use crate::storage::HeapPage;
use crate::tuple::Tuple;
use crate::wal::WalFile;

/// Cache state guarded by the pool's monitor.
struct PoolState {
    pages: HashMap<PageId, Arc<RwLock<HeapPage>>>,
    /// Per-page access frequency, consulted when picking an eviction victim
    use_counts: HashMap<PageId, u64>,
}

/// BufferPool is the sole gateway through which operators obtain pages. It
/// caches up to `capacity` pages, checks transactional locks on every
/// fetch, and owns commit/abort.
///
/// The recovery policy is NO STEAL / FORCE: a dirty page is never evicted
/// or written before its transaction commits, and at commit every page the
/// transaction dirtied is logged and written out before the commit
/// completes. Aborts roll cached pages back to their before-images.
pub struct BufferPool {
    capacity: usize,
    state: Mutex<PoolState>,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    wal: Arc<WalFile>,
}

impl BufferPool {
    /// Creates a buffer pool caching up to `capacity` pages.
    pub fn new(capacity: usize, catalog: Arc<Catalog>, wal: Arc<WalFile>) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState {
                pages: HashMap::new(),
                use_counts: HashMap::new(),
            }),
            lock_manager: LockManager::new(),
            catalog,
            wal,
        }
    }

    /// Creates a buffer pool with the default capacity.
    pub fn with_default_capacity(catalog: Arc<Catalog>, wal: Arc<WalFile>) -> Self {
        Self::new(DEFAULT_POOL_SIZE, catalog, wal)
    }

    /// Returns the pool capacity in pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of resident pages.
    pub fn resident_pages(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Returns true if the page is currently cached.
    pub fn is_resident(&self, pid: PageId) -> bool {
        self.state.lock().pages.contains_key(&pid)
    }

    /// Retrieves the requested page with the requested permissions.
    ///
    /// Blocks until the lock is granted; a wait that trips deadlock
    /// detection surfaces `TransactionAborted` and the caller must tear the
    /// transaction down with `transaction_complete(tid, false)`. The lock is
    /// taken before the monitor so blocked acquirers never hold up the
    /// cache.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<Arc<RwLock<HeapPage>>> {
        self.lock_manager.acquire_lock(tid, pid, perm)?;

        let mut state = self.state.lock();
        if let Some(page) = state.pages.get(&pid) {
            let page = Arc::clone(page);
            *state.use_counts.entry(pid).or_insert(0) += 1;
            return Ok(page);
        }

        if state.pages.len() >= self.capacity {
            Self::evict_page(&mut state)?;
        }

        let file = self.catalog.table(pid.table_id)?;
        let page = Arc::new(RwLock::new(file.read_page(pid)?));
        state.pages.insert(pid, Arc::clone(&page));
        *state.use_counts.entry(pid).or_insert(0) += 1;
        Ok(page)
    }

    /// Adds a tuple to the given table on behalf of `tid`, write-locking
    /// the page it lands on and marking it dirty.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: u32, t: Tuple) -> Result<()> {
        let file = self.catalog.table(table_id)?;
        let page = file.add_tuple(tid, t, self)?;

        let pid = {
            let mut guard = page.write();
            guard.mark_dirty(true, tid);
            guard.pid()
        };
        *self.state.lock().use_counts.entry(pid).or_insert(0) += 1;
        Ok(())
    }

    /// Removes a tuple from the table it belongs to on behalf of `tid`,
    /// write-locking its page and marking it dirty.
    pub fn delete_tuple(&self, tid: TransactionId, t: &Tuple) -> Result<()> {
        let rid = t.record_id().ok_or(DbError::TupleNotOnPage(None))?;
        let file = self.catalog.table(rid.page_id.table_id)?;
        let page = file.delete_tuple(tid, t, self)?;

        let pid = {
            let mut guard = page.write();
            guard.mark_dirty(true, tid);
            guard.pid()
        };
        *self.state.lock().use_counts.entry(pid).or_insert(0) += 1;
        Ok(())
    }

    /// Commits or aborts a transaction, then releases all of its locks.
    /// The locks drop on every exit path, including a failed flush.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let result = if commit {
            self.commit_transaction(tid)
        } else {
            self.abort_transaction(tid)
        };
        self.lock_manager.release_pages(tid);
        result
    }

    /// FORCE: every page dirtied by `tid` is logged and written to its heap
    /// file before the commit returns; its current contents become the
    /// before-image for the next transaction that touches it.
    fn commit_transaction(&self, tid: TransactionId) -> Result<()> {
        let state = self.state.lock();
        for page in state.pages.values() {
            let mut guard = page.write();
            if guard.dirtier() != Some(tid) {
                continue;
            }

            let after_image = guard.page_data();
            self.wal
                .log_write(tid, guard.before_image_data(), &after_image)?;
            self.wal.force()?;
            self.catalog.table(guard.pid().table_id)?.write_page(&guard)?;
            guard.mark_dirty(false, tid);
            guard.set_before_image();
            debug!(%tid, pid = %guard.pid(), "commit flushed page");
        }
        Ok(())
    }

    /// Rolls every page dirtied by `tid` back to its before-image.
    fn abort_transaction(&self, tid: TransactionId) -> Result<()> {
        let state = self.state.lock();
        for page in state.pages.values() {
            let mut guard = page.write();
            if guard.dirtier() != Some(tid) {
                continue;
            }
            let restored = guard.before_image()?;
            *guard = restored;
            debug!(%tid, pid = %guard.pid(), "abort restored page");
        }
        Ok(())
    }

    /// Returns true if `tid` holds a lock on `pid`.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds_lock(tid, pid)
    }

    /// Releases `tid`'s lock on a single page. Risky for readers: dropping
    /// a read lock mid-transaction forfeits repeatable reads.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release_page(tid, pid);
    }

    /// Flushes every dirty page to disk. Breaks NO STEAL if used while
    /// transactions are in flight; meant for tests and shutdown.
    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.state.lock();
        for page in state.pages.values() {
            self.flush_page_guarded(page)?;
        }
        Ok(())
    }

    /// Flushes every page dirtied by `tid` and re-snapshots each as its own
    /// before-image.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<()> {
        let state = self.state.lock();
        for page in state.pages.values() {
            if page.read().dirtier() != Some(tid) {
                continue;
            }
            self.flush_page_guarded(page)?;
            page.write().set_before_image();
        }
        Ok(())
    }

    /// Flushes one page by id if it is resident and dirty.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let state = self.state.lock();
        if let Some(page) = state.pages.get(&pid) {
            self.flush_page_guarded(page)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it. Used by the external
    /// recovery collaborator to get rolled-back pages out of memory.
    pub fn discard_page(&self, pid: PageId) {
        let mut state = self.state.lock();
        state.pages.remove(&pid);
        state.use_counts.remove(&pid);
    }

    fn flush_page_guarded(&self, page: &Arc<RwLock<HeapPage>>) -> Result<()> {
        let mut guard = page.write();
        let Some(dirtier) = guard.dirtier() else {
            return Ok(());
        };

        let after_image = guard.page_data();
        self.wal
            .log_write(dirtier, guard.before_image_data(), &after_image)?;
        self.wal.force()?;
        self.catalog.table(guard.pid().table_id)?.write_page(&guard)?;
        guard.mark_dirty(false, dirtier);
        Ok(())
    }

    /// NO STEAL: only clean pages are eviction candidates; the least
    /// frequently used one goes. Every resident page dirty means the pool
    /// cannot make room.
    fn evict_page(state: &mut PoolState) -> Result<()> {
        let victim = state
            .pages
            .iter()
            .filter(|(_, page)| page.read().dirtier().is_none())
            .map(|(pid, _)| (*pid, state.use_counts.get(pid).copied().unwrap_or(0)))
            .min_by_key(|&(_, count)| count)
            .map(|(pid, _)| pid);

        match victim {
            Some(pid) => {
                debug!(%pid, "evicting clean page");
                state.pages.remove(&pid);
                state.use_counts.remove(&pid);
                Ok(())
            }
            None => Err(DbError::NoCleanVictim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HeapFile;
    use crate::tuple::{Field, FieldType, Tuple, TupleDesc};
    use crate::common::PAGE_SIZE;
    use std::fs;
    use tempfile::TempDir;

    /// Builds a pool over one table whose file starts with `pages` empty
    /// pages on disk.
    fn make_pool(capacity: usize, pages: usize) -> (TempDir, BufferPool, u32) {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("t.dat");
        fs::write(&data_path, vec![0u8; pages * PAGE_SIZE]).unwrap();

        let desc = TupleDesc::named(vec![("a", FieldType::Int)]).into_arc();
        let file = Arc::new(HeapFile::open(&data_path, desc).unwrap());
        let table_id = file.table_id();

        let catalog = Arc::new(Catalog::new());
        catalog.add_table(file, "t", "a");
        let wal = Arc::new(WalFile::open(dir.path().join("test.wal")).unwrap());

        (dir, BufferPool::new(capacity, catalog, wal), table_id)
    }

    #[test]
    fn test_get_page_caches() {
        let (_dir, pool, table_id) = make_pool(4, 1);
        let tid = TransactionId::new();
        let pid = PageId::new(table_id, 0);

        let first = pool.get_page(tid, pid, Permissions::ReadOnly).unwrap();
        let second = pool.get_page(tid, pid, Permissions::ReadOnly).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.resident_pages(), 1);
    }

    #[test]
    fn test_capacity_is_respected() {
        let (_dir, pool, table_id) = make_pool(2, 3);
        let tid = TransactionId::new();

        for page_no in 0..3 {
            pool.get_page(tid, PageId::new(table_id, page_no), Permissions::ReadOnly)
                .unwrap();
        }
        assert_eq!(pool.resident_pages(), 2);
    }

    #[test]
    fn test_eviction_prefers_least_used_clean_page() {
        let (_dir, pool, table_id) = make_pool(2, 3);
        let tid = TransactionId::new();
        let (p0, p1, p2) = (
            PageId::new(table_id, 0),
            PageId::new(table_id, 1),
            PageId::new(table_id, 2),
        );

        for _ in 0..3 {
            pool.get_page(tid, p0, Permissions::ReadOnly).unwrap();
        }
        pool.get_page(tid, p1, Permissions::ReadOnly).unwrap();

        pool.get_page(tid, p2, Permissions::ReadOnly).unwrap();
        assert!(pool.is_resident(p0));
        assert!(!pool.is_resident(p1));
        assert!(pool.is_resident(p2));
    }

    #[test]
    fn test_insert_marks_page_dirty_and_commit_cleans() {
        let (_dir, pool, table_id) = make_pool(4, 1);
        let tid = TransactionId::new();
        let desc = {
            let page = pool
                .get_page(tid, PageId::new(table_id, 0), Permissions::ReadOnly)
                .unwrap();
            let desc = page.read().desc().clone();
            desc
        };

        let t = Tuple::with_fields(desc, vec![Field::Int(7)]);
        pool.insert_tuple(tid, table_id, t).unwrap();

        let page = pool
            .get_page(tid, PageId::new(table_id, 0), Permissions::ReadWrite)
            .unwrap();
        assert_eq!(page.read().dirtier(), Some(tid));

        pool.transaction_complete(tid, true).unwrap();
        assert_eq!(page.read().dirtier(), None);
    }

    #[test]
    fn test_discard_page() {
        let (_dir, pool, table_id) = make_pool(4, 1);
        let tid = TransactionId::new();
        let pid = PageId::new(table_id, 0);

        pool.get_page(tid, pid, Permissions::ReadOnly).unwrap();
        assert!(pool.is_resident(pid));
        pool.discard_page(pid);
        assert!(!pool.is_resident(pid));
    }
}
