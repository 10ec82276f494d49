use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::buffer::BufferPool;
use crate::common::{DbError, PageId, Permissions, Result, TransactionId, PAGE_SIZE};
use crate::exec::DbIterator;
use crate::tuple::{Tuple, TupleDesc};

use super::heap_page::HeapPage;

/// HeapFile stores one table as an unordered collection of fixed-size pages
/// appended to a single on-disk file: page 0, page 1, ... with no file
/// header. Pages are always fetched through the buffer pool so that reads
/// and writes respect transactional locking.
pub struct HeapFile {
    file: Mutex<File>,
    path: PathBuf,
    desc: Arc<TupleDesc>,
    table_id: u32,
    /// Pages present on disk when the file was opened
    base_pages: usize,
    /// Pages appended during this session
    appended_pages: AtomicUsize,
}

impl HeapFile {
    /// Opens (creating if absent) the heap file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, desc: Arc<TupleDesc>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let path = path.as_ref().canonicalize()?;
        let base_pages = file.metadata()?.len() as usize / PAGE_SIZE;

        // The table id must be stable across re-opens: hash the absolute path.
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let table_id = hasher.finish() as u32;

        Ok(Self {
            file: Mutex::new(file),
            path,
            desc,
            table_id,
            base_pages,
            appended_pages: AtomicUsize::new(0),
        })
    }

    /// Returns the id uniquely identifying this table.
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// Returns the schema of the tuples stored in this file.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of pages in this file.
    pub fn num_pages(&self) -> usize {
        self.base_pages + self.appended_pages.load(Ordering::SeqCst)
    }

    /// Reads a page straight from disk, bypassing the buffer pool. Callers
    /// other than the buffer pool should use `BufferPool::get_page`.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        let mut buf = vec![0u8; PAGE_SIZE];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start((pid.page_no * PAGE_SIZE) as u64))?;
            file.read_exact(&mut buf)?;
        }
        HeapPage::parse(pid, self.desc.clone(), &buf)
    }

    /// Writes a page back to its slot in the file. Per-page writes are
    /// atomic with respect to each other; callers serialize them.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let data = page.page_data();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start((page.pid().page_no * PAGE_SIZE) as u64))?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(())
    }

    /// Extends the file with a fresh empty page and returns its id.
    fn allocate_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let page_no = self.base_pages + self.appended_pages.load(Ordering::SeqCst);

        file.seek(SeekFrom::Start((page_no * PAGE_SIZE) as u64))?;
        file.write_all(&HeapPage::empty_page_data())?;
        file.flush()?;

        self.appended_pages.fetch_add(1, Ordering::SeqCst);
        Ok(PageId::new(self.table_id, page_no))
    }

    /// Inserts a tuple into the first page with a free slot, allocating a
    /// new page when every existing page is full. Pages are fetched
    /// write-locked through the buffer pool. Returns the dirtied page.
    pub fn add_tuple(
        &self,
        tid: TransactionId,
        t: Tuple,
        pool: &BufferPool,
    ) -> Result<Arc<RwLock<HeapPage>>> {
        for page_no in 0..self.num_pages() {
            let pid = PageId::new(self.table_id, page_no);
            let page = pool.get_page(tid, pid, Permissions::ReadWrite)?;
            if page.read().empty_slot_count() > 0 {
                page.write().insert_tuple(t)?;
                return Ok(page);
            }
        }

        let pid = self.allocate_page()?;
        let page = pool.get_page(tid, pid, Permissions::ReadWrite)?;
        page.write().insert_tuple(t)?;
        Ok(page)
    }

    /// Deletes a tuple from the page it lives on, fetched write-locked
    /// through the buffer pool. Returns the dirtied page.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        t: &Tuple,
        pool: &BufferPool,
    ) -> Result<Arc<RwLock<HeapPage>>> {
        let rid = t.record_id().ok_or(DbError::TupleNotOnPage(None))?;
        if rid.page_id.table_id != self.table_id {
            return Err(DbError::WrongTable {
                expected: self.table_id,
                actual: rid.page_id.table_id,
            });
        }

        let page = pool.get_page(tid, rid.page_id, Permissions::ReadWrite)?;
        page.write().delete_tuple(t)?;
        Ok(page)
    }

    /// Returns a sequential scan over this file under transaction `tid`.
    pub fn iter(self: &Arc<Self>, tid: TransactionId, pool: Arc<BufferPool>) -> HeapFileIterator {
        HeapFileIterator {
            file: Arc::clone(self),
            pool,
            tid,
            next_page: 0,
            current: Vec::new().into_iter(),
            opened: false,
        }
    }
}

/// Sequential scan over a heap file: fetches each page in page-number order
/// through the buffer pool with read permission and yields its tuples in
/// slot order.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    next_page: usize,
    current: std::vec::IntoIter<Tuple>,
    opened: bool,
}

impl DbIterator for HeapFileIterator {
    fn open(&mut self) -> Result<()> {
        self.opened = true;
        self.next_page = 0;
        self.current = Vec::new().into_iter();
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        if !self.opened {
            return Ok(None);
        }
        loop {
            if let Some(t) = self.current.next() {
                return Ok(Some(t));
            }
            if self.next_page >= self.file.num_pages() {
                return Ok(None);
            }

            let pid = PageId::new(self.file.table_id(), self.next_page);
            self.next_page += 1;
            let page = self.pool.get_page(self.tid, pid, Permissions::ReadOnly)?;
            let tuples: Vec<Tuple> = page.read().iter().cloned().collect();
            self.current = tuples.into_iter();
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.open()
    }

    fn close(&mut self) {
        self.opened = false;
        self.current = Vec::new().into_iter();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.file.desc().clone()
    }
}
