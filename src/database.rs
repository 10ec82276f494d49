use std::path::Path;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::Catalog;
use crate::common::{Result, DEFAULT_POOL_SIZE};
use crate::wal::WalFile;

/// The top-level context tying the engine together: one catalog, one buffer
/// pool, and one write-ahead log. Constructed at startup and passed
/// explicitly to whatever needs it; tests build a fresh one per run instead
/// of sharing process-wide state.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    wal: Arc<WalFile>,
}

impl Database {
    /// Creates a database whose log lives at `wal_path`, with the default
    /// buffer pool capacity.
    pub fn new<P: AsRef<Path>>(wal_path: P) -> Result<Arc<Self>> {
        Self::with_pool_size(wal_path, DEFAULT_POOL_SIZE)
    }

    /// Creates a database with an explicit buffer pool capacity.
    pub fn with_pool_size<P: AsRef<Path>>(wal_path: P, pool_size: usize) -> Result<Arc<Self>> {
        let catalog = Arc::new(Catalog::new());
        let wal = Arc::new(WalFile::open(wal_path)?);
        let buffer_pool = Arc::new(BufferPool::new(
            pool_size,
            Arc::clone(&catalog),
            Arc::clone(&wal),
        ));
        Ok(Arc::new(Self {
            catalog,
            buffer_pool,
            wal,
        }))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn wal(&self) -> &Arc<WalFile> {
        &self.wal
    }
}
