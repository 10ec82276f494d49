use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;

use crate::common::{Result, TransactionId};

/// Append-only write-ahead log. The buffer pool's commit path appends an
/// update record (transaction id, before-image, after-image) for every page
/// it force-flushes, then forces the log itself. Recovery replay is handled
/// elsewhere; this file only has to land records durably and in order.
pub struct WalFile {
    file: Mutex<File>,
}

impl WalFile {
    /// Opens (creating if absent) the log file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends an update record for one page write. Both images are full
    /// page-sized snapshots; the record is
    /// `tid (8B BE) | before_len (4B BE) | before | after_len (4B BE) | after`.
    pub fn log_write(
        &self,
        tid: TransactionId,
        before_image: &[u8],
        after_image: &[u8],
    ) -> Result<()> {
        let mut file = self.file.lock();
        file.write_all(&tid.as_u64().to_be_bytes())?;
        file.write_all(&(before_image.len() as u32).to_be_bytes())?;
        file.write_all(before_image)?;
        file.write_all(&(after_image.len() as u32).to_be_bytes())?;
        file.write_all(after_image)?;
        Ok(())
    }

    /// Forces every appended record to stable storage.
    pub fn force(&self) -> Result<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_write_appends() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WalFile::open(dir.path().join("wal.log")).unwrap();

        let tid = TransactionId::new();
        wal.log_write(tid, &[1u8; 16], &[2u8; 16]).unwrap();
        wal.force().unwrap();

        let len = std::fs::metadata(dir.path().join("wal.log")).unwrap().len();
        // tid + 2 length prefixes + both images
        assert_eq!(len, 8 + 4 + 16 + 4 + 16);
    }
}
