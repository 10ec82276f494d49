use std::time::Duration;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages held by the buffer pool
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Payload width of a string field in bytes. On disk a string field is a
/// 4-byte big-endian length prefix followed by this many bytes, zero-padded.
pub const STRING_LEN: usize = 128;

/// How long a transaction may wait on a page lock before it is presumed
/// deadlocked and aborted.
pub const DEADLOCK_TIMEOUT: Duration = Duration::from_millis(500);
