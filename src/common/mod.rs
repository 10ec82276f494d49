pub mod config;
pub mod error;
pub mod types;

pub use config::{DEADLOCK_TIMEOUT, DEFAULT_POOL_SIZE, PAGE_SIZE, STRING_LEN};
pub use error::{DbError, Result};
pub use types::{PageId, Permissions, RecordId, TransactionId};
