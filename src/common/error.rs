use thiserror::Error;

use super::types::{PageId, RecordId, TransactionId};

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tuple schema does not match the target schema")]
    SchemaMismatch,

    #[error("Page {0} has no empty slots")]
    PageFull(PageId),

    #[error("Tuple {0:?} is not on the addressed page")]
    TupleNotOnPage(Option<RecordId>),

    #[error("Tuple belongs to table {actual}, not table {expected}")]
    WrongTable { expected: u32, actual: u32 },

    #[error("Buffer pool is full and every resident page is dirty")]
    NoCleanVictim,

    #[error("Transaction {0} aborted waiting for a lock")]
    TransactionAborted(TransactionId),

    #[error("No table with id {0}")]
    NoSuchTable(u32),

    #[error("No table named {0:?}")]
    NoSuchTableName(String),

    #[error("No column named {0:?}")]
    NoSuchColumn(String),

    #[error("Iterator has no more elements")]
    NoSuchElement,

    #[error("Aggregate {0} is not supported for this field type")]
    InvalidAggregate(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidCatalogEntry(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
