//! heapdb - a minimal disk-oriented relational storage and execution engine
//!
//! Tables are stored as heap files of fixed-size pages; a bounded buffer
//! pool caches pages under transactional page locking, and queries run as
//! pull-based iterator trees over the pool.
//!
//! # Architecture
//!
//! - **Tuple model** (`tuple`): fixed-width field values (`Field`), schemas
//!   (`TupleDesc`), and rows (`Tuple`) addressed by `RecordId`.
//!
//! - **Storage layer** (`storage`): `HeapPage` packs tuples into 4 KB pages
//!   behind a slot bitmap; `HeapFile` is a table as an append-only sequence
//!   of pages on disk.
//!
//! - **Buffer pool** (`buffer`): the sole gateway to pages. Checks page
//!   locks on every fetch, caches up to a fixed number of pages, and runs
//!   commit/abort under a NO STEAL / FORCE policy using per-page
//!   before-images.
//!
//! - **Concurrency** (`concurrency`): shared/exclusive page locks with
//!   blocking acquisition and timeout-based deadlock detection.
//!
//! - **Execution** (`exec`): pull-based operators - sequential scan,
//!   filter, nested-loop join, insert, delete, and hash-grouped
//!   aggregation.
//!
//! - **Statistics** (`stats`): equi-width integer histograms for
//!   selectivity estimation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use heapdb::database::Database;
//! use heapdb::exec::{DbIterator, SeqScan};
//! use heapdb::storage::HeapFile;
//! use heapdb::tuple::{Field, FieldType, Tuple, TupleDesc};
//! use heapdb::common::TransactionId;
//!
//! let db = Database::new("demo.wal").unwrap();
//!
//! // Register a one-column table backed by demo.dat
//! let desc = TupleDesc::named(vec![("a", FieldType::Int)]).into_arc();
//! let file = Arc::new(HeapFile::open("demo.dat", desc.clone()).unwrap());
//! let table_id = file.table_id();
//! db.catalog().add_table(file, "demo", "a");
//!
//! // Insert a row and commit
//! let tid = TransactionId::new();
//! let row = Tuple::with_fields(desc, vec![Field::Int(42)]);
//! db.buffer_pool().insert_tuple(tid, table_id, row).unwrap();
//! db.buffer_pool().transaction_complete(tid, true).unwrap();
//!
//! // Scan it back
//! let tid = TransactionId::new();
//! let mut scan = SeqScan::new(&db, tid, table_id).unwrap();
//! scan.open().unwrap();
//! while let Some(tuple) = scan.read_next().unwrap() {
//!     print!("{}", tuple);
//! }
//! db.buffer_pool().transaction_complete(tid, true).unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod concurrency;
pub mod database;
pub mod exec;
pub mod stats;
pub mod storage;
pub mod tuple;
pub mod wal;

// Re-export commonly used types at the crate root
pub use common::{DbError, PageId, Permissions, RecordId, Result, TransactionId};
pub use database::Database;
