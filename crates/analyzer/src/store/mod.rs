//! Record store — abstract persistence capability.
//!
//! Ingest and analytics access storage only through the [`RecordStore`]
//! trait; the core never branches on backend identity. `memory.rs` provides
//! the in-process backend, `jsonl.rs` the file-backed one.

pub mod jsonl;
pub mod memory;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::parser::model::LogRecord;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Corrupt record at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Unified async interface over record persistence.
///
/// Object-safe thanks to `Pin<Box<…>>` returns. Implementations must be
/// `Send + Sync` so they can be shared behind an `Arc`.
pub trait RecordStore: Send + Sync {
    /// Append one record.
    fn insert(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Append a batch atomically: either every record is committed or none,
    /// and a concurrent `scan` never observes a partial batch.
    fn insert_many(
        &self,
        records: Vec<LogRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>>;

    /// Immutable snapshot of every stored record, in insertion order.
    fn scan(&self) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>>;
}

pub type SharedStore = Arc<dyn RecordStore>;
