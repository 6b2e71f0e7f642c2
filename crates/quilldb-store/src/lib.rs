//! Transactional key-value storage abstraction for QuillDB.
//!
//! The executor core only ever talks to storage through the [`KvEngine`]
//! and [`KvTransaction`] traits, so backends are pluggable. The crate ships
//! a snapshot-isolated in-memory engine used by tests and embedded callers.

pub mod engine;
pub mod key_encoding;
pub mod memory;

pub use engine::{KvEngine, KvTransaction, Partition};
pub use memory::MemoryKvEngine;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A concurrent transaction committed a conflicting write first.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A write was attempted through a read-only transaction.
    #[error("Transaction is read-only")]
    ReadOnly,

    /// The transaction was already committed or cancelled.
    #[error("Transaction is closed")]
    Closed,

    /// Generic I/O failure from the underlying storage.
    #[error("I/O error: {0}")]
    Io(String),

    /// Other errors.
    #[error("Storage error: {0}")]
    Other(String),
}
