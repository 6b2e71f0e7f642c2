//! Storage engine traits.
//!
//! Backends expose snapshot-isolated transactions over partitioned
//! key-value data. Partitions keep tenants apart; different backends map
//! them to their native concepts (column families, trees, key prefixes).

use std::fmt;
use std::sync::Arc;

use crate::Result;

/// A logical partition of data within a storage backend.
///
/// The executor derives one partition per `(namespace, database)` pair so
/// tenant data never shares a keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    name: String,
}

impl Partition {
    /// Creates a new partition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the partition name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for Partition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A transactional key-value engine.
///
/// Implementations must be thread-safe (`Send + Sync`). Transactions are
/// snapshot-isolated: reads observe the state at `begin`, and conflicting
/// writes surface as [`StoreError::Conflict`](crate::StoreError::Conflict)
/// at commit time.
pub trait KvEngine: Send + Sync {
    /// Begin a transaction. Read-only transactions reject writes.
    fn begin(&self, writable: bool) -> Result<Box<dyn KvTransaction>>;
}

impl<E: KvEngine + ?Sized> KvEngine for Arc<E> {
    fn begin(&self, writable: bool) -> Result<Box<dyn KvTransaction>> {
        (**self).begin(writable)
    }
}

/// A single snapshot-isolated transaction.
///
/// Writes are buffered until [`commit`](KvTransaction::commit); dropping a
/// transaction without committing rolls it back.
pub trait KvTransaction: Send {
    /// Get a value by key. Returns `Ok(None)` if the key does not exist.
    fn get(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or update a key-value pair.
    fn put(&mut self, partition: &Partition, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete a key. Idempotent.
    fn delete(&mut self, partition: &Partition, key: &str) -> Result<()>;

    /// Collect all live key-value pairs whose key starts with `prefix`,
    /// in key order.
    fn scan_prefix(&self, partition: &Partition, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Whether this transaction accepts writes.
    fn writable(&self) -> bool;

    /// Commit the transaction, making buffered writes durable.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Cancel the transaction, discarding buffered writes.
    fn cancel(self: Box<Self>) -> Result<()>;
}
