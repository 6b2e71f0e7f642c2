//! In-memory storage engine.
//!
//! Snapshot isolation via whole-map snapshots at `begin` plus
//! first-committer-wins validation at `commit`: a transaction fails with
//! [`StoreError::Conflict`] if any key it wrote was committed by another
//! transaction after its snapshot was taken.
//!
//! Intended for tests and embedded single-process use; durable backends
//! plug in behind the same [`KvEngine`] trait.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::{KvEngine, KvTransaction, Partition};
use crate::{Result, StoreError};

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    /// `None` is a tombstone, kept so deletes participate in conflict
    /// detection.
    value: Option<Vec<u8>>,
}

#[derive(Default)]
struct MemoryInner {
    partitions: HashMap<Partition, BTreeMap<String, Versioned>>,
    version: u64,
}

/// Snapshot-isolated in-memory key-value engine.
#[derive(Default, Clone)]
pub struct MemoryKvEngine {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryKvEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvEngine for MemoryKvEngine {
    fn begin(&self, writable: bool) -> Result<Box<dyn KvTransaction>> {
        let inner = self.inner.read();
        Ok(Box::new(MemoryTransaction {
            engine: Arc::clone(&self.inner),
            snapshot: inner.partitions.clone(),
            begin_version: inner.version,
            writes: BTreeMap::new(),
            writable,
        }))
    }
}

struct MemoryTransaction {
    engine: Arc<RwLock<MemoryInner>>,
    snapshot: HashMap<Partition, BTreeMap<String, Versioned>>,
    begin_version: u64,
    /// Buffered writes, applied at commit. `None` values are deletes.
    writes: BTreeMap<(Partition, String), Option<Vec<u8>>>,
    writable: bool,
}

impl KvTransaction for MemoryTransaction {
    fn get(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.get(&(partition.clone(), key.to_string())) {
            return Ok(buffered.clone());
        }
        Ok(self
            .snapshot
            .get(partition)
            .and_then(|tree| tree.get(key))
            .and_then(|v| v.value.clone()))
    }

    fn put(&mut self, partition: &Partition, key: &str, value: Vec<u8>) -> Result<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.writes
            .insert((partition.clone(), key.to_string()), Some(value));
        Ok(())
    }

    fn delete(&mut self, partition: &Partition, key: &str) -> Result<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.writes.insert((partition.clone(), key.to_string()), None);
        Ok(())
    }

    fn scan_prefix(&self, partition: &Partition, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut merged: BTreeMap<String, Option<Vec<u8>>> = BTreeMap::new();

        if let Some(tree) = self.snapshot.get(partition) {
            for (key, versioned) in tree.range(prefix.to_string()..) {
                if !key.starts_with(prefix) {
                    break;
                }
                merged.insert(key.clone(), versioned.value.clone());
            }
        }
        for ((p, key), value) in &self.writes {
            if p == partition && key.starts_with(prefix) {
                merged.insert(key.clone(), value.clone());
            }
        }

        Ok(merged
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }

    fn writable(&self) -> bool {
        self.writable
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }

        let mut inner = self.engine.write();

        // First committer wins: reject if any written key moved on since
        // the snapshot was taken.
        for (partition, key) in self.writes.keys() {
            let committed = inner
                .partitions
                .get(partition)
                .and_then(|tree| tree.get(key))
                .map(|v| v.version)
                .unwrap_or(0);
            if committed > self.begin_version {
                return Err(StoreError::Conflict(format!(
                    "write conflict on key '{}'",
                    key
                )));
            }
        }

        inner.version += 1;
        let version = inner.version;
        for ((partition, key), value) in self.writes {
            inner
                .partitions
                .entry(partition)
                .or_default()
                .insert(key, Versioned { version, value });
        }

        Ok(())
    }

    fn cancel(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> Partition {
        Partition::new("acme:crm")
    }

    #[test]
    fn put_get_delete_round_trip() {
        let engine = MemoryKvEngine::new();

        let mut tx = engine.begin(true).unwrap();
        tx.put(&partition(), "person:one", b"{}".to_vec()).unwrap();
        tx.commit().unwrap();

        let tx = engine.begin(false).unwrap();
        assert_eq!(
            tx.get(&partition(), "person:one").unwrap(),
            Some(b"{}".to_vec())
        );
        tx.cancel().unwrap();

        let mut tx = engine.begin(true).unwrap();
        tx.delete(&partition(), "person:one").unwrap();
        tx.commit().unwrap();

        let tx = engine.begin(false).unwrap();
        assert_eq!(tx.get(&partition(), "person:one").unwrap(), None);
    }

    #[test]
    fn read_only_rejects_writes() {
        let engine = MemoryKvEngine::new();
        let mut tx = engine.begin(false).unwrap();
        assert!(matches!(
            tx.put(&partition(), "k", vec![1]),
            Err(StoreError::ReadOnly)
        ));
        assert!(matches!(tx.commit(), Err(StoreError::ReadOnly)));
    }

    #[test]
    fn snapshot_does_not_observe_later_commits() {
        let engine = MemoryKvEngine::new();

        let reader = engine.begin(false).unwrap();

        let mut writer = engine.begin(true).unwrap();
        writer.put(&partition(), "k", vec![1]).unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.get(&partition(), "k").unwrap(), None);
    }

    #[test]
    fn first_committer_wins() {
        let engine = MemoryKvEngine::new();

        let mut a = engine.begin(true).unwrap();
        let mut b = engine.begin(true).unwrap();
        a.put(&partition(), "k", vec![1]).unwrap();
        b.put(&partition(), "k", vec![2]).unwrap();

        a.commit().unwrap();
        assert!(matches!(b.commit(), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn scan_merges_buffered_writes_in_key_order() {
        let engine = MemoryKvEngine::new();

        let mut tx = engine.begin(true).unwrap();
        tx.put(&partition(), "person:b", vec![2]).unwrap();
        tx.commit().unwrap();

        let mut tx = engine.begin(true).unwrap();
        tx.put(&partition(), "person:a", vec![1]).unwrap();
        tx.put(&partition(), "person:c", vec![3]).unwrap();
        tx.delete(&partition(), "person:b").unwrap();

        let rows = tx.scan_prefix(&partition(), "person:").unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["person:a", "person:c"]);
    }

    #[test]
    fn partitions_are_isolated() {
        let engine = MemoryKvEngine::new();
        let other = Partition::new("acme:hr");

        let mut tx = engine.begin(true).unwrap();
        tx.put(&partition(), "person:a", vec![1]).unwrap();
        tx.commit().unwrap();

        let tx = engine.begin(false).unwrap();
        assert_eq!(tx.get(&other, "person:a").unwrap(), None);
        assert!(tx.scan_prefix(&other, "person:").unwrap().is_empty());
    }
}
