//! Transaction handle.
//!
//! Thin wrapper over one KV transaction. After [`commit`](TxnHandle::commit)
//! or [`cancel`](TxnHandle::cancel) the handle is closed and further
//! lifecycle calls are no-ops; data operations on a closed handle fail with
//! [`StoreError::Closed`].

use quilldb_store::{KvEngine, KvTransaction, Partition, StoreError};
use serde_json::Value;

use crate::error::Error;

pub struct TxnHandle {
    tx: Option<Box<dyn KvTransaction>>,
    writable: bool,
}

impl TxnHandle {
    /// Open a new transaction against the engine.
    pub fn begin(engine: &dyn KvEngine, writable: bool) -> Result<Self, Error> {
        let tx = engine.begin(writable)?;
        Ok(Self {
            tx: Some(tx),
            writable,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Commit the transaction. No-op when already closed.
    pub fn commit(&mut self) -> Result<(), Error> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit()?),
            None => Ok(()),
        }
    }

    /// Cancel the transaction, discarding its writes. No-op when already
    /// closed.
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.tx.take() {
            Some(tx) => Ok(tx.cancel()?),
            None => Ok(()),
        }
    }

    fn open(&self) -> Result<&dyn KvTransaction, Error> {
        self.tx.as_deref().ok_or(Error::Kv(StoreError::Closed))
    }

    fn open_mut(&mut self) -> Result<&mut Box<dyn KvTransaction>, Error> {
        self.tx.as_mut().ok_or(Error::Kv(StoreError::Closed))
    }

    /// Fetch and decode one JSON document.
    pub fn get_doc(&self, partition: &Partition, key: &str) -> Result<Option<Value>, Error> {
        match self.open()?.get(partition, key)? {
            Some(bytes) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Db(format!("corrupt record at '{}': {}", key, e)))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Encode and store one JSON document.
    pub fn put_doc(&mut self, partition: &Partition, key: &str, doc: &Value) -> Result<(), Error> {
        let bytes = serde_json::to_vec(doc)
            .map_err(|e| Error::Db(format!("failed to encode record at '{}': {}", key, e)))?;
        self.open_mut()?.put(partition, key, bytes)?;
        Ok(())
    }

    pub fn delete(&mut self, partition: &Partition, key: &str) -> Result<(), Error> {
        self.open_mut()?.delete(partition, key)?;
        Ok(())
    }

    /// Fetch and decode every document under `prefix`, in key order.
    pub fn scan_docs(&self, partition: &Partition, prefix: &str) -> Result<Vec<Value>, Error> {
        self.open()?
            .scan_prefix(partition, prefix)?
            .into_iter()
            .map(|(key, bytes)| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Db(format!("corrupt record at '{}': {}", key, e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilldb_store::MemoryKvEngine;
    use serde_json::json;

    fn partition() -> Partition {
        Partition::new("acme:crm")
    }

    #[test]
    fn closed_handle_is_a_lifecycle_no_op() {
        let engine = MemoryKvEngine::new();
        let mut txn = TxnHandle::begin(&engine, true).unwrap();

        txn.commit().unwrap();
        assert!(txn.is_closed());
        // Further lifecycle calls are no-ops, not errors.
        txn.commit().unwrap();
        txn.cancel().unwrap();
    }

    #[test]
    fn data_operations_on_closed_handle_fail() {
        let engine = MemoryKvEngine::new();
        let mut txn = TxnHandle::begin(&engine, true).unwrap();
        txn.cancel().unwrap();

        let err = txn.get_doc(&partition(), "person:one").unwrap_err();
        assert!(matches!(err, Error::Kv(StoreError::Closed)));
    }

    #[test]
    fn doc_round_trip() {
        let engine = MemoryKvEngine::new();

        let mut txn = TxnHandle::begin(&engine, true).unwrap();
        txn.put_doc(&partition(), "person:one", &json!({"name": "tobie"}))
            .unwrap();
        assert_eq!(
            txn.get_doc(&partition(), "person:one").unwrap(),
            Some(json!({"name": "tobie"}))
        );
        txn.commit().unwrap();

        let txn = TxnHandle::begin(&engine, false).unwrap();
        let docs = txn.scan_docs(&partition(), "person:").unwrap();
        assert_eq!(docs, vec![json!({"name": "tobie"})]);
    }
}
