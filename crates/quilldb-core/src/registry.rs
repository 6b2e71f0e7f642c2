//! Evaluator registry: maps a statement variant to the evaluator that
//! realizes its semantics.
//!
//! The registry is keyed by the statement's enum discriminant, so lookup is
//! O(1) and registering a new statement kind never touches the executor.
//! Registries are built once and shared (`Arc`) across every executor in a
//! pool.

use std::mem::Discriminant;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use quilldb_commons::{DatabaseId, NamespaceId, Options, SessionId};
use quilldb_live::LiveRegistry;
use quilldb_sql::Statement;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::QueryCache;
use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::txn::TxnHandle;

/// The evaluator's view of the executor during one statement.
///
/// Borrows the executor's mutable state for the duration of the call. The
/// transaction handle is always open here; the executor opened an implicit
/// transaction if no explicit one was active.
pub struct Scope<'a> {
    pub session: &'a SessionId,
    pub ns: &'a mut Option<NamespaceId>,
    pub db: &'a mut Option<DatabaseId>,
    pub opts: &'a mut Options,
    pub txn: &'a mut TxnHandle,
    pub cache: &'a mut QueryCache,
    pub live: &'a LiveRegistry,
    /// Serializes recursive sub-queries spawned by evaluators against the
    /// one transaction handle. Replaced on every new transaction.
    pub lock: Arc<Mutex<()>>,
    /// Version stamp for all writes of this statement, in nanoseconds.
    pub stamp: u64,
}

/// Executes the semantics of one statement variant inside a transaction.
#[async_trait]
pub trait StatementEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error>;
}

type EvaluatorKey = Discriminant<Statement>;

/// Registry of statement evaluators.
#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: DashMap<EvaluatorKey, Arc<dyn StatementEvaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `evaluator` for the variant of `placeholder`. A later
    /// registration for the same variant replaces the earlier one.
    pub fn register(&self, placeholder: &Statement, evaluator: Arc<dyn StatementEvaluator>) {
        self.evaluators
            .insert(std::mem::discriminant(placeholder), evaluator);
    }

    pub fn has_evaluator(&self, stm: &Statement) -> bool {
        self.evaluators.contains_key(&std::mem::discriminant(stm))
    }

    /// Dispatch a statement to its registered evaluator.
    pub async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let evaluator = self
            .evaluators
            .get(&std::mem::discriminant(stm))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                Error::Db(format!(
                    "No evaluator registered for statement '{}'",
                    stm.name()
                ))
            })?;
        evaluator.evaluate(ctx, scope, stm).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilldb_sql::meta::InfoStatement;

    struct NoopEvaluator;

    #[async_trait]
    impl StatementEvaluator for NoopEvaluator {
        async fn evaluate(
            &self,
            _ctx: &ExecutionContext,
            _scope: &mut Scope<'_>,
            _stm: &Statement,
        ) -> Result<Vec<Value>, Error> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn registration_is_per_variant() {
        let registry = EvaluatorRegistry::new();
        registry.register(&Statement::Info(InfoStatement), Arc::new(NoopEvaluator));

        assert!(registry.has_evaluator(&Statement::Info(InfoStatement)));
        assert!(!registry.has_evaluator(&Statement::Begin));
    }
}
