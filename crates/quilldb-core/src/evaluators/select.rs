//! The `SELECT` evaluator.

use async_trait::async_trait;
use quilldb_sql::Statement;
use quilldb_store::key_encoding;
use serde_json::Value;

use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

pub struct SelectEvaluator;

#[async_trait]
impl StatementEvaluator for SelectEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Select(stm) = stm else {
            return Err(Error::Db("SELECT evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;
        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        if ctx.is_done() {
            return Ok(Vec::new());
        }

        match &stm.id {
            Some(id) => {
                let key = key_encoding::record_key(&stm.table, id);
                Ok(scope
                    .txn
                    .get_doc(&partition, &key)?
                    .map(|doc| vec![doc])
                    .unwrap_or_default())
            }
            None => {
                let prefix = key_encoding::table_prefix(&stm.table);
                scope.txn.scan_docs(&partition, &prefix)
            }
        }
    }
}
