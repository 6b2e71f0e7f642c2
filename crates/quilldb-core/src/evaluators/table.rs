//! Schema evaluators: `DEFINE TABLE` and `REMOVE TABLE`.
//!
//! Definitions are stored as JSON entities under the `!tb:` prefix and
//! memoized through the per-query cache.

use async_trait::async_trait;
use quilldb_sql::Statement;
use quilldb_store::key_encoding;
use serde_json::{json, Value};

use crate::cache::CacheKind;
use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

pub struct DefineTableEvaluator;

#[async_trait]
impl StatementEvaluator for DefineTableEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::DefineTable(stm) = stm else {
            return Err(Error::Db(
                "DEFINE TABLE evaluator invoked with mismatched statement".to_string(),
            ));
        };
        let partition = super::tenant(scope)?;

        let def = json!({
            "name": stm.name.clone(),
            "drop": stm.drop,
            "schemafull": stm.schemafull,
        });
        let key = key_encoding::table_definition_key(&stm.name);
        scope.txn.put_doc(&partition, &key, &def)?;
        scope.cache.set(CacheKind::Table, &stm.name, Some(def));

        Ok(Vec::new())
    }
}

pub struct RemoveTableEvaluator;

#[async_trait]
impl StatementEvaluator for RemoveTableEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::RemoveTable(stm) = stm else {
            return Err(Error::Db(
                "REMOVE TABLE evaluator invoked with mismatched statement".to_string(),
            ));
        };
        let partition = super::tenant(scope)?;

        if super::table_definition(scope, &partition, &stm.name)?.is_none() {
            return Err(Error::Exist(format!("Table '{}' does not exist", stm.name)));
        }

        let key = key_encoding::table_definition_key(&stm.name);
        scope.txn.delete(&partition, &key)?;
        scope.cache.set(CacheKind::Table, &stm.name, None);

        Ok(Vec::new())
    }
}
