//! Session and query metadata evaluators: `USE`, `OPT`, `INFO`.

use async_trait::async_trait;
use quilldb_commons::{DatabaseId, NamespaceId};
use quilldb_sql::Statement;
use quilldb_store::key_encoding;
use serde_json::{json, Value};

use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

pub struct UseEvaluator;

#[async_trait]
impl StatementEvaluator for UseEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Use(stm) = stm else {
            return Err(Error::Db("USE evaluator invoked with mismatched statement".to_string()));
        };
        if let Some(ns) = &stm.ns {
            *scope.ns = Some(NamespaceId::new(ns));
        }
        if let Some(db) = &stm.db {
            *scope.db = Some(DatabaseId::new(db));
        }
        Ok(Vec::new())
    }
}

pub struct OptEvaluator;

#[async_trait]
impl StatementEvaluator for OptEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Opt(stm) = stm else {
            return Err(Error::Db("OPT evaluator invoked with mismatched statement".to_string()));
        };
        if !scope.opts.set(&stm.key, stm.what) {
            return Err(Error::Other(format!("Unknown option '{}'", stm.key)));
        }
        Ok(Vec::new())
    }
}

/// Reports the session's tenant selection, option state, and the tables
/// defined in the selected database.
pub struct InfoEvaluator;

#[async_trait]
impl StatementEvaluator for InfoEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Info(_) = stm else {
            return Err(Error::Db("INFO evaluator invoked with mismatched statement".to_string()));
        };

        let tables = match (scope.ns.as_ref(), scope.db.as_ref()) {
            (Some(_), Some(_)) => {
                let partition = super::tenant(scope)?;
                scope
                    .txn
                    .scan_docs(&partition, key_encoding::table_definition_prefix())?
            }
            _ => Vec::new(),
        };

        Ok(vec![json!({
            "ns": scope.ns.as_ref().map(|n| n.as_str()),
            "db": scope.db.as_ref().map(|d| d.as_str()),
            "options": serde_json::to_value(&*scope.opts)
                .map_err(|e| Error::Db(format!("failed to encode options: {}", e)))?,
            "tables": tables,
        })])
    }
}
