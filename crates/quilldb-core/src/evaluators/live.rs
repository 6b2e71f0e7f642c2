//! Live-query evaluators: `LIVE` and `KILL`.

use async_trait::async_trait;
use quilldb_commons::LiveQueryId;
use quilldb_sql::Statement;
use serde_json::Value;

use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

pub struct LiveEvaluator;

#[async_trait]
impl StatementEvaluator for LiveEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Live(stm) = stm else {
            return Err(Error::Db("LIVE evaluator invoked with mismatched statement".to_string()));
        };
        // The protocol layer claims the notification stream by this id.
        let id = scope.live.register(scope.session, &stm.table);
        Ok(vec![Value::String(id.to_string())])
    }
}

pub struct KillEvaluator;

#[async_trait]
impl StatementEvaluator for KillEvaluator {
    async fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Kill(stm) = stm else {
            return Err(Error::Db("KILL evaluator invoked with mismatched statement".to_string()));
        };
        let id = LiveQueryId::from(stm.id.as_str());
        if !scope.live.kill(&id) {
            return Err(Error::Exist(format!(
                "Live query '{}' does not exist",
                stm.id
            )));
        }
        Ok(Vec::new())
    }
}
