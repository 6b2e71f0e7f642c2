//! Parameter binding evaluators: `LET` and `RETURN`.

use async_trait::async_trait;
use quilldb_sql::Statement;
use serde_json::Value;

use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

pub struct LetEvaluator;

#[async_trait]
impl StatementEvaluator for LetEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        _scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Let(stm) = stm else {
            return Err(Error::Db("LET evaluator invoked with mismatched statement".to_string()));
        };
        let value = super::resolve(ctx, &stm.what);
        ctx.set_var(stm.name.clone(), value);
        Ok(Vec::new())
    }
}

pub struct ReturnEvaluator;

#[async_trait]
impl StatementEvaluator for ReturnEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        _scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Return(stm) = stm else {
            return Err(Error::Db("RETURN evaluator invoked with mismatched statement".to_string()));
        };
        Ok(vec![super::resolve(ctx, &stm.what)])
    }
}
