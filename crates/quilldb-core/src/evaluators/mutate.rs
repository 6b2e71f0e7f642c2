//! Mutation evaluators: `CREATE`, `UPDATE`, `DELETE`, `INSERT`, `RELATE`.
//!
//! Every write defers a change notification under the session id; the
//! executor publishes them when the surrounding transaction commits and
//! discards them when it rolls back. Read-modify-write sequences hold the
//! scope lock so recursive sub-queries cannot interleave on the same
//! transaction handle.

use async_trait::async_trait;
use quilldb_live::{Action, DeferredChange};
use quilldb_sql::Statement;
use quilldb_store::key_encoding;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{Scope, StatementEvaluator};

/// Pick the record id: the statement's id wins, then an `id` field in the
/// content (with or without the `table:` prefix), then a random one.
fn choose_id(given: &Option<String>, content: &Map<String, Value>) -> String {
    if let Some(id) = given {
        return id.clone();
    }
    if let Some(Value::String(id)) = content.get("id") {
        return match id.split_once(':') {
            Some((_, bare)) => bare.to_string(),
            None => id.clone(),
        };
    }
    Uuid::new_v4().simple().to_string()
}

/// Assemble the stored document: the content plus its canonical `id`.
fn build_doc(table: &str, id: &str, mut content: Map<String, Value>) -> Value {
    content.insert(
        "id".to_string(),
        Value::String(key_encoding::record_key(table, id)),
    );
    Value::Object(content)
}

/// The storage key of a fetched document; the `id` field is the key.
fn doc_key(doc: &Value) -> Result<String, Error> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Db("stored record is missing its id field".to_string()))
}

fn defer_change(scope: &mut Scope<'_>, table: &str, action: Action, result: Value) {
    if super::notifications_enabled(scope.opts) {
        scope.live.defer(
            scope.session,
            DeferredChange {
                table: table.to_string(),
                action,
                result,
            },
        );
    }
}

fn merge(doc: &mut Value, content: &Map<String, Value>) -> Result<(), Error> {
    let object = doc
        .as_object_mut()
        .ok_or_else(|| Error::Db("stored record is not an object".to_string()))?;
    for (key, value) in content {
        if key == "id" {
            continue;
        }
        object.insert(key.clone(), value.clone());
    }
    Ok(())
}

pub struct CreateEvaluator;

#[async_trait]
impl StatementEvaluator for CreateEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Create(stm) = stm else {
            return Err(Error::Db("CREATE evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;
        let content = super::content_object(&super::resolve(ctx, &stm.data), scope.opts)?;

        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        let id = choose_id(&stm.id, &content);
        let key = key_encoding::record_key(&stm.table, &id);
        if scope.txn.get_doc(&partition, &key)?.is_some() {
            return Err(Error::Exist(format!(
                "Database record '{}' already exists",
                key
            )));
        }

        let doc = build_doc(&stm.table, &id, content);
        scope.txn.put_doc(&partition, &key, &doc)?;
        defer_change(scope, &stm.table, Action::Create, doc.clone());

        Ok(vec![doc])
    }
}

pub struct UpdateEvaluator;

#[async_trait]
impl StatementEvaluator for UpdateEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Update(stm) = stm else {
            return Err(Error::Db("UPDATE evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;
        let content = super::content_object(&super::resolve(ctx, &stm.data), scope.opts)?;

        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        match &stm.id {
            Some(id) => {
                let key = key_encoding::record_key(&stm.table, id);
                let Some(mut doc) = scope.txn.get_doc(&partition, &key)? else {
                    return Err(Error::Exist(format!(
                        "Database record '{}' does not exist",
                        key
                    )));
                };
                merge(&mut doc, &content)?;
                scope.txn.put_doc(&partition, &key, &doc)?;
                defer_change(scope, &stm.table, Action::Update, doc.clone());
                Ok(vec![doc])
            }
            None => {
                let prefix = key_encoding::table_prefix(&stm.table);
                let mut out = Vec::new();
                for mut doc in scope.txn.scan_docs(&partition, &prefix)? {
                    if ctx.is_done() {
                        break;
                    }
                    merge(&mut doc, &content)?;
                    let key = doc_key(&doc)?;
                    scope.txn.put_doc(&partition, &key, &doc)?;
                    defer_change(scope, &stm.table, Action::Update, doc.clone());
                    out.push(doc);
                }
                Ok(out)
            }
        }
    }
}

pub struct DeleteEvaluator;

#[async_trait]
impl StatementEvaluator for DeleteEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Delete(stm) = stm else {
            return Err(Error::Db("DELETE evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;

        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        match &stm.id {
            Some(id) => {
                let key = key_encoding::record_key(&stm.table, id);
                if let Some(doc) = scope.txn.get_doc(&partition, &key)? {
                    scope.txn.delete(&partition, &key)?;
                    defer_change(scope, &stm.table, Action::Delete, doc);
                }
                Ok(Vec::new())
            }
            None => {
                let prefix = key_encoding::table_prefix(&stm.table);
                for doc in scope.txn.scan_docs(&partition, &prefix)? {
                    if ctx.is_done() {
                        break;
                    }
                    let key = doc_key(&doc)?;
                    scope.txn.delete(&partition, &key)?;
                    defer_change(scope, &stm.table, Action::Delete, doc);
                }
                Ok(Vec::new())
            }
        }
    }
}

pub struct InsertEvaluator;

#[async_trait]
impl StatementEvaluator for InsertEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Insert(stm) = stm else {
            return Err(Error::Db("INSERT evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;

        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        let mut out = Vec::new();
        for value in &stm.values {
            if ctx.is_done() {
                break;
            }
            let content = super::content_object(&super::resolve(ctx, value), scope.opts)?;
            let id = choose_id(&None, &content);
            let key = key_encoding::record_key(&stm.table, &id);
            if scope.txn.get_doc(&partition, &key)?.is_some() {
                return Err(Error::Exist(format!(
                    "Database record '{}' already exists",
                    key
                )));
            }
            let doc = build_doc(&stm.table, &id, content);
            scope.txn.put_doc(&partition, &key, &doc)?;
            defer_change(scope, &stm.table, Action::Create, doc.clone());
            out.push(doc);
        }
        Ok(out)
    }
}

pub struct RelateEvaluator;

#[async_trait]
impl StatementEvaluator for RelateEvaluator {
    async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        scope: &mut Scope<'_>,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let Statement::Relate(stm) = stm else {
            return Err(Error::Db("RELATE evaluator invoked with mismatched statement".to_string()));
        };
        let partition = super::tenant(scope)?;
        let content = super::content_object(&super::resolve(ctx, &stm.data), scope.opts)?;

        let lock = scope.lock.clone();
        let _guard = lock.lock().await;

        // Both endpoints must exist before an edge can join them.
        for endpoint in [&stm.from, &stm.to] {
            let key = key_encoding::record_key(&endpoint.table, &endpoint.id);
            if scope.txn.get_doc(&partition, &key)?.is_none() {
                return Err(Error::Exist(format!(
                    "Database record '{}' does not exist",
                    endpoint
                )));
            }
        }

        let id = choose_id(&None, &content);
        let key = key_encoding::record_key(&stm.edge_table, &id);
        if scope.txn.get_doc(&partition, &key)?.is_some() {
            return Err(Error::Exist(format!(
                "Database record '{}' already exists",
                key
            )));
        }

        let mut doc = build_doc(&stm.edge_table, &id, content);
        if let Some(object) = doc.as_object_mut() {
            object.insert("in".to_string(), Value::String(stm.from.to_string()));
            object.insert("out".to_string(), Value::String(stm.to.to_string()));
        }
        scope.txn.put_doc(&partition, &key, &doc)?;
        defer_change(scope, &stm.edge_table, Action::Create, doc.clone());

        Ok(vec![doc])
    }
}
