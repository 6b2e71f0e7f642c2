//! Built-in statement evaluators.
//!
//! One small struct per statement concern, registered into the
//! [`EvaluatorRegistry`] by [`default_registry`]. Evaluators only see the
//! executor through a [`Scope`], so they are easy to replace or mock.

mod live;
mod meta;
mod mutate;
mod select;
mod table;
mod vars;

pub use live::{KillEvaluator, LiveEvaluator};
pub use meta::{InfoEvaluator, OptEvaluator, UseEvaluator};
pub use mutate::{
    CreateEvaluator, DeleteEvaluator, InsertEvaluator, RelateEvaluator, UpdateEvaluator,
};
pub use select::SelectEvaluator;
pub use table::{DefineTableEvaluator, RemoveTableEvaluator};
pub use vars::{LetEvaluator, ReturnEvaluator};

use std::sync::Arc;

use quilldb_commons::Options;
use quilldb_sql::ddl::{DefineTableStatement, RemoveTableStatement};
use quilldb_sql::dml::{
    CreateStatement, DeleteStatement, InsertStatement, RelateStatement, SelectStatement,
    UpdateStatement,
};
use quilldb_sql::live::{KillStatement, LiveStatement};
use quilldb_sql::meta::{InfoStatement, LetStatement, OptStatement, ReturnStatement, UseStatement};
use quilldb_sql::{RecordId, Statement};
use quilldb_store::{key_encoding, Partition};
use serde_json::Value;

use crate::cache::CacheKind;
use crate::ctx::ExecutionContext;
use crate::error::Error;
use crate::registry::{EvaluatorRegistry, Scope};

/// Build a registry with every built-in evaluator registered.
pub fn default_registry() -> Arc<EvaluatorRegistry> {
    let registry = EvaluatorRegistry::new();

    registry.register(
        &Statement::Use(UseStatement::default()),
        Arc::new(UseEvaluator),
    );
    registry.register(
        &Statement::Opt(OptStatement { key: String::new(), what: false }),
        Arc::new(OptEvaluator),
    );
    registry.register(
        &Statement::Let(LetStatement { name: String::new(), what: Value::Null }),
        Arc::new(LetEvaluator),
    );
    registry.register(
        &Statement::Return(ReturnStatement { what: Value::Null }),
        Arc::new(ReturnEvaluator),
    );
    registry.register(&Statement::Info(InfoStatement), Arc::new(InfoEvaluator));
    registry.register(
        &Statement::Live(LiveStatement { table: String::new() }),
        Arc::new(LiveEvaluator),
    );
    registry.register(
        &Statement::Kill(KillStatement { id: String::new() }),
        Arc::new(KillEvaluator),
    );
    registry.register(
        &Statement::Select(SelectStatement { table: String::new(), id: None, timeout: None }),
        Arc::new(SelectEvaluator),
    );
    registry.register(
        &Statement::Create(CreateStatement {
            table: String::new(),
            id: None,
            data: Value::Null,
            timeout: None,
        }),
        Arc::new(CreateEvaluator),
    );
    registry.register(
        &Statement::Update(UpdateStatement {
            table: String::new(),
            id: None,
            data: Value::Null,
            timeout: None,
        }),
        Arc::new(UpdateEvaluator),
    );
    registry.register(
        &Statement::Delete(DeleteStatement { table: String::new(), id: None, timeout: None }),
        Arc::new(DeleteEvaluator),
    );
    registry.register(
        &Statement::Insert(InsertStatement {
            table: String::new(),
            values: Vec::new(),
            timeout: None,
        }),
        Arc::new(InsertEvaluator),
    );
    registry.register(
        &Statement::Relate(RelateStatement {
            edge_table: String::new(),
            from: RecordId::new("", ""),
            to: RecordId::new("", ""),
            data: Value::Null,
            timeout: None,
        }),
        Arc::new(RelateEvaluator),
    );
    registry.register(
        &Statement::DefineTable(DefineTableStatement {
            name: String::new(),
            drop: false,
            schemafull: false,
        }),
        Arc::new(DefineTableEvaluator),
    );
    registry.register(
        &Statement::RemoveTable(RemoveTableStatement { name: String::new() }),
        Arc::new(RemoveTableEvaluator),
    );

    Arc::new(registry)
}

/// The storage partition for the current tenant selection.
fn tenant(scope: &Scope<'_>) -> Result<Partition, Error> {
    match (scope.ns.as_ref(), scope.db.as_ref()) {
        (Some(ns), Some(db)) => Ok(key_encoding::tenant_partition(ns.as_str(), db.as_str())),
        _ => Err(Error::Db(
            "no namespace or database selected; run USE first".to_string(),
        )),
    }
}

/// Resolve a `$name` parameter reference against the context bindings.
/// Non-reference values pass through unchanged; unbound references resolve
/// to null.
fn resolve(ctx: &ExecutionContext, value: &Value) -> Value {
    if let Value::String(s) = value {
        if let Some(name) = s.strip_prefix('$') {
            return ctx.var(name).unwrap_or(Value::Null);
        }
    }
    value.clone()
}

/// Require an object payload (null counts as the empty record) and apply
/// field validation.
///
/// Structural shape is always enforced; per-field checks are skipped when
/// the `fields` option is disabled.
fn content_object(
    data: &Value,
    opts: &Options,
) -> Result<serde_json::Map<String, Value>, Error> {
    let object = match data {
        Value::Null => serde_json::Map::new(),
        Value::Object(object) => object.clone(),
        other => {
            return Err(Error::Field(format!(
                "record content must be an object, got {}",
                type_name(other)
            )))
        }
    };
    if !opts.fields {
        return Ok(object);
    }
    for key in object.keys() {
        if key.is_empty() {
            return Err(Error::Field("field names must not be empty".to_string()));
        }
        if key.starts_with('!') {
            return Err(Error::Field(format!(
                "field name '{}' uses a reserved prefix",
                key
            )));
        }
    }
    Ok(object)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Look up a table definition, memoized through the per-query cache.
fn table_definition(
    scope: &mut Scope<'_>,
    partition: &Partition,
    table: &str,
) -> Result<Option<Value>, Error> {
    if let Some(cached) = scope.cache.get(CacheKind::Table, table) {
        return Ok(cached);
    }
    let def = scope
        .txn
        .get_doc(partition, &key_encoding::table_definition_key(table))?;
    scope.cache.set(CacheKind::Table, table, def.clone());
    Ok(def)
}

/// Whether change notifications should be recorded for this query.
fn notifications_enabled(opts: &Options) -> bool {
    !opts.import && opts.events
}
