//! Session and query metadata statements.

use serde_json::Value;

/// `USE [NS <name>] [DB <name>]`
///
/// Switches the namespace and/or database selector for the remainder of
/// the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UseStatement {
    pub ns: Option<String>,
    pub db: Option<String>,
}

/// `OPT <KEY> [TRUE|FALSE]`
///
/// Sets a per-query executor option. Recognized keys are enumerated on
/// `quilldb_commons::Options`; unknown keys are an error.
#[derive(Debug, Clone, PartialEq)]
pub struct OptStatement {
    pub key: String,
    pub what: bool,
}

/// `LET $<name> = <value>`
///
/// Binds a value into the query's parameter scope.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub name: String,
    pub what: Value,
}

/// `RETURN <value>`
///
/// Echoes a value. Inside an explicit transaction the returned value
/// replaces all previously buffered statement results.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub what: Value,
}

/// `INFO`
///
/// Reports the current namespace/database selection and option state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoStatement;
