//! The statement enum and its capability surface.

use std::fmt;
use std::time::Duration;

use crate::ddl::{DefineTableStatement, RemoveTableStatement};
use crate::dml::{
    CreateStatement, DeleteStatement, InsertStatement, RelateStatement, SelectStatement,
    UpdateStatement,
};
use crate::live::{KillStatement, LiveStatement};
use crate::meta::{InfoStatement, LetStatement, OptStatement, ReturnStatement, UseStatement};

/// One parsed statement.
///
/// Each variant holds its parsed form; the transaction-control trio are
/// markers handled by the executor itself and never reach an evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    // ===== Transaction control =====
    /// BEGIN [TRANSACTION]
    Begin,
    /// CANCEL [TRANSACTION]
    Cancel,
    /// COMMIT [TRANSACTION]
    Commit,

    // ===== Session / query metadata =====
    /// USE [NS <name>] [DB <name>]
    Use(UseStatement),
    /// OPT <KEY> [TRUE|FALSE]
    Opt(OptStatement),
    /// LET $<name> = <value>
    Let(LetStatement),
    /// RETURN <value>
    Return(ReturnStatement),
    /// INFO
    Info(InfoStatement),

    // ===== Live queries =====
    /// LIVE SELECT * FROM <table>
    Live(LiveStatement),
    /// KILL <live_query_id>
    Kill(KillStatement),

    // ===== Data =====
    /// SELECT * FROM <table>[:<id>]
    Select(SelectStatement),
    /// CREATE <table>[:<id>] CONTENT <data>
    Create(CreateStatement),
    /// UPDATE <table>[:<id>] MERGE <data>
    Update(UpdateStatement),
    /// DELETE <table>[:<id>]
    Delete(DeleteStatement),
    /// INSERT INTO <table> <values>
    Insert(InsertStatement),
    /// RELATE <from> -> <edge> -> <to>
    Relate(RelateStatement),

    // ===== Schema =====
    /// DEFINE TABLE <name>
    DefineTable(DefineTableStatement),
    /// REMOVE TABLE <name>
    RemoveTable(RemoveTableStatement),
}

impl Statement {
    /// Short statement name for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Statement::Begin => "BEGIN",
            Statement::Cancel => "CANCEL",
            Statement::Commit => "COMMIT",
            Statement::Use(_) => "USE",
            Statement::Opt(_) => "OPT",
            Statement::Let(_) => "LET",
            Statement::Return(_) => "RETURN",
            Statement::Info(_) => "INFO",
            Statement::Live(_) => "LIVE",
            Statement::Kill(_) => "KILL",
            Statement::Select(_) => "SELECT",
            Statement::Create(_) => "CREATE",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::Insert(_) => "INSERT",
            Statement::Relate(_) => "RELATE",
            Statement::DefineTable(_) => "DEFINE TABLE",
            Statement::RemoveTable(_) => "REMOVE TABLE",
        }
    }

    /// Whether this statement may modify state. The executor asks this to
    /// decide between a read and a write transaction in implicit mode.
    pub fn writeable(&self) -> bool {
        matches!(
            self,
            Statement::Let(_)
                | Statement::Create(_)
                | Statement::Update(_)
                | Statement::Delete(_)
                | Statement::Insert(_)
                | Statement::Relate(_)
                | Statement::DefineTable(_)
                | Statement::RemoveTable(_)
        )
    }

    /// The statement's maximum execution duration, if it declares one.
    /// `None` means unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Statement::Select(s) => s.timeout,
            Statement::Create(s) => s.timeout,
            Statement::Update(s) => s.timeout,
            Statement::Delete(s) => s.timeout,
            Statement::Insert(s) => s.timeout,
            Statement::Relate(s) => s.timeout,
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Use(s) => write!(
                f,
                "USE NS {} DB {}",
                s.ns.as_deref().unwrap_or("-"),
                s.db.as_deref().unwrap_or("-")
            ),
            Statement::Opt(s) => write!(f, "OPT {} {}", s.key.to_ascii_uppercase(), s.what),
            Statement::Let(s) => write!(f, "LET ${}", s.name),
            Statement::Live(s) => write!(f, "LIVE SELECT * FROM {}", s.table),
            Statement::Kill(s) => write!(f, "KILL {}", s.id),
            Statement::Select(s) => write!(f, "SELECT * FROM {}", target(&s.table, &s.id)),
            Statement::Create(s) => write!(f, "CREATE {}", target(&s.table, &s.id)),
            Statement::Update(s) => write!(f, "UPDATE {}", target(&s.table, &s.id)),
            Statement::Delete(s) => write!(f, "DELETE {}", target(&s.table, &s.id)),
            Statement::Insert(s) => write!(f, "INSERT INTO {}", s.table),
            Statement::Relate(s) => {
                write!(f, "RELATE {} -> {} -> {}", s.from, s.edge_table, s.to)
            }
            Statement::DefineTable(s) => write!(f, "DEFINE TABLE {}", s.name),
            Statement::RemoveTable(s) => write!(f, "REMOVE TABLE {}", s.name),
            other => write!(f, "{}", other.name()),
        }
    }
}

fn target(table: &str, id: &Option<String>) -> String {
    match id {
        Some(id) => format!("{}:{}", table, id),
        None => table.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_is_not_writeable() {
        let stm = Statement::Select(SelectStatement {
            table: "person".into(),
            id: None,
            timeout: None,
        });
        assert!(!stm.writeable());
    }

    #[test]
    fn mutations_are_writeable() {
        let stm = Statement::Create(CreateStatement {
            table: "person".into(),
            id: None,
            data: json!({}),
            timeout: None,
        });
        assert!(stm.writeable());
        assert!(Statement::RemoveTable(RemoveTableStatement { name: "person".into() }).writeable());
    }

    #[test]
    fn transaction_control_is_unbounded() {
        assert_eq!(Statement::Begin.timeout(), None);
        assert!(!Statement::Begin.writeable());
    }

    #[test]
    fn timeout_surfaces_from_data_statements() {
        let stm = Statement::Select(SelectStatement {
            table: "person".into(),
            id: None,
            timeout: Some(Duration::from_millis(10)),
        });
        assert_eq!(stm.timeout(), Some(Duration::from_millis(10)));
    }
}
