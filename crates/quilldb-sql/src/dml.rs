//! Data statements: document CRUD and graph edges.
//!
//! Each statement targets one table (optionally one record) and may carry
//! a `TIMEOUT` clause bounding its wall-clock execution.

use std::time::Duration;

use serde_json::Value;

use crate::record::RecordId;

/// `SELECT * FROM <table>[:<id>] [TIMEOUT <duration>]`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub id: Option<String>,
    pub timeout: Option<Duration>,
}

/// `CREATE <table>[:<id>] CONTENT <data> [TIMEOUT <duration>]`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateStatement {
    pub table: String,
    pub id: Option<String>,
    pub data: Value,
    pub timeout: Option<Duration>,
}

/// `UPDATE <table>[:<id>] MERGE <data> [TIMEOUT <duration>]`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub id: Option<String>,
    pub data: Value,
    pub timeout: Option<Duration>,
}

/// `DELETE <table>[:<id>] [TIMEOUT <duration>]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub id: Option<String>,
    pub timeout: Option<Duration>,
}

/// `INSERT INTO <table> <values> [TIMEOUT <duration>]`
///
/// Bulk form of `CREATE`: each value becomes one new record.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub values: Vec<Value>,
    pub timeout: Option<Duration>,
}

/// `RELATE <from> -> <edge_table> -> <to> [CONTENT <data>] [TIMEOUT <duration>]`
///
/// Creates an edge record in `edge_table` linking two records.
#[derive(Debug, Clone, PartialEq)]
pub struct RelateStatement {
    pub edge_table: String,
    pub from: RecordId,
    pub to: RecordId,
    pub data: Value,
    pub timeout: Option<Duration>,
}
