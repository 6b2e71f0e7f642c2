//! Schema statements.

/// `DEFINE TABLE <name> [DROP] [SCHEMAFULL]`
#[derive(Debug, Clone, PartialEq)]
pub struct DefineTableStatement {
    pub name: String,
    /// Writes are rejected on a DROP table (ingest-only sink).
    pub drop: bool,
    /// STRICT tables reject records for undefined tables unless the
    /// `force` option is set.
    pub schemafull: bool,
}

/// `REMOVE TABLE <name>`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveTableStatement {
    pub name: String,
}
