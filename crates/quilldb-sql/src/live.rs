//! Live-query statements.

/// `LIVE SELECT * FROM <table>`
///
/// Registers a live-query subscription for the session; the returned
/// live-query id is the handle for `KILL`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStatement {
    pub table: String,
}

/// `KILL <live_query_id>`
#[derive(Debug, Clone, PartialEq)]
pub struct KillStatement {
    pub id: String,
}
