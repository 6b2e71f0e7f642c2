//! Error taxonomy for query execution and its mapping to wire statuses.

use std::time::Duration;

use quilldb_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while executing a statement.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Internal invariant violated.
    #[error("Database error: {0}")]
    Db(String),

    /// KV engine failure (begin/commit conflict, I/O).
    #[error(transparent)]
    Kv(#[from] StoreError),

    /// Permission check failure.
    #[error("Permission denied: {0}")]
    Perms(String),

    /// Existence conflict: duplicate record, or a required record missing.
    #[error("{0}")]
    Exist(String),

    /// Field type or assertion failure.
    #[error("Field validation failed: {0}")]
    Field(String),

    /// Index uniqueness violation.
    #[error("Index violation: {0}")]
    Index(String),

    /// The statement exceeded its declared maximum duration.
    #[error("Query timeout of {timeout:?} exceeded")]
    Timer { timeout: Duration },

    /// The statement was skipped because an earlier statement of the same
    /// transaction failed.
    #[error("Query not executed.")]
    QueryNotExecuted,

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Wire status of one statement response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERR_DB")]
    ErrDb,
    #[serde(rename = "ERR_KV")]
    ErrKv,
    #[serde(rename = "ERR_PE")]
    ErrPe,
    #[serde(rename = "ERR_EX")]
    ErrEx,
    #[serde(rename = "ERR_FD")]
    ErrFd,
    #[serde(rename = "ERR_IX")]
    ErrIx,
    #[serde(rename = "ERR_TO")]
    ErrTo,
    #[serde(rename = "ERR")]
    Err,
}

impl Status {
    pub fn is_err(self) -> bool {
        self != Status::Ok
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::ErrDb => "ERR_DB",
            Status::ErrKv => "ERR_KV",
            Status::ErrPe => "ERR_PE",
            Status::ErrEx => "ERR_EX",
            Status::ErrFd => "ERR_FD",
            Status::ErrIx => "ERR_IX",
            Status::ErrTo => "ERR_TO",
            Status::Err => "ERR",
        };
        write!(f, "{}", s)
    }
}

impl From<&Error> for Status {
    fn from(e: &Error) -> Self {
        match e {
            Error::Db(_) => Status::ErrDb,
            Error::Kv(_) => Status::ErrKv,
            Error::Perms(_) => Status::ErrPe,
            Error::Exist(_) => Status::ErrEx,
            Error::Field(_) => Status::ErrFd,
            Error::Index(_) => Status::ErrIx,
            Error::Timer { .. } => Status::ErrTo,
            Error::QueryNotExecuted | Error::Other(_) => Status::Err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_error_kind() {
        assert_eq!(Status::from(&Error::Db("x".into())), Status::ErrDb);
        assert_eq!(
            Status::from(&Error::Kv(StoreError::Conflict("k".into()))),
            Status::ErrKv
        );
        assert_eq!(Status::from(&Error::Perms("x".into())), Status::ErrPe);
        assert_eq!(Status::from(&Error::Exist("x".into())), Status::ErrEx);
        assert_eq!(Status::from(&Error::Field("x".into())), Status::ErrFd);
        assert_eq!(Status::from(&Error::Index("x".into())), Status::ErrIx);
        assert_eq!(
            Status::from(&Error::Timer { timeout: Duration::from_millis(10) }),
            Status::ErrTo
        );
        assert_eq!(Status::from(&Error::QueryNotExecuted), Status::Err);
        assert_eq!(Status::from(&Error::Other("x".into())), Status::Err);
    }

    #[test]
    fn status_serializes_to_wire_strings() {
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&Status::ErrTo).unwrap(), "\"ERR_TO\"");
        assert_eq!(serde_json::to_string(&Status::Err).unwrap(), "\"ERR\"");
    }

    #[test]
    fn skipped_statement_detail() {
        assert_eq!(Error::QueryNotExecuted.to_string(), "Query not executed.");
    }
}
