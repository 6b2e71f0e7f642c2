//! Per-statement response record.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Status};

/// The result of one executed statement.
///
/// Immutable once emitted, with one exception: when an explicit
/// transaction is cancelled or fails to commit, the executor rewrites the
/// status, detail and result of every buffered response before emitting
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Elapsed wall-clock time for the statement, e.g. `"1.2ms"`.
    pub time: String,
    pub status: Status,
    /// Human-readable error detail; empty on success.
    pub detail: String,
    pub result: Vec<Value>,
}

impl Response {
    /// Build the response for a finished statement.
    pub fn new(elapsed: Duration, outcome: Result<Vec<Value>, Error>) -> Self {
        match outcome {
            Ok(result) => Self {
                time: format!("{:?}", elapsed),
                status: Status::Ok,
                detail: String::new(),
                result,
            },
            Err(err) => Self {
                time: format!("{:?}", elapsed),
                status: Status::from(&err),
                detail: err.to_string(),
                result: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_carries_rows_and_ok_status() {
        let rsp = Response::new(Duration::from_millis(3), Ok(vec![json!({"a": 1})]));
        assert_eq!(rsp.status, Status::Ok);
        assert_eq!(rsp.detail, "");
        assert_eq!(rsp.result, vec![json!({"a": 1})]);
    }

    #[test]
    fn failure_maps_status_and_detail() {
        let rsp = Response::new(Duration::ZERO, Err(Error::Field("age must be a number".into())));
        assert_eq!(rsp.status, Status::ErrFd);
        assert!(rsp.detail.contains("age must be a number"));
        assert!(rsp.result.is_empty());
    }

    #[test]
    fn time_is_a_parseable_duration_string() {
        let rsp = Response::new(Duration::from_micros(1500), Ok(vec![]));
        assert_eq!(rsp.time, "1.5ms");
    }
}
