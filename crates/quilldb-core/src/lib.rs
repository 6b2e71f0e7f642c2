//! Query executor core for QuillDB.
//!
//! The executor consumes a parsed [`Query`](quilldb_sql::Query) and drives
//! it to completion against a transactional key-value store, streaming one
//! [`Response`] per statement back to the caller. It owns transaction
//! lifecycle (implicit single-statement transactions and explicit
//! `BEGIN`/`COMMIT`/`CANCEL` brackets), response buffering inside explicit
//! transactions, cooperative cancellation, per-statement timeouts, panic
//! containment and executor pooling.
//!
//! Statement semantics live behind the [`StatementEvaluator`] registry;
//! [`evaluators::default_registry`] wires up the built-in document
//! evaluators.

pub mod cache;
pub mod ctx;
pub mod error;
pub mod evaluators;
pub mod executor;
pub mod pool;
pub mod registry;
pub mod response;
pub mod txn;

pub use cache::{CacheKind, QueryCache};
pub use ctx::{CancellationToken, ExecutionContext, InvocationKind};
pub use error::{Error, Status};
pub use executor::Executor;
pub use pool::ExecutorPool;
pub use registry::{EvaluatorRegistry, Scope, StatementEvaluator};
pub use response::Response;
pub use txn::TxnHandle;
