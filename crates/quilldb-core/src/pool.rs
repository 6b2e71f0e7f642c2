//! Executor pool.
//!
//! Executors are recycled across queries to amortize allocation. The pool
//! is a bounded free list: acquire pops an idle executor (or allocates a
//! fresh one) and zeroes its transient state; release pushes it back,
//! dropping it once the pool is full. Semantically equivalent to a fresh
//! executor per query.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use quilldb_commons::{DatabaseId, ExecutorConfig, NamespaceId, SessionId};
use quilldb_live::LiveRegistry;
use quilldb_sql::Query;
use quilldb_store::KvEngine;
use tokio::sync::mpsc;

use crate::ctx::ExecutionContext;
use crate::executor::Executor;
use crate::registry::EvaluatorRegistry;
use crate::response::Response;

pub struct ExecutorPool {
    idle: Mutex<Vec<Executor>>,
    engine: Arc<dyn KvEngine>,
    live: Arc<LiveRegistry>,
    registry: Arc<EvaluatorRegistry>,
    channel_capacity: usize,
    pool_capacity: usize,
    default_timeout: Option<Duration>,
}

impl ExecutorPool {
    pub fn new(
        engine: Arc<dyn KvEngine>,
        live: Arc<LiveRegistry>,
        registry: Arc<EvaluatorRegistry>,
        config: &ExecutorConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            idle: Mutex::new(Vec::new()),
            engine,
            live,
            registry,
            channel_capacity: config.channel_capacity,
            pool_capacity: config.pool_capacity,
            default_timeout: config.default_timeout(),
        })
    }

    /// The live-query registry shared by every executor of this pool.
    pub fn live(&self) -> &Arc<LiveRegistry> {
        &self.live
    }

    /// Run a query for `session` against the `(ns, db)` tenant selection.
    ///
    /// Returns immediately with the response stream; execution proceeds on
    /// a spawned task. The caller must drain the stream or cancel `ctx`.
    /// The stream closes after the last response.
    pub fn execute(
        self: &Arc<Self>,
        ctx: ExecutionContext,
        session: SessionId,
        ns: Option<NamespaceId>,
        db: Option<DatabaseId>,
        query: Query,
    ) -> mpsc::Receiver<Response> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let mut executor = self.acquire(session, ns, db);
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            executor.execute(&ctx, &query, tx).await;
            pool.release(executor);
        });

        rx
    }

    fn acquire(
        &self,
        session: SessionId,
        ns: Option<NamespaceId>,
        db: Option<DatabaseId>,
    ) -> Executor {
        let mut executor = self.idle.lock().pop().unwrap_or_else(|| {
            Executor::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.live),
                Arc::clone(&self.registry),
                self.default_timeout,
            )
        });
        executor.reset(session, ns, db);
        executor
    }

    fn release(&self, executor: Executor) {
        let mut idle = self.idle.lock();
        if idle.len() < self.pool_capacity {
            idle.push(executor);
        }
    }
}
