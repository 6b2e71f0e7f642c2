//! The query executor.
//!
//! One executor serves one query at a time; the pool recycles them across
//! queries. Statements run strictly sequentially. Responses stream out on
//! the per-query channel as soon as each statement completes, except inside
//! an explicit transaction, where they are buffered until `COMMIT` or
//! `CANCEL` so a failed commit can rewrite them.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures::FutureExt;
use quilldb_commons::{DatabaseId, NamespaceId, Options, SessionId};
use quilldb_live::LiveRegistry;
use quilldb_sql::{Query, Statement};
use quilldb_store::KvEngine;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::cache::QueryCache;
use crate::ctx::ExecutionContext;
use crate::error::{Error, Status};
use crate::registry::{EvaluatorRegistry, Scope};
use crate::response::Response;
use crate::txn::TxnHandle;

const LOG_SQL: &str = "quilldb::sql";
const LOG_DB: &str = "quilldb::db";

pub struct Executor {
    id: SessionId,
    ns: Option<NamespaceId>,
    db: Option<DatabaseId>,
    /// Version stamp for the current statement, in nanoseconds. Monotonic
    /// non-decreasing within one `execute` call.
    time: u64,
    opts: Options,
    /// Sticky error: set by the first failing statement of an explicit
    /// transaction, cleared on transaction close.
    err: Option<Error>,
    /// Responses buffered while an explicit transaction is open.
    buf: Vec<Response>,
    txn: Option<TxnHandle>,
    /// Serializes recursive sub-queries against the one transaction
    /// handle. Replaced on every new transaction.
    lock: Arc<Mutex<()>>,
    cache: QueryCache,
    default_timeout: Option<Duration>,

    engine: Arc<dyn KvEngine>,
    live: Arc<LiveRegistry>,
    registry: Arc<EvaluatorRegistry>,
}

impl Executor {
    pub(crate) fn new(
        engine: Arc<dyn KvEngine>,
        live: Arc<LiveRegistry>,
        registry: Arc<EvaluatorRegistry>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            ns: None,
            db: None,
            time: 0,
            opts: Options::default(),
            err: None,
            buf: Vec::new(),
            txn: None,
            lock: Arc::new(Mutex::new(())),
            cache: QueryCache::new(),
            default_timeout,
            engine,
            live,
            registry,
        }
    }

    /// Zero transient state for a new query. Called by the pool on acquire.
    pub(crate) fn reset(
        &mut self,
        id: SessionId,
        ns: Option<NamespaceId>,
        db: Option<DatabaseId>,
    ) {
        self.id = id;
        self.ns = ns;
        self.db = db;
        self.time = 0;
        self.opts = Options::default();
        self.err = None;
        self.buf.clear();
        self.txn = None;
        self.lock = Arc::new(Mutex::new(()));
        self.cache.clear();
    }

    /// Drive a query to completion, streaming responses on `out`.
    ///
    /// The channel is closed before this returns, exactly once. A panic
    /// anywhere inside statement execution is caught, logged with the
    /// session id, and converted into normal teardown.
    pub(crate) async fn execute(
        &mut self,
        ctx: &ExecutionContext,
        query: &Query,
        out: mpsc::Sender<Response>,
    ) {
        let run = AssertUnwindSafe(self.run(ctx, query, &out)).catch_unwind().await;

        if let Err(panic) = run {
            log::error!(
                target: LOG_DB,
                "query execution panicked: id={} panic={} stack={}",
                self.id,
                panic_message(panic.as_ref()),
                std::backtrace::Backtrace::force_capture()
            );
        }

        // A BEGIN without a matching COMMIT or CANCEL leaks its
        // transaction; roll it back and drop its registrations.
        if let Some(txn) = self.txn.as_mut() {
            if !txn.is_closed() {
                let _ = txn.cancel();
            }
            self.live.clear(&self.id);
        }
        self.txn = None;

        drop(out);
    }

    async fn run(&mut self, ctx: &ExecutionContext, query: &Query, out: &mpsc::Sender<Response>) {
        for stm in &query.statements {
            if ctx.is_done() {
                return;
            }
            self.conduct(ctx, stm, out).await;
        }
    }

    /// Execute one statement: transaction control short-circuits here; data
    /// statements go through [`operate`](Self::operate), and their response
    /// is either sent immediately (implicit mode) or buffered (explicit
    /// mode).
    async fn conduct(
        &mut self,
        ctx: &ExecutionContext,
        stm: &Statement,
        out: &mpsc::Sender<Response>,
    ) {
        // Outside an explicit transaction the rolling error resets, so the
        // next statement is not ignored.
        if self.txn.is_none() {
            self.err = None;
        }
        let now = Instant::now();

        match stm {
            Statement::Begin => {
                self.lock = Arc::new(Mutex::new(()));
                // BEGIN emits no response, so a failure here only surfaces
                // in the log; statements that follow run implicitly.
                if let Err(e) = self.begin_txn(true) {
                    log::error!(target: LOG_SQL, "BEGIN failed: id={} error={}", self.id, e);
                }
                return;
            }
            Statement::Cancel => {
                self.cancel_txn(out).await;
                self.live.clear(&self.id);
                return;
            }
            Statement::Commit => {
                match self.commit_txn(out).await {
                    Ok(()) => self.live.flush(&self.id),
                    Err(_) => self.live.clear(&self.id),
                }
                return;
            }
            _ => {}
        }

        let result = if self.err.is_some() {
            Err(Error::QueryNotExecuted)
        } else {
            self.operate(ctx, stm).await
        };

        // The first failure inside an explicit transaction becomes sticky
        // and suppresses evaluation of every statement up to COMMIT/CANCEL.
        if self.txn.is_some() && self.err.is_none() {
            if let Err(e) = &result {
                self.err = Some(e.clone());
            }
        }

        self.log_statement(ctx, stm, now.elapsed(), &result);

        let rsp = Response::new(now.elapsed(), result);

        if self.txn.is_none() {
            if out.send(rsp).await.is_err() {
                log::debug!(target: LOG_SQL, "response channel closed: id={}", self.id);
            }
        } else {
            // Inside a transaction a RETURN discards everything buffered
            // so far; the transaction's output is solely the returned
            // value.
            if matches!(stm, Statement::Return(_)) {
                self.buf.clear();
            }
            self.buf.push(rsp);
        }
    }

    /// Evaluate one data statement inside a transaction, opening and
    /// closing an implicit one when no explicit transaction is active.
    async fn operate(
        &mut self,
        ctx: &ExecutionContext,
        stm: &Statement,
    ) -> Result<Vec<Value>, Error> {
        let mut local = false;

        if self.txn.is_none() {
            // Reads require no write lock.
            self.begin_txn(stm.writeable())?;
            self.lock = Arc::new(Mutex::new(()));
            local = true;
        }

        // All writes of this statement, including recursive sub-queries
        // and deferred events, share one version stamp.
        self.time = self.time.max(now_nanos());

        let timeout = stm.timeout().or(self.default_timeout);
        let registry = Arc::clone(&self.registry);

        let result = {
            let txn = match self.txn.as_mut() {
                Some(txn) => txn,
                None => return Err(Error::Db("no open transaction".to_string())),
            };
            let mut scope = Scope {
                session: &self.id,
                ns: &mut self.ns,
                db: &mut self.db,
                opts: &mut self.opts,
                txn,
                cache: &mut self.cache,
                live: self.live.as_ref(),
                lock: Arc::clone(&self.lock),
                stamp: self.time,
            };

            match timeout {
                Some(d) if !d.is_zero() => {
                    let child = ctx.with_deadline(d);
                    match tokio::time::timeout(d, registry.evaluate(&child, &mut scope, stm)).await
                    {
                        // The evaluator finished in time but past the
                        // deadline: its success is replaced by a timeout.
                        Ok(res) if res.is_ok() && child.is_timedout() => {
                            Err(Error::Timer { timeout: d })
                        }
                        Ok(res) => res,
                        Err(_) => Err(Error::Timer { timeout: d }),
                    }
                }
                _ => registry.evaluate(ctx, &mut scope, stm).await,
            }
        };

        // A cancelled caller abandons the statement and its transaction.
        if ctx.is_cancelled() {
            if let Some(txn) = self.txn.as_mut() {
                let _ = txn.cancel();
            }
            self.txn = None;
            self.live.clear(&self.id);
            return result;
        }

        if local {
            let mut commit_err = None;
            if let Some(txn) = self.txn.as_mut() {
                if !txn.is_closed() {
                    if result.is_err() {
                        let _ = txn.cancel();
                        self.live.clear(&self.id);
                    } else if !txn.writable() {
                        // Read-only transactions are discarded, not
                        // committed: cancel is free of commit-log pressure.
                        let _ = txn.cancel();
                        self.live.clear(&self.id);
                    } else {
                        match txn.commit() {
                            Ok(()) => self.live.flush(&self.id),
                            Err(e) => {
                                self.live.clear(&self.id);
                                commit_err = Some(e);
                            }
                        }
                    }
                }
            }
            self.txn = None;
            if let Some(e) = commit_err {
                return Err(e);
            }
        }

        result
    }

    fn begin_txn(&mut self, writable: bool) -> Result<(), Error> {
        if self.txn.is_none() {
            self.txn = Some(TxnHandle::begin(&self.engine, writable)?);
        }
        Ok(())
    }

    /// Cancel the explicit transaction, rewriting and emitting every
    /// buffered response.
    async fn cancel_txn(&mut self, out: &mpsc::Sender<Response>) {
        let Some(mut txn) = self.txn.take() else {
            return;
        };
        let _ = txn.cancel();

        for mut rsp in std::mem::take(&mut self.buf) {
            rsp.status = Status::Err;
            rsp.detail = "Transaction cancelled".to_string();
            rsp.result = Vec::new();
            if out.send(rsp).await.is_err() {
                log::debug!(target: LOG_SQL, "response channel closed: id={}", self.id);
            }
        }
        self.err = None;
    }

    /// Commit the explicit transaction and emit the buffer. With a sticky
    /// error the commit degrades to a cancel, and every buffered response
    /// is rewritten as failed.
    async fn commit_txn(&mut self, out: &mpsc::Sender<Response>) -> Result<(), Error> {
        let Some(mut txn) = self.txn.take() else {
            return Ok(());
        };

        let failure = match self.err.take() {
            Some(sticky) => {
                let _ = txn.cancel();
                Some(sticky)
            }
            None => txn.commit().err(),
        };

        for mut rsp in std::mem::take(&mut self.buf) {
            if let Some(err) = &failure {
                rsp.status = Status::Err;
                rsp.detail = format!("Transaction failed: {}", err);
                rsp.result = Vec::new();
            }
            if out.send(rsp).await.is_err() {
                log::debug!(target: LOG_SQL, "response channel closed: id={}", self.id);
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn log_statement(
        &self,
        ctx: &ExecutionContext,
        stm: &Statement,
        elapsed: Duration,
        result: &Result<Vec<Value>, Error>,
    ) {
        let ns = self.ns.as_ref().map(|n| n.as_str()).unwrap_or("-");
        let db = self.db.as_ref().map(|d| d.as_str()).unwrap_or("-");
        match result {
            Ok(_) => log::debug!(
                target: LOG_SQL,
                "{} id={} kind={} ns={} db={} time={:?}",
                stm, self.id, ctx.kind(), ns, db, elapsed
            ),
            Err(e) => log::error!(
                target: LOG_SQL,
                "{} id={} kind={} ns={} db={} time={:?} error={}",
                stm, self.id, ctx.kind(), ns, db, elapsed, e
            ),
        }
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
