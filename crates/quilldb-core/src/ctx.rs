//! Execution context: cooperative cancellation, deadlines and query-scoped
//! parameter bindings.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;

/// Cancellation token shared between the caller and the executor.
///
/// Cancellation is cooperative: the executor checks the token before each
/// statement and after each evaluator call; evaluators are expected to
/// check it inside long-running loops.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Where a query came from. Carried for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Http,
    WebSocket,
    Internal,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationKind::Http => write!(f, "http"),
            InvocationKind::WebSocket => write!(f, "websocket"),
            InvocationKind::Internal => write!(f, "internal"),
        }
    }
}

/// Per-query execution context.
///
/// Cheap to clone; the cancellation flag and parameter bindings are shared
/// between clones, so a deadline-bounded child context derived with
/// [`with_deadline`](Self::with_deadline) still observes the caller's
/// cancellation and `LET` bindings made through any clone.
#[derive(Clone)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    kind: InvocationKind,
    vars: Arc<RwLock<HashMap<String, Value>>>,
}

impl ExecutionContext {
    pub fn new(kind: InvocationKind) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            kind,
            vars: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A context for internally-issued queries.
    pub fn internal() -> Self {
        Self::new(InvocationKind::Internal)
    }

    /// Seed the parameter bindings, builder-style.
    pub fn with_vars(self, vars: HashMap<String, Value>) -> Self {
        *self.vars.write() = vars;
        self
    }

    /// Derive a child context whose deadline is at most `timeout` from now.
    /// An earlier deadline on `self` is kept.
    pub fn with_deadline(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// The token the caller holds to cancel this query.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the deadline (if any) has passed.
    pub fn is_timedout(&self) -> bool {
        self.deadline.map(|d| d <= Instant::now()).unwrap_or(false)
    }

    /// Whether work should stop: cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_timedout()
    }

    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// Look up a parameter binding.
    pub fn var(&self, name: &str) -> Option<Value> {
        self.vars.read().get(name).cloned()
    }

    /// Bind a parameter, replacing any previous value.
    pub fn set_var(&self, name: impl Into<String>, value: Value) {
        self.vars.write().insert(name.into(), value);
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancellation_is_shared_across_clones() {
        let ctx = ExecutionContext::internal();
        let child = ctx.with_deadline(Duration::from_secs(60));
        ctx.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn deadline_marks_done() {
        let ctx = ExecutionContext::internal();
        assert!(!ctx.is_done());

        let child = ctx.with_deadline(Duration::ZERO);
        assert!(child.is_timedout());
        // The parent has no deadline of its own.
        assert!(!ctx.is_timedout());
    }

    #[test]
    fn child_keeps_earlier_parent_deadline() {
        let ctx = ExecutionContext::internal().with_deadline(Duration::ZERO);
        let child = ctx.with_deadline(Duration::from_secs(60));
        assert!(child.is_timedout());
    }

    #[test]
    fn vars_are_shared_across_clones() {
        let ctx = ExecutionContext::internal();
        let child = ctx.with_deadline(Duration::from_secs(60));
        child.set_var("name", json!("tobie"));
        assert_eq!(ctx.var("name"), Some(json!("tobie")));
        assert_eq!(ctx.var("missing"), None);
    }
}
