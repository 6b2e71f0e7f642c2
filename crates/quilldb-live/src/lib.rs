//! Live-query notification side channel.
//!
//! Writers defer change notifications under their session id while a
//! transaction is in flight; the executor publishes them with
//! [`LiveRegistry::flush`] once the transaction commits, or discards them
//! with [`LiveRegistry::clear`] when it rolls back. Subscribers therefore
//! only ever observe durable state.

pub mod notification;
pub mod registry;

pub use notification::{Action, Notification};
pub use registry::{DeferredChange, LiveRegistry};
