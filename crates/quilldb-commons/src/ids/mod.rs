//! Type-safe wrappers for the identifiers that cross crate boundaries.
//!
//! Each identifier is a newtype over `String` so a namespace selector can
//! never be passed where a session id is expected.

mod database_id;
mod live_query_id;
mod namespace_id;
mod session_id;

pub use database_id::DatabaseId;
pub use live_query_id::LiveQueryId;
pub use namespace_id::NamespaceId;
pub use session_id::SessionId;
