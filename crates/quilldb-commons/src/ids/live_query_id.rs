//! Type-safe wrapper for live-query identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type-safe wrapper for live-query identifiers.
///
/// Returned to the client by `LIVE` and accepted back by `KILL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiveQueryId(String);

impl LiveQueryId {
    /// Creates a new LiveQueryId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random live-query id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the live-query ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LiveQueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LiveQueryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LiveQueryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for LiveQueryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
