//! Type-safe wrapper for database identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type-safe wrapper for database identifiers.
///
/// Only meaningful together with a [`NamespaceId`](super::NamespaceId);
/// the pair selects the tenant a query runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Creates a new DatabaseId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the database ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DatabaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DatabaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DatabaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
