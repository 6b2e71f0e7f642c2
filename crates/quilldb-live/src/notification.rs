//! Change notifications delivered to live-query subscribers.

use quilldb_commons::LiveQueryId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of change a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// A single change notification, addressed to one live-query subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// The subscription this notification is for.
    pub id: LiveQueryId,
    pub action: Action,
    /// The record state after the change (the prior state for deletes).
    pub result: Value,
}
