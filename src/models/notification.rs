//! System notification model.

use serde::{Deserialize, Serialize};

/// One-per-recipient broadcast record. A broadcast to N eligible users
/// materializes N of these, each with its own read state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNotification {
    pub id: String,
    /// Recipient's serial id
    pub user_id: String,
    pub title: String,
    pub message: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body for a broadcast to all eligible users.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
}
