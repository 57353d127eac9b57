//! Order ledger model matching the frontend Order interface.

use serde::{Deserialize, Serialize};

/// Processing state of a top-up order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
}

/// A shipped or requested top-up transaction. Orders are never removed
/// individually, only via global wipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_message: Option<String>,
    /// Read state for the owning user's notification view
    #[serde(default)]
    pub is_read: bool,
}

/// Request body for submitting a new order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub player_id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Partial-field update for an existing order. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub admin_message: Option<String>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

impl UpdateOrderRequest {
    /// Only the fields actually set, for mirroring the same partial update.
    pub fn to_patch(&self) -> serde_json::Value {
        let mut patch = serde_json::Map::new();
        if let Some(status) = self.status {
            patch.insert("status".into(), serde_json::json!(status));
        }
        if let Some(message) = &self.admin_message {
            patch.insert("adminMessage".into(), serde_json::json!(message));
        }
        if let Some(is_read) = self.is_read {
            patch.insert("isRead".into(), serde_json::json!(is_read));
        }
        serde_json::Value::Object(patch)
    }
}

/// Derived dashboard aggregates, recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub visitors: i64,
    pub total_orders: usize,
    pub total_amount: f64,
}

/// Result of an owner-only global wipe. The local store is always cleared;
/// the cloud side is best-effort and capped, so it can complete partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipeOutcome {
    pub local_cleared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_deleted: Option<usize>,
    pub cloud_partial: bool,
}
