//! User account model and account-related request bodies.

use serde::{Deserialize, Serialize};

/// Capability set for sub-admin accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPermissions {
    pub can_manage_orders: bool,
    pub can_manage_wallet: bool,
    pub can_manage_settings: bool,
    pub can_manage_team: bool,
}

impl AdminPermissions {
    /// The full capability set held by the owner.
    pub fn all() -> Self {
        Self {
            can_manage_orders: true,
            can_manage_wallet: true,
            can_manage_settings: true,
            can_manage_team: true,
        }
    }
}

/// A registered account: identity, wallet, and moderation record in one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque internal key
    pub id: String,
    /// Human-facing sequential account number, never reused
    pub serial_id: String,
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(rename = "balanceUSD")]
    pub balance_usd: f64,
    pub balance_coins: f64,
    /// Epoch milliseconds
    pub created_at: i64,
    pub is_banned: bool,
    /// Present and in the future = temporary freeze (epoch milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_expires_at: Option<i64>,
    #[serde(default)]
    pub is_deactivated: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<AdminPermissions>,
    /// Set after an admin-initiated password reset
    #[serde(default)]
    pub must_change_password: bool,
}

impl User {
    /// True while an unexpired temporary freeze is pending.
    pub fn is_frozen(&self, now_millis: i64) -> bool {
        matches!(self.ban_expires_at, Some(expires) if expires > now_millis)
    }
}

/// Wallet currency selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "COINS")]
    Coins,
}

/// Moderation action applied by `set_ban_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanAction {
    /// Unban: clears both the permanent flag and any pending freeze
    None,
    /// Permanent ban
    Permanent,
    /// Temporary freeze for a number of hours
    Temporary,
}

// --- Request bodies ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubAdminRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub permissions: AdminPermissions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsRequest {
    pub user_id: String,
    pub permissions: AdminPermissions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    pub serial_id: String,
    pub currency: Currency,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitRequest {
    pub user_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroBalanceRequest {
    pub serial_id: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialRequest {
    pub serial_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanRequest {
    pub serial_id: String,
    pub action: BanAction,
    #[serde(default)]
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub serial_id: String,
    pub new_password: String,
}
