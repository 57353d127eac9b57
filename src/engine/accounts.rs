//! Account, session, wallet, and moderation operations.

use subtle::ConstantTimeEq;

use super::{Engine, FIRST_SERIAL, OWNER_SENTINEL_ID, OWNER_SERIAL};
use crate::cloud::collections;
use crate::errors::AppError;
use crate::models::{
    AdminPermissions, BanAction, BanRequest, CreateSubAdminRequest, Currency, LoginRequest,
    RegisterRequest, UpdateProfileRequest, User,
};
use crate::store::keys;

/// Constant-time credential comparison.
fn secret_eq(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

impl Engine {
    // ==================== USER LIST ====================

    /// Current persisted user list (triggers the throttled background pull).
    pub async fn users(&self) -> Result<Vec<User>, AppError> {
        self.maybe_sync();
        self.store().get_or(keys::USERS, Vec::new()).await
    }

    /// Persist the user list and mirror it, owner excluded.
    pub(crate) async fn save_users(&self, users: &[User]) -> Result<(), AppError> {
        self.store().set(keys::USERS, &users).await?;

        let records: Vec<(String, serde_json::Value)> = users
            .iter()
            .filter(|u| !self.is_owner_email(&u.email))
            .filter_map(|u| {
                serde_json::to_value(u)
                    .ok()
                    .map(|value| (u.id.clone(), value))
            })
            .collect();
        self.mirror(move |cloud| async move {
            cloud.push_batch(collections::USERS, &records).await;
        });
        Ok(())
    }

    pub async fn user_by_serial(&self, serial_id: &str) -> Result<Option<User>, AppError> {
        let users = self.users().await?;
        Ok(users.into_iter().find(|u| u.serial_id == serial_id))
    }

    fn next_serial(users: &[User]) -> String {
        let last = users
            .iter()
            .filter_map(|u| u.serial_id.parse::<i64>().ok())
            .max()
            .unwrap_or(FIRST_SERIAL - 1);
        (last + 1).to_string()
    }

    // ==================== REGISTRATION & LOGIN ====================

    /// Register a new account and establish it as the current session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        if self.is_owner_email(&request.email) {
            return Err(AppError::Validation(
                "This email is reserved for the administration".to_string(),
            ));
        }

        let mut users = self.users().await?;
        if users.iter().any(|u| u.email == request.email) {
            return Err(AppError::Validation(
                "This email is already registered".to_string(),
            ));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            serial_id: Self::next_serial(&users),
            email: request.email.clone(),
            password: request.password.clone(),
            username: request.username.clone(),
            balance_usd: 0.0,
            balance_coins: 0.0,
            created_at: Self::now_millis(),
            is_banned: false,
            ban_expires_at: None,
            is_deactivated: false,
            is_admin: false,
            permissions: None,
            must_change_password: false,
        };

        users.push(user.clone());
        self.save_users(&users).await?;
        self.update_session(&user).await?;

        Ok(user)
    }

    /// Create a sub-admin with the given capability set. Does not establish a
    /// session; the new admin logs in separately.
    pub async fn create_sub_admin(&self, request: &CreateSubAdminRequest) -> Result<(), AppError> {
        if self.is_owner_email(&request.email) {
            return Err(AppError::Validation(
                "The owner email cannot be used".to_string(),
            ));
        }

        let mut users = self.users().await?;
        if users.iter().any(|u| u.email == request.email) {
            return Err(AppError::Validation(
                "This email is already in use".to_string(),
            ));
        }

        let admin = User {
            id: uuid::Uuid::new_v4().to_string(),
            serial_id: Self::next_serial(&users),
            email: request.email.clone(),
            password: request.password.clone(),
            username: request.username.clone(),
            balance_usd: 0.0,
            balance_coins: 0.0,
            created_at: Self::now_millis(),
            is_banned: false,
            ban_expires_at: None,
            is_deactivated: false,
            is_admin: true,
            permissions: Some(request.permissions),
            must_change_password: false,
        };

        users.push(admin);
        self.save_users(&users).await?;
        Ok(())
    }

    /// The owner is checked before any persisted-user lookup and synthesized
    /// in memory; it is never appended to the user list.
    fn synthesize_owner(&self) -> User {
        User {
            id: OWNER_SENTINEL_ID.to_string(),
            serial_id: OWNER_SERIAL.to_string(),
            email: self.owner_email().to_string(),
            password: "***".to_string(),
            username: "Site Owner".to_string(),
            balance_usd: 999_999.0,
            balance_coins: 999_999.0,
            created_at: Self::now_millis(),
            is_banned: false,
            ban_expires_at: None,
            is_deactivated: false,
            is_admin: true,
            permissions: Some(AdminPermissions::all()),
            must_change_password: false,
        }
    }

    /// Authenticate and establish the session.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        if self.is_owner_email(&request.email)
            && secret_eq(&request.password, self.owner_password())
        {
            let owner = self.synthesize_owner();
            self.update_session(&owner).await?;
            return Ok(owner);
        }

        let mut users = self.users().await?;
        let now = Self::now_millis();

        let index = users
            .iter()
            .position(|u| u.email == request.email && secret_eq(&request.password, &u.password))
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if users[index].is_banned {
            return Err(AppError::Forbidden(
                "Your account has been permanently banned by the administration".to_string(),
            ));
        }
        if users[index].is_deactivated {
            return Err(AppError::Forbidden(
                "Your account has been deactivated".to_string(),
            ));
        }
        if users[index].is_frozen(now) {
            let until = users[index]
                .ban_expires_at
                .and_then(chrono::DateTime::from_timestamp_millis)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default();
            return Err(AppError::Forbidden(format!(
                "Your account is temporarily frozen until {}",
                until
            )));
        }

        // Lazily clear an elapsed freeze as part of this login
        if users[index].ban_expires_at.is_some() {
            users[index].ban_expires_at = None;
            self.save_users(&users).await?;
        }

        let user = users[index].clone();
        self.update_session(&user).await?;
        Ok(user)
    }

    // ==================== SESSION ====================

    /// Resolve the current session against the live user list so that
    /// externally-applied bans and edits are picked up.
    pub async fn current_session(&self) -> Result<Option<User>, AppError> {
        let Some(session) = self
            .store()
            .get_or::<Option<User>>(keys::CURRENT_SESSION, None)
            .await?
        else {
            return Ok(None);
        };

        if self.is_owner_email(&session.email) {
            return Ok(Some(session));
        }

        let users = self.users().await?;
        match users.into_iter().find(|u| u.id == session.id) {
            Some(fresh) => {
                if fresh.is_banned || fresh.is_deactivated || fresh.is_frozen(Self::now_millis()) {
                    self.store().remove(keys::CURRENT_SESSION).await?;
                    return Ok(None);
                }
                Ok(Some(fresh))
            }
            // Stale fallback; should not normally occur
            None => Ok(Some(session)),
        }
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.store().remove(keys::CURRENT_SESSION).await
    }

    pub(crate) async fn update_session(&self, user: &User) -> Result<(), AppError> {
        self.store().set(keys::CURRENT_SESSION, user).await
    }

    /// Fail unless the current session belongs to the owner.
    pub(crate) async fn require_owner(&self) -> Result<(), AppError> {
        match self.current_session().await? {
            Some(user) if self.is_owner_email(&user.email) => Ok(()),
            Some(_) => Err(AppError::Forbidden(
                "This operation is restricted to the site owner".to_string(),
            )),
            None => Err(AppError::Unauthorized("No active session".to_string())),
        }
    }

    // ==================== PROFILE ====================

    /// Rename a user. Admin accounts cannot be edited through this path.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<User, AppError> {
        if let Some(current) = self.current_session().await? {
            if current.is_admin {
                return Err(AppError::Validation(
                    "Admin profiles cannot be edited here".to_string(),
                ));
            }
        }

        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.id == request.user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        users[index].username = request.username.clone();
        let updated = users[index].clone();
        self.save_users(&users).await?;
        self.update_session(&updated).await?;

        Ok(updated)
    }

    // ==================== WALLET ====================

    /// Unconditionally add to the matching currency balance.
    pub async fn credit_balance(
        &self,
        serial_id: &str,
        currency: Currency,
        amount: f64,
    ) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        match currency {
            Currency::Usd => users[index].balance_usd += amount,
            Currency::Coins => users[index].balance_coins += amount,
        }

        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// USD-only guarded deduction; refreshes the session snapshot when the
    /// debited user is the session holder.
    pub async fn debit_balance(&self, user_id: &str, amount: f64) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if users[index].balance_usd < amount {
            return Err(AppError::Validation(
                "Insufficient wallet balance".to_string(),
            ));
        }

        users[index].balance_usd -= amount;
        let updated = users[index].clone();
        self.save_users(&users).await?;

        let session = self
            .store()
            .get_or::<Option<User>>(keys::CURRENT_SESSION, None)
            .await?;
        if session.map(|s| s.id) == Some(updated.id.clone()) {
            self.update_session(&updated).await?;
        }

        Ok(updated)
    }

    pub async fn zero_balance(&self, serial_id: &str, currency: Currency) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        match currency {
            Currency::Usd => users[index].balance_usd = 0.0,
            Currency::Coins => users[index].balance_coins = 0.0,
        }

        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    pub async fn wipe_balances(&self, serial_id: &str) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        users[index].balance_usd = 0.0;
        users[index].balance_coins = 0.0;

        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Owner-only: zero the coin balance of every account.
    pub async fn wipe_all_coins(&self) -> Result<usize, AppError> {
        self.require_owner().await?;

        let mut users = self.users().await?;
        for user in users.iter_mut() {
            user.balance_coins = 0.0;
        }
        let count = users.len();
        self.save_users(&users).await?;
        Ok(count)
    }

    // ==================== MODERATION ====================

    /// Apply a ban action. The three moderation axes (permanent ban, freeze,
    /// deactivation) are independent flags on the same record.
    pub async fn set_ban_status(&self, request: &BanRequest) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == request.serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner cannot be banned".to_string(),
            ));
        }

        match request.action {
            BanAction::Permanent => {
                users[index].is_banned = true;
                users[index].ban_expires_at = None;
            }
            BanAction::Temporary => {
                let hours = request
                    .duration_hours
                    .unwrap_or_else(|| self.default_freeze_hours());
                // Saturate so an absurd duration pins the expiry at the far
                // future instead of overflowing
                let expires = Self::now_millis().saturating_add(hours.saturating_mul(3_600_000));
                users[index].is_banned = false;
                users[index].ban_expires_at = Some(expires);
            }
            BanAction::None => {
                users[index].is_banned = false;
                users[index].ban_expires_at = None;
            }
        }

        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Flip the manual deactivation switch, independent of ban state.
    pub async fn toggle_deactivation(&self, serial_id: &str) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner cannot be deactivated".to_string(),
            ));
        }

        users[index].is_deactivated = !users[index].is_deactivated;
        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Admin-initiated password reset; the user must change it on next login.
    pub async fn reset_password(
        &self,
        serial_id: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner's password cannot be reset".to_string(),
            ));
        }

        users[index].password = new_password.to_string();
        users[index].must_change_password = true;
        self.save_users(&users).await?;
        Ok(())
    }

    /// Replace a user's capability set wholesale.
    pub async fn update_permissions(
        &self,
        user_id: &str,
        permissions: AdminPermissions,
    ) -> Result<(), AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner's permissions cannot be changed".to_string(),
            ));
        }

        users[index].permissions = Some(permissions);
        self.save_users(&users).await?;
        Ok(())
    }

    pub async fn remove_admin_privileges(&self, serial_id: &str) -> Result<User, AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner's privileges cannot be removed".to_string(),
            ));
        }

        users[index].is_admin = false;
        users[index].permissions = None;
        let updated = users[index].clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Remove the account entirely, including its cloud mirror record.
    pub async fn delete_permanently(&self, serial_id: &str) -> Result<(), AppError> {
        let mut users = self.users().await?;
        let index = users
            .iter()
            .position(|u| u.serial_id == serial_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.is_owner_email(&users[index].email) {
            return Err(AppError::Forbidden(
                "The site owner cannot be deleted".to_string(),
            ));
        }

        let removed = users.remove(index);
        self.save_users(&users).await?;

        self.mirror(move |cloud| async move {
            cloud
                .delete_document(collections::USERS, &removed.id)
                .await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::engine;
    use super::*;
    use crate::errors::AppError;

    fn register_request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "pw123".to_string(),
            username: username.to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_registration_gets_first_serial() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        assert_eq!(user.serial_id, "10001");
    }

    #[tokio::test]
    async fn test_serials_are_sequential() {
        let (engine, _dir) = engine().await;
        for n in 0..3 {
            let user = engine
                .register(&register_request(&format!("u{}@x.com", n), "u"))
                .await
                .unwrap();
            assert_eq!(user.serial_id, (10001 + n).to_string());
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (engine, _dir) = engine().await;
        engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        let err = engine
            .register(&register_request("a@x.com", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_owner_email_is_reserved() {
        let (engine, _dir) = engine().await;
        let err = engine
            .register(&register_request("owner@test.local", "evil"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_registration_establishes_session() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        let session = engine.current_session().await.unwrap().unwrap();
        assert_eq!(session.id, user.id);
    }

    #[tokio::test]
    async fn test_owner_login_synthesizes_session() {
        let (engine, _dir) = engine().await;
        let owner = engine
            .login(&login_request("owner@test.local", "owner-secret"))
            .await
            .unwrap();
        assert_eq!(owner.id, OWNER_SENTINEL_ID);
        assert_eq!(owner.serial_id, OWNER_SERIAL);
        assert!(owner.is_admin);
        // Owner is never appended to the persisted list
        assert!(engine.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password_rejected() {
        let (engine, _dir) = engine().await;
        engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        let err = engine
            .login(&login_request("a@x.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_login() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::Permanent,
                duration_hours: None,
            })
            .await
            .unwrap();

        let err = engine
            .login(&login_request("a@x.com", "pw123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_frozen_user_cannot_login_until_expiry() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::Temporary,
                duration_hours: Some(1),
            })
            .await
            .unwrap();

        let err = engine
            .login(&login_request("a@x.com", "pw123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_huge_freeze_duration_saturates_instead_of_overflowing() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::Temporary,
                duration_hours: Some(i64::MAX),
            })
            .await
            .unwrap();

        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert_eq!(fresh.ban_expires_at, Some(i64::MAX));
        assert!(fresh.is_frozen(Engine::now_millis()));

        let err = engine
            .login(&login_request("a@x.com", "pw123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_elapsed_freeze_is_cleared_on_login() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();

        // Write an already-elapsed freeze directly
        let mut users = engine.users().await.unwrap();
        users[0].ban_expires_at = Some(Engine::now_millis() - 1000);
        engine.save_users(&users).await.unwrap();

        let logged_in = engine.login(&login_request("a@x.com", "pw123")).await;
        assert!(logged_in.is_ok());
        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert!(fresh.ban_expires_at.is_none());

        // A second login does not error on the now-absent field
        assert!(engine.login(&login_request("a@x.com", "pw123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_login() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine.toggle_deactivation(&user.serial_id).await.unwrap();

        let err = engine
            .login(&login_request("a@x.com", "pw123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Toggling again restores access
        engine.toggle_deactivation(&user.serial_id).await.unwrap();
        assert!(engine.login(&login_request("a@x.com", "pw123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_refresh_picks_up_external_ban() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        assert!(engine.current_session().await.unwrap().is_some());

        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::Permanent,
                duration_hours: None,
            })
            .await
            .unwrap();

        // The session is cleared on the next refresh
        assert!(engine.current_session().await.unwrap().is_none());
        assert!(engine.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ban_round_trip_restores_loginable_state() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();

        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::Permanent,
                duration_hours: None,
            })
            .await
            .unwrap();
        engine
            .set_ban_status(&BanRequest {
                serial_id: user.serial_id.clone(),
                action: BanAction::None,
                duration_hours: None,
            })
            .await
            .unwrap();

        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert!(!fresh.is_banned);
        assert!(fresh.ban_expires_at.is_none());
        assert!(engine.login(&login_request("a@x.com", "pw123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();

        engine
            .credit_balance(&user.serial_id, Currency::Usd, 50.0)
            .await
            .unwrap();
        engine
            .credit_balance(&user.serial_id, Currency::Coins, 300.0)
            .await
            .unwrap();

        let debited = engine.debit_balance(&user.id, 20.0).await.unwrap();
        assert_eq!(debited.balance_usd, 30.0);
        assert_eq!(debited.balance_coins, 300.0);

        // Session snapshot follows the debit
        let session = engine.current_session().await.unwrap().unwrap();
        assert_eq!(session.balance_usd, 30.0);
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance_leaves_it_unchanged() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .credit_balance(&user.serial_id, Currency::Usd, 10.0)
            .await
            .unwrap();

        let err = engine.debit_balance(&user.id, 25.0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert_eq!(fresh.balance_usd, 10.0);
    }

    #[tokio::test]
    async fn test_zero_and_wipe_balances() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .credit_balance(&user.serial_id, Currency::Usd, 10.0)
            .await
            .unwrap();
        engine
            .credit_balance(&user.serial_id, Currency::Coins, 20.0)
            .await
            .unwrap();

        let zeroed = engine
            .zero_balance(&user.serial_id, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(zeroed.balance_usd, 0.0);
        assert_eq!(zeroed.balance_coins, 20.0);

        let wiped = engine.wipe_balances(&user.serial_id).await.unwrap();
        assert_eq!(wiped.balance_coins, 0.0);
    }

    #[tokio::test]
    async fn test_reset_password_flags_must_change() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();

        engine
            .reset_password(&user.serial_id, "fresh-pw")
            .await
            .unwrap();

        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert_eq!(fresh.password, "fresh-pw");
        assert!(fresh.must_change_password);
        assert!(engine.login(&login_request("a@x.com", "fresh-pw")).await.is_ok());
    }

    #[tokio::test]
    async fn test_owner_record_is_immutable() {
        let (engine, _dir) = engine().await;
        // Plant a persisted record carrying the owner email
        let owner_record = User {
            id: "owner-row".to_string(),
            serial_id: "10001".to_string(),
            email: "owner@test.local".to_string(),
            password: "x".to_string(),
            username: "owner".to_string(),
            balance_usd: 0.0,
            balance_coins: 0.0,
            created_at: 0,
            is_banned: false,
            ban_expires_at: None,
            is_deactivated: false,
            is_admin: true,
            permissions: Some(AdminPermissions::all()),
            must_change_password: false,
        };
        engine.save_users(&[owner_record]).await.unwrap();

        let ban = engine
            .set_ban_status(&BanRequest {
                serial_id: "10001".to_string(),
                action: BanAction::Permanent,
                duration_hours: None,
            })
            .await;
        assert!(matches!(ban, Err(AppError::Forbidden(_))));

        let deactivate = engine.toggle_deactivation("10001").await;
        assert!(matches!(deactivate, Err(AppError::Forbidden(_))));

        let reset = engine.reset_password("10001", "new").await;
        assert!(matches!(reset, Err(AppError::Forbidden(_))));

        let demote = engine.remove_admin_privileges("10001").await;
        assert!(matches!(demote, Err(AppError::Forbidden(_))));

        let delete = engine.delete_permanently("10001").await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));

        let perms = engine
            .update_permissions("owner-row", AdminPermissions::default())
            .await;
        assert!(matches!(perms, Err(AppError::Forbidden(_))));

        // No mutation happened
        let fresh = engine.user_by_serial("10001").await.unwrap().unwrap();
        assert!(!fresh.is_banned && !fresh.is_deactivated && fresh.is_admin);
    }

    #[tokio::test]
    async fn test_sub_admin_creation_and_demotion() {
        let (engine, _dir) = engine().await;
        engine
            .create_sub_admin(&CreateSubAdminRequest {
                email: "mod@x.com".to_string(),
                password: "pw".to_string(),
                username: "mod".to_string(),
                permissions: AdminPermissions {
                    can_manage_orders: true,
                    ..AdminPermissions::default()
                },
            })
            .await
            .unwrap();

        // No session was established
        assert!(engine.current_session().await.unwrap().is_none());

        let admin = engine.user_by_serial("10001").await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert!(admin.permissions.unwrap().can_manage_orders);

        let demoted = engine.remove_admin_privileges("10001").await.unwrap();
        assert!(!demoted.is_admin);
        assert!(demoted.permissions.is_none());
    }

    #[tokio::test]
    async fn test_delete_permanently_removes_user() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine.delete_permanently(&user.serial_id).await.unwrap();
        assert!(engine.user_by_serial(&user.serial_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_serial_never_reused_after_delete() {
        let (engine, _dir) = engine().await;
        engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        let second = engine
            .register(&register_request("b@x.com", "b"))
            .await
            .unwrap();
        assert_eq!(second.serial_id, "10002");

        engine.delete_permanently("10001").await.unwrap();
        let third = engine
            .register(&register_request("c@x.com", "c"))
            .await
            .unwrap();
        // max(existing)+1, not a reuse of 10001
        assert_eq!(third.serial_id, "10003");
    }

    #[tokio::test]
    async fn test_wipe_all_coins_is_owner_only() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .credit_balance(&user.serial_id, Currency::Coins, 500.0)
            .await
            .unwrap();

        // Session belongs to a regular user
        let err = engine.wipe_all_coins().await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        engine
            .login(&login_request("owner@test.local", "owner-secret"))
            .await
            .unwrap();
        let count = engine.wipe_all_coins().await.unwrap();
        assert_eq!(count, 1);

        let fresh = engine.user_by_serial(&user.serial_id).await.unwrap().unwrap();
        assert_eq!(fresh.balance_coins, 0.0);
    }

    #[tokio::test]
    async fn test_update_profile_rejected_for_admin_session() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();
        engine
            .login(&login_request("owner@test.local", "owner-secret"))
            .await
            .unwrap();

        let err = engine
            .update_profile(&UpdateProfileRequest {
                user_id: user.id.clone(),
                username: "renamed".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_profile_renames_and_refreshes_session() {
        let (engine, _dir) = engine().await;
        let user = engine
            .register(&register_request("a@x.com", "a"))
            .await
            .unwrap();

        let updated = engine
            .update_profile(&UpdateProfileRequest {
                user_id: user.id.clone(),
                username: "renamed".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(updated.username, "renamed");

        let session = engine.current_session().await.unwrap().unwrap();
        assert_eq!(session.username, "renamed");
    }
}
