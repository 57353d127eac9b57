//! Broadcast notification fan-out.

use super::Engine;
use crate::cloud::collections;
use crate::errors::AppError;
use crate::models::{BroadcastRequest, SystemNotification, WipeOutcome};
use crate::store::keys;

const BROADCAST_KIND: &str = "broadcast";

impl Engine {
    pub async fn notifications(&self) -> Result<Vec<SystemNotification>, AppError> {
        self.store().get_or(keys::NOTIFICATIONS, Vec::new()).await
    }

    /// Notifications addressed to one serial id.
    pub async fn notifications_for(
        &self,
        serial_id: &str,
    ) -> Result<Vec<SystemNotification>, AppError> {
        let all = self.notifications().await?;
        Ok(all.into_iter().filter(|n| n.user_id == serial_id).collect())
    }

    /// Materialize one notification record per eligible recipient: not
    /// banned, not deactivated, not an admin. The owner is never persisted so
    /// it can never be a recipient.
    pub async fn broadcast(&self, request: &BroadcastRequest) -> Result<usize, AppError> {
        let users = self.users().await?;
        let recipients: Vec<String> = users
            .iter()
            .filter(|u| !u.is_banned && !u.is_deactivated && !u.is_admin)
            .map(|u| u.serial_id.clone())
            .collect();

        if recipients.is_empty() {
            return Err(AppError::Validation(
                "No eligible recipients for this broadcast".to_string(),
            ));
        }

        let now = Self::now_millis();
        let new_records: Vec<SystemNotification> = recipients
            .into_iter()
            .map(|serial_id| SystemNotification {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: serial_id,
                title: request.title.clone(),
                message: request.message.clone(),
                timestamp: now,
                is_read: false,
                kind: BROADCAST_KIND.to_string(),
            })
            .collect();
        let count = new_records.len();

        let mut all = self.notifications().await?;
        let mut combined = new_records.clone();
        combined.append(&mut all);
        self.store().set(keys::NOTIFICATIONS, &combined).await?;

        // Cloud side is capped at one batch; recipients beyond the cap stay
        // local-only
        if let Some(cloud) = self.cloud() {
            let cap = cloud.push_batch_limit();
            if count > cap {
                tracing::warn!(
                    "Broadcast audience of {} exceeds the push cap of {}; remainder is not mirrored",
                    count,
                    cap
                );
            }
            let records: Vec<(String, serde_json::Value)> = new_records
                .iter()
                .take(cap)
                .filter_map(|n| {
                    serde_json::to_value(n)
                        .ok()
                        .map(|value| (n.id.clone(), value))
                })
                .collect();
            self.mirror(move |cloud| async move {
                cloud.push_batch(collections::NOTIFICATIONS, &records).await;
            });
        }

        Ok(count)
    }

    /// Flip the read flag. Deliberately not mirrored to the cloud.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), AppError> {
        let mut all = self.notifications().await?;
        let index = all
            .iter()
            .position(|n| n.id == notification_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        all[index].is_read = true;
        self.store().set(keys::NOTIFICATIONS, &all).await
    }

    /// Owner-only: clear all notifications locally, capped best-effort delete
    /// remotely.
    pub async fn wipe_all_notifications(&self) -> Result<WipeOutcome, AppError> {
        self.require_owner().await?;

        self.store()
            .set(keys::NOTIFICATIONS, &Vec::<SystemNotification>::new())
            .await?;

        let mut outcome = WipeOutcome {
            local_cleared: true,
            cloud_deleted: None,
            cloud_partial: false,
        };
        if let Some(cloud) = self.cloud() {
            if let Some((deleted, partial)) = cloud
                .delete_collection_capped(collections::NOTIFICATIONS)
                .await
            {
                outcome.cloud_deleted = Some(deleted);
                outcome.cloud_partial = partial;
                if partial {
                    tracing::warn!(
                        "Notification wipe hit the cloud cap after {} deletions; remote records remain",
                        deleted
                    );
                }
            }
        }
        Ok(outcome)
    }
}
