//! Order ledger: append-only creation, partial updates, derived stats,
//! owner-only global wipe.

use super::{Engine, VISITOR_FALLBACK};
use crate::cloud::collections;
use crate::errors::AppError;
use crate::models::{
    CreateOrderRequest, DashboardStats, Order, OrderStatus, UpdateOrderRequest, WipeOutcome,
};
use crate::store::keys;

impl Engine {
    /// Current order list, most recent first (triggers the throttled pull).
    pub async fn orders(&self) -> Result<Vec<Order>, AppError> {
        self.maybe_sync();
        self.store().get_or(keys::ORDERS, Vec::new()).await
    }

    /// Prepend a new order and mirror it by document id.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, AppError> {
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: request.user_id.clone(),
            username: request.username.clone(),
            app_name: request.app_name.clone(),
            player_id: request.player_id.clone(),
            amount: request.amount,
            payment_method: request.payment_method.clone(),
            timestamp: Self::now_millis(),
            status: OrderStatus::Pending,
            admin_message: None,
            is_read: false,
        };

        let mut orders = self.orders().await?;
        orders.insert(0, order.clone());
        self.store().set(keys::ORDERS, &orders).await?;

        let mirrored = order.clone();
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::ORDERS, &mirrored.id, &mirrored)
                .await;
        });

        Ok(order)
    }

    /// Shallow-merge the given fields into an existing order and mirror the
    /// same partial update.
    pub async fn update_order(
        &self,
        order_id: &str,
        request: &UpdateOrderRequest,
    ) -> Result<Order, AppError> {
        let mut orders = self.orders().await?;
        let index = orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

        if let Some(status) = request.status {
            orders[index].status = status;
        }
        if let Some(message) = &request.admin_message {
            orders[index].admin_message = Some(message.clone());
        }
        if let Some(is_read) = request.is_read {
            orders[index].is_read = is_read;
        }

        let updated = orders[index].clone();
        self.store().set(keys::ORDERS, &orders).await?;

        let patch = request.to_patch();
        if patch.as_object().is_some_and(|m| !m.is_empty()) {
            let id = updated.id.clone();
            self.mirror(move |cloud| async move {
                cloud.patch_document(collections::ORDERS, &id, &patch).await;
            });
        }

        Ok(updated)
    }

    /// Derived aggregates: full order list plus the externally-managed
    /// visitor counter.
    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let orders = self.orders().await?;
        let visitors: i64 = self
            .store()
            .get_or(keys::VISITORS, VISITOR_FALLBACK)
            .await?;
        let total_amount = orders.iter().map(|o| o.amount).sum();

        Ok(DashboardStats {
            visitors,
            total_orders: orders.len(),
            total_amount,
        })
    }

    /// Owner-only: clear the local ledger immediately, then delete the cloud
    /// collection up to the wipe cap.
    pub async fn wipe_all_orders(&self) -> Result<WipeOutcome, AppError> {
        self.require_owner().await?;

        self.store().set(keys::ORDERS, &Vec::<Order>::new()).await?;

        let mut outcome = WipeOutcome {
            local_cleared: true,
            cloud_deleted: None,
            cloud_partial: false,
        };
        if let Some(cloud) = self.cloud() {
            if let Some((deleted, partial)) =
                cloud.delete_collection_capped(collections::ORDERS).await
            {
                outcome.cloud_deleted = Some(deleted);
                outcome.cloud_partial = partial;
                if partial {
                    tracing::warn!(
                        "Order wipe hit the cloud cap after {} deletions; remote records remain",
                        deleted
                    );
                }
            }
        }
        Ok(outcome)
    }
}
