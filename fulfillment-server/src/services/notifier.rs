//! Order notifications
//!
//! Notifications are best-effort: the order state machine fires them after
//! the transaction commits and only logs failures. Delivery internals
//! (templates, SMTP) live behind this trait.

use async_trait::async_trait;
use shared::models::{Order, OrderStatus};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the customer their order changed status
    async fn order_status_changed(
        &self,
        order: &Order,
        new_status: OrderStatus,
    ) -> anyhow::Result<()>;

    /// Tell the back office a new order arrived
    async fn admin_new_order(&self, order: &Order) -> anyhow::Result<()>;
}

/// Log-only notifier (development default)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_status_changed(
        &self,
        order: &Order,
        new_status: OrderStatus,
    ) -> anyhow::Result<()> {
        tracing::info!(
            order = %order.order_number,
            status = %new_status,
            "Notification: order status changed"
        );
        Ok(())
    }

    async fn admin_new_order(&self, order: &Order) -> anyhow::Result<()> {
        tracing::info!(
            order = %order.order_number,
            total = %order.total,
            "Notification: new order"
        );
        Ok(())
    }
}
