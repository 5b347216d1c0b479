//! Invoice requests
//!
//! Invoices are requested once per order, only when the total is positive,
//! and never block or fail the order flow.

use async_trait::async_trait;
use shared::models::Order;

#[async_trait]
pub trait InvoiceService: Send + Sync {
    async fn create_invoice_for_order(&self, order: &Order) -> anyhow::Result<()>;
}

/// Log-only invoice service (development default)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogInvoiceService;

#[async_trait]
impl InvoiceService for LogInvoiceService {
    async fn create_invoice_for_order(&self, order: &Order) -> anyhow::Result<()> {
        tracing::info!(
            order = %order.order_number,
            total = %order.total,
            "Invoice requested"
        );
        Ok(())
    }
}
