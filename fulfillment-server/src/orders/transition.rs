//! Status transitions, payment confirmation and cancellation

use super::{OrderError, OrderResult, OrderService};
use crate::ledger;
use crate::utils::now_ms;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::{Order, OrderStatus, OrderStatusHistory, PaymentStatus};

impl OrderService {
    /// Move an order to `new_status`
    ///
    /// Rejects backward and terminal-state moves with a typed error. An
    /// accepted transition appends exactly one history row, credits loyalty
    /// points on the first paid transition, and fires exactly one customer
    /// notification after commit.
    pub async fn transition(
        &self,
        order_number: &str,
        new_status: OrderStatus,
        notes: Option<String>,
        actor: &str,
    ) -> OrderResult<Order> {
        let now = now_ms();
        let txn = self.storage.begin_write()?;

        let order = match self.apply_transition(&txn, order_number, new_status, notes, actor, now)
        {
            Ok(order) => order,
            Err(e) => {
                txn.abort()?;
                return Err(e);
            }
        };
        txn.commit()?;

        tracing::info!(
            order = %order_number,
            status = %new_status,
            actor = %actor,
            "Order transitioned"
        );

        if let Err(e) = self.notifier.order_status_changed(&order, new_status).await {
            tracing::warn!(order = %order_number, error = %e, "Status notification failed");
        }

        Ok(order)
    }

    /// Payment gateway "paid" signal
    ///
    /// Marks the order PAID, confirms it if still pending, credits points
    /// once, and requests the invoice (once, positive totals only). A
    /// repeated signal for an already-paid order is a no-op.
    pub async fn confirm_payment(
        &self,
        order_number: &str,
        amount_paid: Decimal,
    ) -> OrderResult<Order> {
        let now = now_ms();
        let txn = self.storage.begin_write()?;

        let mut order = match self.storage.get_order_for_update(&txn, order_number)? {
            Some(order) => order,
            None => {
                txn.abort()?;
                return Err(OrderError::NotFound(order_number.to_string()));
            }
        };

        if order.payment_status == PaymentStatus::Paid {
            txn.abort()?;
            tracing::info!(order = %order_number, "Duplicate payment signal ignored");
            return Ok(order);
        }

        // A late gateway signal for a cancelled order must not mark it paid
        // or credit points; the operator reconciles the charge out of band
        if order.status.is_terminal() {
            txn.abort()?;
            tracing::warn!(
                order = %order_number,
                status = %order.status,
                "Payment signal for terminal order rejected"
            );
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Confirmed,
            });
        }

        if amount_paid != order.total {
            tracing::warn!(
                order = %order_number,
                expected = %order.total,
                received = %amount_paid,
                "Payment amount differs from order total"
            );
        }

        order.payment_status = PaymentStatus::Paid;
        order.updated_at = now;

        let confirmed = order.status == OrderStatus::Pending;
        if confirmed {
            order.status = OrderStatus::Confirmed;
        }

        let result = (|| -> OrderResult<()> {
            self.credit_if_due(&txn, &mut order, now)?;

            let request_invoice = !order.invoice_requested && order.total > Decimal::ZERO;
            if request_invoice {
                order.invoice_requested = true;
            }

            self.storage.put_order(&txn, &order)?;
            if confirmed {
                self.storage.append_history(
                    &txn,
                    &OrderStatusHistory {
                        order_number: order.order_number.clone(),
                        status: OrderStatus::Confirmed,
                        notes: Some("Payment received".to_string()),
                        actor: "payment-gateway".to_string(),
                        timestamp: now,
                    },
                )?;
            }
            Ok(())
        })();
        if let Err(e) = result {
            txn.abort()?;
            return Err(e);
        }
        txn.commit()?;

        tracing::info!(order = %order_number, amount = %amount_paid, "Payment confirmed");

        if confirmed
            && let Err(e) = self
                .notifier
                .order_status_changed(&order, OrderStatus::Confirmed)
                .await
        {
            tracing::warn!(order = %order_number, error = %e, "Status notification failed");
        }
        if order.invoice_requested
            && let Err(e) = self.invoice.create_invoice_for_order(&order).await
        {
            tracing::warn!(order = %order_number, error = %e, "Invoice request failed");
        }

        Ok(order)
    }

    /// Cancel an order (allowed from any non-terminal state)
    pub async fn cancel(
        &self,
        order_number: &str,
        notes: Option<String>,
        actor: &str,
    ) -> OrderResult<Order> {
        self.transition(order_number, OrderStatus::Cancelled, notes, actor)
            .await
    }

    fn apply_transition(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
        new_status: OrderStatus,
        notes: Option<String>,
        actor: &str,
        now: i64,
    ) -> OrderResult<Order> {
        let mut order = self
            .storage
            .get_order_for_update(txn, order_number)?
            .ok_or_else(|| OrderError::NotFound(order_number.to_string()))?;

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }
        if new_status == OrderStatus::Confirmed
            && order.payment_status != PaymentStatus::Paid
            && order.total > Decimal::ZERO
        {
            return Err(OrderError::PaymentRequired(order_number.to_string()));
        }

        order.status = new_status;
        order.updated_at = now;
        self.credit_if_due(txn, &mut order, now)?;

        self.storage.put_order(txn, &order)?;
        self.storage.append_history(
            txn,
            &OrderStatusHistory {
                order_number: order.order_number.clone(),
                status: new_status,
                notes,
                actor: actor.to_string(),
                timestamp: now,
            },
        )?;

        Ok(order)
    }

    /// Credit loyalty points on the first state change where the order is
    /// paid, not yet credited, and worth something
    fn credit_if_due(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        now: i64,
    ) -> OrderResult<()> {
        if order.payment_status != PaymentStatus::Paid
            || order.points_earned != 0
            || order.total <= Decimal::ZERO
        {
            return Ok(());
        }
        let Some(user_id) = order.user_id.as_deref() else {
            return Ok(());
        };

        let outcome = ledger::credit_points(
            &self.storage,
            txn,
            user_id,
            &order.order_number,
            order.total,
            order.is_voucher_purchase(),
            now,
        )?;
        order.points_earned = outcome.points_earned;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InvoiceService, Notifier};
    use crate::storage::Storage;
    use async_trait::async_trait;
    use shared::models::{OrderCreate, OrderItem};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        status_calls: AtomicUsize,
        admin_calls: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn order_status_changed(
            &self,
            _order: &Order,
            _new_status: OrderStatus,
        ) -> anyhow::Result<()> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn admin_new_order(&self, _order: &Order) -> anyhow::Result<()> {
            self.admin_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingInvoice {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InvoiceService for RecordingInvoice {
        async fn create_invoice_for_order(&self, _order: &Order) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service_with(
        notifier: Arc<RecordingNotifier>,
        invoice: Arc<RecordingInvoice>,
    ) -> OrderService {
        OrderService::new(Storage::open_in_memory().unwrap(), notifier, invoice)
    }

    async fn seed_order(service: &OrderService, user_id: Option<&str>) -> Order {
        service
            .create_order(OrderCreate {
                user_id: user_id.map(String::from),
                items: vec![OrderItem::Plain {
                    design_ref: "design-1".to_string(),
                    meters: dec("10"),
                    unit_price: dec("10"),
                }],
                shipping_address: None,
                tax: Decimal::ZERO,
                shipping: Decimal::ZERO,
                discount: Decimal::ZERO,
                points_to_use: None,
                pay_with_vouchers: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let service = service_with(Arc::default(), Arc::default());
        let order = seed_order(&service, None).await;

        service
            .confirm_payment(&order.order_number, order.total)
            .await
            .unwrap();
        service
            .transition(&order.order_number, OrderStatus::Shipped, None, "ops")
            .await
            .unwrap();

        let err = service
            .transition(&order.order_number, OrderStatus::InProduction, None, "ops")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::InProduction
            }
        ));
        // Rejected transition leaves no history row
        let history = service.storage().get_history(&order.order_number).unwrap();
        assert_eq!(history.last().unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_confirm_requires_payment() {
        let service = service_with(Arc::default(), Arc::default());
        let order = seed_order(&service, None).await;

        let err = service
            .transition(&order.order_number, OrderStatus::Confirmed, None, "ops")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::PaymentRequired(_)));
    }

    #[tokio::test]
    async fn test_confirm_payment_credits_points_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let invoice = Arc::new(RecordingInvoice::default());
        let service = service_with(notifier.clone(), invoice.clone());
        let order = seed_order(&service, Some("user-1")).await;

        let paid = service
            .confirm_payment(&order.order_number, dec("100"))
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Confirmed);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.points_earned, 100);
        assert!(paid.invoice_requested);
        assert_eq!(invoice.calls.load(Ordering::SeqCst), 1);

        // Duplicate signal: no second credit, no second invoice
        let again = service
            .confirm_payment(&order.order_number, dec("100"))
            .await
            .unwrap();
        assert_eq!(again.points_earned, 100);
        assert_eq!(invoice.calls.load(Ordering::SeqCst), 1);

        let account = service
            .storage()
            .get_loyalty_account("user-1")
            .unwrap()
            .unwrap();
        assert_eq!(account.available_points, 100);
    }

    #[tokio::test]
    async fn test_late_payment_signal_on_cancelled_order_rejected() {
        let notifier = Arc::new(RecordingNotifier::default());
        let invoice = Arc::new(RecordingInvoice::default());
        let service = service_with(notifier.clone(), invoice.clone());
        let order = seed_order(&service, Some("user-1")).await;

        service
            .cancel(&order.order_number, Some("customer request".to_string()), "support")
            .await
            .unwrap();

        let err = service
            .confirm_payment(&order.order_number, order.total)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Confirmed
            }
        ));

        // The order stays cancelled and unpaid, nothing was credited
        let reloaded = service
            .storage()
            .get_order(&order.order_number)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert_eq!(reloaded.payment_status, PaymentStatus::Pending);
        assert_eq!(reloaded.points_earned, 0);
        assert!(!reloaded.invoice_requested);
        assert!(service.storage().get_loyalty_account("user-1").unwrap().is_none());
        assert_eq!(invoice.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_notification_per_accepted_transition() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service_with(notifier.clone(), Arc::default());
        let order = seed_order(&service, None).await;
        assert_eq!(notifier.admin_calls.load(Ordering::SeqCst), 1);

        service
            .confirm_payment(&order.order_number, order.total)
            .await
            .unwrap();
        assert_eq!(notifier.status_calls.load(Ordering::SeqCst), 1);

        service
            .transition(&order.order_number, OrderStatus::InProduction, None, "ops")
            .await
            .unwrap();
        assert_eq!(notifier.status_calls.load(Ordering::SeqCst), 2);

        // Rejected transition fires nothing
        let _ = service
            .transition(&order.order_number, OrderStatus::Confirmed, None, "ops")
            .await
            .unwrap_err();
        assert_eq!(notifier.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_from_any_non_terminal() {
        let service = service_with(Arc::default(), Arc::default());
        let order = seed_order(&service, None).await;

        service
            .confirm_payment(&order.order_number, order.total)
            .await
            .unwrap();
        let cancelled = service
            .cancel(&order.order_number, Some("customer request".to_string()), "support")
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        // Terminal: nothing moves out of CANCELLED
        let err = service
            .transition(&order.order_number, OrderStatus::Shipped, None, "ops")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_history_is_append_only_and_ordered() {
        let service = service_with(Arc::default(), Arc::default());
        let order = seed_order(&service, None).await;

        service
            .confirm_payment(&order.order_number, order.total)
            .await
            .unwrap();
        for status in [
            OrderStatus::InProduction,
            OrderStatus::Ready,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            service
                .transition(&order.order_number, status, None, "ops")
                .await
                .unwrap();
        }

        let history = service.storage().get_history(&order.order_number).unwrap();
        let statuses: Vec<OrderStatus> = history.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::InProduction,
                OrderStatus::Ready,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let service = service_with(Arc::default(), Arc::default());
        let err = service
            .transition("PD-404040", OrderStatus::Confirmed, None, "ops")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }
}
