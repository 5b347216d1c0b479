//! Order creation
//!
//! Builds the order, applies an optional points redemption and the
//! prepaid-voucher payment path, all inside one write transaction. A
//! voucher shortfall aborts everything; no order row survives.

use super::{OrderError, OrderResult, OrderService};
use crate::ledger;
use crate::utils::now_ms;
use rust_decimal::Decimal;
use shared::models::{
    Order, OrderCreate, OrderItem, OrderStatus, OrderStatusHistory, PaymentStatus,
};

impl OrderService {
    /// Create a new order
    ///
    /// With `pay_with_vouchers` the print meters are debited from the
    /// user's prepaid vouchers and the meter value drops out of the total;
    /// when the whole total reaches zero the order is persisted already
    /// CONFIRMED and PAID. Without vouchers the order starts PENDING and
    /// waits for the payment signal.
    pub async fn create_order(&self, input: OrderCreate) -> OrderResult<Order> {
        if input.items.is_empty() {
            return Err(OrderError::Validation("order has no items".to_string()));
        }
        if input.pay_with_vouchers && input.user_id.is_none() {
            return Err(OrderError::Validation(
                "voucher payment requires a user".to_string(),
            ));
        }
        if input.points_to_use.is_some_and(|p| p > 0) && input.user_id.is_none() {
            return Err(OrderError::Validation(
                "points redemption requires a user".to_string(),
            ));
        }
        for item in &input.items {
            match item {
                OrderItem::Plain {
                    meters, unit_price, ..
                } => {
                    if *meters <= Decimal::ZERO || *unit_price <= Decimal::ZERO {
                        return Err(OrderError::Validation(
                            "print items need positive meters and unit price".to_string(),
                        ));
                    }
                }
                OrderItem::Prioritized {
                    meters,
                    unit_price,
                    priority_fee,
                    ..
                } => {
                    if *meters <= Decimal::ZERO
                        || *unit_price <= Decimal::ZERO
                        || *priority_fee < Decimal::ZERO
                    {
                        return Err(OrderError::Validation(
                            "print items need positive meters and prices".to_string(),
                        ));
                    }
                }
                OrderItem::VoucherPurchase {
                    meters,
                    shipments,
                    price,
                } => {
                    if *price <= Decimal::ZERO || *meters < Decimal::ZERO || *shipments < 0 {
                        return Err(OrderError::Validation(
                            "voucher purchase needs a positive price and non-negative balances"
                                .to_string(),
                        ));
                    }
                }
            }
        }
        if input.tax < Decimal::ZERO
            || input.shipping < Decimal::ZERO
            || input.discount < Decimal::ZERO
        {
            return Err(OrderError::Validation(
                "tax, shipping and discount cannot be negative".to_string(),
            ));
        }

        let now = now_ms();
        let subtotal: Decimal = input.items.iter().map(|i| i.line_total()).sum();
        let total_meters: Decimal = input.items.iter().map(|i| i.meters()).sum();
        let is_voucher_purchase = input.items.iter().any(|i| i.is_voucher_purchase());

        let txn = self.storage.begin_write()?;

        let seq = self.storage.next_counter(&txn, "order_number")?;
        let order_number = format!("PD-{:06}", seq);

        let mut shipping = input.shipping;
        let mut voucher_id = None;
        let mut covered_value = Decimal::ZERO;

        if input.pay_with_vouchers {
            // user_id presence checked above
            let user_id = input.user_id.as_deref().unwrap_or_default();
            let shipments_needed = i32::from(input.shipping_address.is_some());

            let outcome = match ledger::debit_vouchers(
                &self.storage,
                &txn,
                user_id,
                total_meters,
                shipments_needed,
                now,
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    txn.abort()?;
                    return Err(e.into());
                }
            };

            // The meter value of every print item is prepaid
            covered_value = input
                .items
                .iter()
                .map(|i| match i {
                    OrderItem::Plain {
                        meters, unit_price, ..
                    }
                    | OrderItem::Prioritized {
                        meters, unit_price, ..
                    } => *meters * *unit_price,
                    OrderItem::VoucherPurchase { .. } => Decimal::ZERO,
                })
                .sum();

            if shipments_needed > 0 && outcome.shipment_shortfall == 0 {
                shipping = Decimal::ZERO;
            }
            voucher_id = outcome.consumed_voucher_codes.first().cloned();
        }

        let mut points_used = 0;
        let mut points_discount = Decimal::ZERO;
        if let (Some(points), Some(user_id)) = (input.points_to_use, input.user_id.as_deref())
            && points > 0
        {
            points_discount = match ledger::redeem_points(
                &self.storage,
                &txn,
                user_id,
                &order_number,
                points,
                subtotal,
                now,
            ) {
                Ok(discount) => discount,
                Err(e) => {
                    txn.abort()?;
                    return Err(e.into());
                }
            };
            points_used = points;
        }

        let total = (subtotal + input.tax + shipping
            - input.discount
            - points_discount
            - covered_value)
            .max(Decimal::ZERO);

        let fully_prepaid = input.pay_with_vouchers && total == Decimal::ZERO;
        let (status, payment_status) = if fully_prepaid {
            (OrderStatus::Confirmed, PaymentStatus::Paid)
        } else {
            (OrderStatus::Pending, PaymentStatus::Pending)
        };

        let order = Order {
            order_number: order_number.clone(),
            user_id: input.user_id,
            status,
            payment_status,
            items: input.items,
            shipping_address: input.shipping_address,
            subtotal,
            tax: input.tax,
            shipping,
            discount: input.discount,
            total,
            points_earned: 0,
            points_used,
            points_discount,
            voucher_id,
            invoice_requested: false,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.persist_new_order(&txn, &order, fully_prepaid, now) {
            txn.abort()?;
            return Err(e);
        }
        txn.commit()?;

        tracing::info!(
            order = %order.order_number,
            total = %order.total,
            status = %order.status,
            voucher_purchase = is_voucher_purchase,
            "Order created"
        );

        if let Err(e) = self.notifier.admin_new_order(&order).await {
            tracing::warn!(order = %order.order_number, error = %e, "Admin notification failed");
        }
        if fully_prepaid
            && let Err(e) = self
                .notifier
                .order_status_changed(&order, OrderStatus::Confirmed)
                .await
        {
            tracing::warn!(order = %order.order_number, error = %e, "Status notification failed");
        }

        Ok(order)
    }

    fn persist_new_order(
        &self,
        txn: &redb::WriteTransaction,
        order: &Order,
        fully_prepaid: bool,
        now: i64,
    ) -> OrderResult<()> {
        self.storage.put_order(txn, order)?;
        self.storage.append_history(
            txn,
            &OrderStatusHistory {
                order_number: order.order_number.clone(),
                status: OrderStatus::Pending,
                notes: Some("Order created".to_string()),
                actor: "system".to_string(),
                timestamp: now,
            },
        )?;
        if fully_prepaid {
            self.storage.append_history(
                txn,
                &OrderStatusHistory {
                    order_number: order.order_number.clone(),
                    status: OrderStatus::Confirmed,
                    notes: Some("Fully covered by prepaid vouchers".to_string()),
                    actor: "system".to_string(),
                    timestamp: now,
                },
            )?;
        }
        Ok(())
    }
}
