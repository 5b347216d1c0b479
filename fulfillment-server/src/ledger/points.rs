//! Loyalty points crediting and redemption

use super::{LedgerError, LedgerResult};
use crate::storage::Storage;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::models::loyalty::{REDEEM_CAP_PERCENT, REDEEM_STEP_POINTS, REDEEM_STEP_VALUE};
use shared::models::{LoyaltyAccount, LoyaltyTier, PointTransaction, PointTransactionType};

/// Result of a points credit
#[derive(Debug, Clone, PartialEq)]
pub struct CreditOutcome {
    pub points_earned: i64,
    pub new_tier: LoyaltyTier,
}

/// Credit loyalty points for a paid order.
///
/// Points are `floor(amount * tier_multiplier)`; orders containing a voucher
/// purchase then get `floor(points * 1.25)` on top. The multiplier comes
/// from the tier as it stands before this order's spend is added. The
/// `credited_orders` table guarantees at most one credit per order even if
/// two callers race past the `points_earned == 0` check.
pub fn credit_points(
    storage: &Storage,
    txn: &WriteTransaction,
    user_id: &str,
    order_number: &str,
    amount_spent: Decimal,
    is_voucher_purchase: bool,
    now_ms: i64,
) -> LedgerResult<CreditOutcome> {
    if !storage.mark_order_credited(txn, order_number)? {
        return Err(LedgerError::AlreadyCredited(order_number.to_string()));
    }

    let mut account = storage
        .get_loyalty_account_for_update(txn, user_id)?
        .unwrap_or_else(|| LoyaltyAccount::new(user_id, now_ms));

    let base = (amount_spent * account.tier.multiplier()).floor();
    let mut points = base.to_i64().unwrap_or(0);
    if is_voucher_purchase {
        points = (Decimal::from(points) * Decimal::new(125, 2))
            .floor()
            .to_i64()
            .unwrap_or(0);
    }

    account.available_points += points;
    account.total_points += points;
    account.lifetime_spend += amount_spent;
    account.tier = LoyaltyTier::from_lifetime_spend(account.lifetime_spend);
    account.updated_at = now_ms;
    storage.put_loyalty_account(txn, &account)?;

    storage.append_point_transaction(
        txn,
        &PointTransaction {
            user_id: user_id.to_string(),
            points,
            tx_type: PointTransactionType::Earned,
            order_number: order_number.to_string(),
            description: format!("Points earned for order {}", order_number),
            timestamp: now_ms,
        },
    )?;

    tracing::info!(
        user = %user_id,
        order = %order_number,
        points,
        tier = ?account.tier,
        "Loyalty points credited"
    );

    Ok(CreditOutcome {
        points_earned: points,
        new_tier: account.tier,
    })
}

/// Redeem loyalty points against an order, returning the discount.
///
/// Points must be a multiple of 100, at least 100, and available; the
/// discount (100 points = 5 currency units) may not exceed 20% of the
/// order subtotal.
pub fn redeem_points(
    storage: &Storage,
    txn: &WriteTransaction,
    user_id: &str,
    order_number: &str,
    points_to_use: i64,
    order_subtotal: Decimal,
    now_ms: i64,
) -> LedgerResult<Decimal> {
    if points_to_use < REDEEM_STEP_POINTS {
        return Err(LedgerError::InvalidRedemption(format!(
            "Minimum redemption is {} points",
            REDEEM_STEP_POINTS
        )));
    }
    if points_to_use % REDEEM_STEP_POINTS != 0 {
        return Err(LedgerError::InvalidRedemption(format!(
            "Points must be a multiple of {}",
            REDEEM_STEP_POINTS
        )));
    }

    let mut account = storage
        .get_loyalty_account_for_update(txn, user_id)?
        .ok_or_else(|| LedgerError::AccountNotFound(user_id.to_string()))?;

    if points_to_use > account.available_points {
        return Err(LedgerError::InvalidRedemption(format!(
            "Requested {} points, only {} available",
            points_to_use, account.available_points
        )));
    }

    let discount = Decimal::from(points_to_use / REDEEM_STEP_POINTS) * REDEEM_STEP_VALUE;
    let cap = order_subtotal * REDEEM_CAP_PERCENT / Decimal::from(100);
    if discount > cap {
        return Err(LedgerError::InvalidRedemption(format!(
            "Discount {} exceeds 20% of subtotal ({})",
            discount, cap
        )));
    }

    account.available_points -= points_to_use;
    account.updated_at = now_ms;
    storage.put_loyalty_account(txn, &account)?;

    storage.append_point_transaction(
        txn,
        &PointTransaction {
            user_id: user_id.to_string(),
            points: -points_to_use,
            tx_type: PointTransactionType::Redeemed,
            order_number: order_number.to_string(),
            description: format!("Points redeemed on order {}", order_number),
            timestamp: now_ms,
        },
    )?;

    Ok(discount)
}
