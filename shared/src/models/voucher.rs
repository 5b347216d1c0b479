//! Voucher Model
//!
//! Prepaid balances (fabric meters + free shipments). Balances are
//! monotonically non-increasing outside administrative correction and are
//! mutated only by the server's ledger, inside the transaction of the
//! order that triggered the mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Voucher type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    /// Prepaid fabric meters (optionally bundled with free shipments)
    Meters,
    /// Fixed discount amount
    DiscountAmount,
    /// Percentage discount
    DiscountPercent,
}

/// Voucher entity
///
/// Invariant: `remaining_meters <= initial_meters` and
/// `remaining_shipments <= initial_shipments` at all times. `created_at`
/// is the FIFO ordering key: oldest vouchers are depleted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique voucher code
    pub code: String,
    pub voucher_type: VoucherType,
    /// Owner; None only for unassigned templates
    pub user_id: Option<String>,
    pub initial_meters: Decimal,
    pub remaining_meters: Decimal,
    pub initial_shipments: i32,
    pub remaining_shipments: i32,
    /// Derived: false once both balances reach 0 or expiry passes
    pub is_active: bool,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Voucher {
    /// Whether this voucher is expired at `now_ms`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|e| e <= now_ms)
    }

    /// Whether the ledger may debit meters from this voucher at `now_ms`.
    /// Only METERS vouchers carry a debitable balance; discount vouchers
    /// never enter the FIFO selection.
    pub fn is_debitable(&self, now_ms: i64) -> bool {
        self.voucher_type == VoucherType::Meters
            && self.is_active
            && !self.is_expired(now_ms)
            && self.remaining_meters > Decimal::ZERO
    }

    /// Recompute the derived `is_active` flag from balances and expiry
    pub fn recompute_active(&mut self, now_ms: i64) {
        self.is_active = !self.is_expired(now_ms)
            && (self.remaining_meters > Decimal::ZERO || self.remaining_shipments > 0);
    }
}

/// Create voucher payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCreate {
    pub code: String,
    pub voucher_type: VoucherType,
    pub user_id: Option<String>,
    pub meters: Decimal,
    pub shipments: i32,
    pub expires_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn voucher(meters: &str, shipments: i32, expires_at: Option<i64>) -> Voucher {
        Voucher {
            code: "V-1".to_string(),
            voucher_type: VoucherType::Meters,
            user_id: Some("user-1".to_string()),
            initial_meters: dec(meters),
            remaining_meters: dec(meters),
            initial_shipments: shipments,
            remaining_shipments: shipments,
            is_active: true,
            expires_at,
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn test_debitable_requires_meters() {
        let mut v = voucher("5", 1, None);
        assert!(v.is_debitable(2_000));

        v.remaining_meters = Decimal::ZERO;
        assert!(!v.is_debitable(2_000));
    }

    #[test]
    fn test_only_meters_vouchers_are_debitable() {
        let mut v = voucher("5", 1, None);
        v.voucher_type = VoucherType::DiscountAmount;
        assert!(!v.is_debitable(2_000));

        v.voucher_type = VoucherType::DiscountPercent;
        assert!(!v.is_debitable(2_000));

        v.voucher_type = VoucherType::Meters;
        assert!(v.is_debitable(2_000));
    }

    #[test]
    fn test_expiry() {
        let v = voucher("5", 1, Some(10_000));
        assert!(!v.is_expired(9_999));
        assert!(v.is_expired(10_000));
        assert!(!v.is_debitable(10_000));
    }

    #[test]
    fn test_recompute_active_stays_on_with_shipments_left() {
        // Meters exhausted but a free shipment remains: still active
        let mut v = voucher("5", 1, None);
        v.remaining_meters = Decimal::ZERO;
        v.recompute_active(2_000);
        assert!(v.is_active);

        v.remaining_shipments = 0;
        v.recompute_active(2_000);
        assert!(!v.is_active);
    }

    #[test]
    fn test_recompute_active_expired() {
        let mut v = voucher("5", 1, Some(1_500));
        v.recompute_active(2_000);
        assert!(!v.is_active);
    }
}
