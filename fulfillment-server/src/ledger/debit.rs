//! FIFO voucher debit

use super::{LedgerError, LedgerResult};
use crate::storage::Storage;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::VoucherType;

/// Result of a voucher debit
#[derive(Debug, Clone, PartialEq)]
pub struct DebitOutcome {
    /// Codes of the vouchers that lost meters or shipments, in consumption
    /// order (kept on the order as its audit trail)
    pub consumed_voucher_codes: Vec<String>,
    /// Free shipments that could not be covered. Non-fatal: the order
    /// charges shipping for the remainder instead.
    pub shipment_shortfall: i32,
}

/// Debit `meters_needed` fabric meters and up to `shipments_needed` free
/// shipments from `user_id`'s vouchers, oldest first.
///
/// Meters and shipments are depleted independently: a voucher whose meters
/// are exhausted can still cover a shipment and vice versa. A meter
/// shortfall is an error and the caller must abort the transaction; a
/// shipment shortfall is reported in the outcome and logged.
pub fn debit_vouchers(
    storage: &Storage,
    txn: &WriteTransaction,
    user_id: &str,
    meters_needed: Decimal,
    shipments_needed: i32,
    now_ms: i64,
) -> LedgerResult<DebitOutcome> {
    let mut vouchers = storage.user_vouchers_fifo(txn, user_id)?;

    // Check meter coverage up front so a shortfall touches nothing
    let available: Decimal = vouchers
        .iter()
        .filter(|v| v.is_debitable(now_ms))
        .map(|v| v.remaining_meters)
        .sum();
    if available < meters_needed {
        return Err(LedgerError::InsufficientBalance {
            needed: meters_needed,
            available,
        });
    }

    let mut consumed: Vec<String> = Vec::new();
    let mut meters_left = meters_needed;
    let mut shipments_left = shipments_needed;

    for voucher in vouchers.iter_mut() {
        if meters_left <= Decimal::ZERO && shipments_left <= 0 {
            break;
        }
        let mut touched = false;

        if meters_left > Decimal::ZERO && voucher.is_debitable(now_ms) {
            let take = voucher.remaining_meters.min(meters_left);
            if take > Decimal::ZERO {
                voucher.remaining_meters -= take;
                meters_left -= take;
                touched = true;
            }
        }

        if shipments_left > 0
            && voucher.voucher_type == VoucherType::Meters
            && voucher.is_active
            && !voucher.is_expired(now_ms)
            && voucher.remaining_shipments > 0
        {
            let take = voucher.remaining_shipments.min(shipments_left);
            voucher.remaining_shipments -= take;
            shipments_left -= take;
            touched = true;
        }

        if touched {
            voucher.recompute_active(now_ms);
            voucher.updated_at = now_ms;
            storage.update_voucher(txn, voucher)?;
            consumed.push(voucher.code.clone());
        }
    }

    if shipments_left > 0 {
        tracing::warn!(
            user = %user_id,
            shortfall = shipments_left,
            "Voucher balance could not cover all free shipments"
        );
    }

    Ok(DebitOutcome {
        consumed_voucher_codes: consumed,
        shipment_shortfall: shipments_left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Voucher;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn voucher(code: &str, meters: &str, shipments: i32, created_at: i64) -> Voucher {
        Voucher {
            code: code.to_string(),
            voucher_type: VoucherType::Meters,
            user_id: Some("user-1".to_string()),
            initial_meters: dec(meters),
            remaining_meters: dec(meters),
            initial_shipments: shipments,
            remaining_shipments: shipments,
            is_active: true,
            expires_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn seed(storage: &Storage, vouchers: &[Voucher]) {
        let txn = storage.begin_write().unwrap();
        for v in vouchers {
            storage.insert_voucher(&txn, v).unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn test_fifo_consumption_order() {
        let storage = Storage::open_in_memory().unwrap();
        seed(
            &storage,
            &[
                voucher("V-NEW", "10", 0, 3_000),
                voucher("V-OLD", "3", 0, 1_000),
                voucher("V-MID", "4", 0, 2_000),
            ],
        );

        let txn = storage.begin_write().unwrap();
        let outcome =
            debit_vouchers(&storage, &txn, "user-1", dec("8"), 0, 5_000).unwrap();
        txn.commit().unwrap();

        // Oldest first: 3 from V-OLD, 4 from V-MID, 1 from V-NEW
        assert_eq!(outcome.consumed_voucher_codes, vec!["V-OLD", "V-MID", "V-NEW"]);
        assert_eq!(
            storage.get_voucher("V-OLD").unwrap().unwrap().remaining_meters,
            Decimal::ZERO
        );
        assert_eq!(
            storage.get_voucher("V-MID").unwrap().unwrap().remaining_meters,
            Decimal::ZERO
        );
        assert_eq!(
            storage.get_voucher("V-NEW").unwrap().unwrap().remaining_meters,
            dec("9")
        );
    }

    #[test]
    fn test_insufficient_balance_writes_nothing() {
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage, &[voucher("V-1", "3", 0, 1_000)]);

        let txn = storage.begin_write().unwrap();
        let err = debit_vouchers(&storage, &txn, "user-1", dec("5"), 0, 5_000).unwrap_err();
        txn.abort().unwrap();

        match err {
            LedgerError::InsufficientBalance { needed, available } => {
                assert_eq!(needed, dec("5"));
                assert_eq!(available, dec("3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            storage.get_voucher("V-1").unwrap().unwrap().remaining_meters,
            dec("3")
        );
    }

    #[test]
    fn test_expired_voucher_skipped() {
        let storage = Storage::open_in_memory().unwrap();
        let mut expired = voucher("V-EXP", "10", 0, 1_000);
        expired.expires_at = Some(4_000);
        seed(&storage, &[expired, voucher("V-OK", "10", 0, 2_000)]);

        let txn = storage.begin_write().unwrap();
        let outcome =
            debit_vouchers(&storage, &txn, "user-1", dec("6"), 0, 5_000).unwrap();
        txn.commit().unwrap();

        assert_eq!(outcome.consumed_voucher_codes, vec!["V-OK"]);
        assert_eq!(
            storage.get_voucher("V-EXP").unwrap().unwrap().remaining_meters,
            dec("10")
        );
    }

    #[test]
    fn test_shipments_deducted_independently() {
        let storage = Storage::open_in_memory().unwrap();
        // V-A has shipments but no meters left; V-B has meters only
        let mut a = voucher("V-A", "5", 2, 1_000);
        a.remaining_meters = Decimal::ZERO;
        seed(&storage, &[a, voucher("V-B", "10", 0, 2_000)]);

        let txn = storage.begin_write().unwrap();
        let outcome =
            debit_vouchers(&storage, &txn, "user-1", dec("4"), 1, 5_000).unwrap();
        txn.commit().unwrap();

        assert_eq!(outcome.shipment_shortfall, 0);
        assert_eq!(outcome.consumed_voucher_codes, vec!["V-A", "V-B"]);
        assert_eq!(
            storage.get_voucher("V-A").unwrap().unwrap().remaining_shipments,
            1
        );
        assert_eq!(
            storage.get_voucher("V-B").unwrap().unwrap().remaining_meters,
            dec("6")
        );
    }

    #[test]
    fn test_shipment_shortfall_is_not_fatal() {
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage, &[voucher("V-1", "10", 1, 1_000)]);

        let txn = storage.begin_write().unwrap();
        let outcome =
            debit_vouchers(&storage, &txn, "user-1", dec("2"), 3, 5_000).unwrap();
        txn.commit().unwrap();

        assert_eq!(outcome.shipment_shortfall, 2);
        assert_eq!(
            storage.get_voucher("V-1").unwrap().unwrap().remaining_shipments,
            0
        );
    }

    #[test]
    fn test_depleted_voucher_deactivated() {
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage, &[voucher("V-1", "5", 0, 1_000)]);

        let txn = storage.begin_write().unwrap();
        debit_vouchers(&storage, &txn, "user-1", dec("5"), 0, 5_000).unwrap();
        txn.commit().unwrap();

        let v = storage.get_voucher("V-1").unwrap().unwrap();
        assert_eq!(v.remaining_meters, Decimal::ZERO);
        assert!(!v.is_active);
    }

    #[test]
    fn test_discount_vouchers_never_debited() {
        let storage = Storage::open_in_memory().unwrap();
        let mut discount = voucher("V-DISC", "10", 1, 1_000);
        discount.voucher_type = VoucherType::DiscountAmount;
        seed(&storage, &[discount]);

        // Only a discount voucher on file: meters cannot be covered
        let txn = storage.begin_write().unwrap();
        let err = debit_vouchers(&storage, &txn, "user-1", dec("4"), 1, 5_000).unwrap_err();
        txn.abort().unwrap();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

        let v = storage.get_voucher("V-DISC").unwrap().unwrap();
        assert_eq!(v.remaining_meters, dec("10"));
        assert_eq!(v.remaining_shipments, 1);

        // With a METERS voucher alongside, the discount one stays untouched
        seed(&storage, &[voucher("V-M", "4", 1, 2_000)]);
        let txn = storage.begin_write().unwrap();
        let outcome = debit_vouchers(&storage, &txn, "user-1", dec("4"), 1, 5_000).unwrap();
        txn.commit().unwrap();

        assert_eq!(outcome.consumed_voucher_codes, vec!["V-M".to_string()]);
        assert_eq!(outcome.shipment_shortfall, 0);
        let v = storage.get_voucher("V-DISC").unwrap().unwrap();
        assert_eq!(v.remaining_meters, dec("10"));
        assert_eq!(v.remaining_shipments, 1);
    }

    #[test]
    fn test_exhausting_meters_keeps_shipments_usable_once() {
        let storage = Storage::open_in_memory().unwrap();
        seed(&storage, &[voucher("V-1", "12", 2, 1_000)]);

        // First order: 12 meters and 1 shipment drain the meters entirely
        let txn = storage.begin_write().unwrap();
        let outcome = debit_vouchers(&storage, &txn, "user-1", dec("12"), 1, 5_000).unwrap();
        txn.commit().unwrap();
        assert_eq!(outcome.shipment_shortfall, 0);

        let v = storage.get_voucher("V-1").unwrap().unwrap();
        assert_eq!(v.remaining_meters, Decimal::ZERO);
        assert_eq!(v.remaining_shipments, 1);
        assert!(v.is_active);

        // An identical second order finds no meters and changes nothing
        let txn = storage.begin_write().unwrap();
        let err = debit_vouchers(&storage, &txn, "user-1", dec("12"), 1, 6_000).unwrap_err();
        txn.abort().unwrap();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

        let v = storage.get_voucher("V-1").unwrap().unwrap();
        assert_eq!(v.remaining_meters, Decimal::ZERO);
        assert_eq!(v.remaining_shipments, 1);
        assert!(v.is_active);
    }
}
