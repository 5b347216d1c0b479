//! Loyalty Account & Point Transaction Models
//!
//! One account per user. The point transaction log is append-only and the
//! sum of its entries must equal the account's available balance at all
//! times (reconciliation invariant, checked by the ledger's tests).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Points required per redemption step
pub const REDEEM_STEP_POINTS: i64 = 100;
/// Currency value of one redemption step (100 points = 5 currency units)
pub const REDEEM_STEP_VALUE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
/// Redemption cap as a percentage of the order subtotal
pub const REDEEM_CAP_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Loyalty tier, derived from lifetime spend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Tier from lifetime spend, fixed breakpoints 0/200/500/1000
    pub fn from_lifetime_spend(spend: Decimal) -> Self {
        if spend >= Decimal::from(1000) {
            Self::Platinum
        } else if spend >= Decimal::from(500) {
            Self::Gold
        } else if spend >= Decimal::from(200) {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    /// Points-earning multiplier for this tier
    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Bronze => Decimal::from(1),
            Self::Silver => Decimal::new(125, 2),
            Self::Gold => Decimal::new(150, 2),
            Self::Platinum => Decimal::from(2),
        }
    }
}

/// Loyalty account entity (one per user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub user_id: String,
    pub available_points: i64,
    /// Lifetime points earned (never decremented by redemption)
    pub total_points: i64,
    /// Lifetime spend, drives the tier
    pub lifetime_spend: Decimal,
    pub tier: LoyaltyTier,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LoyaltyAccount {
    pub fn new(user_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            user_id: user_id.into(),
            available_points: 0,
            total_points: 0,
            lifetime_spend: Decimal::ZERO,
            tier: LoyaltyTier::Bronze,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Point transaction type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointTransactionType {
    Earned,
    Redeemed,
}

/// Append-only point ledger entry
///
/// `points` is positive for earned entries and negative for redemptions,
/// so the running sum of a user's entries equals the available balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    pub user_id: String,
    pub points: i64,
    pub tx_type: PointTransactionType,
    pub order_number: String,
    pub description: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_tier_breakpoints() {
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(Decimal::ZERO),
            LoyaltyTier::Bronze
        );
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(dec("199.99")),
            LoyaltyTier::Bronze
        );
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(dec("200")),
            LoyaltyTier::Silver
        );
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(dec("499.99")),
            LoyaltyTier::Silver
        );
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(dec("500")),
            LoyaltyTier::Gold
        );
        assert_eq!(
            LoyaltyTier::from_lifetime_spend(dec("1000")),
            LoyaltyTier::Platinum
        );
    }

    #[test]
    fn test_tier_multipliers() {
        assert_eq!(LoyaltyTier::Bronze.multiplier(), dec("1"));
        assert_eq!(LoyaltyTier::Silver.multiplier(), dec("1.25"));
        assert_eq!(LoyaltyTier::Gold.multiplier(), dec("1.50"));
        assert_eq!(LoyaltyTier::Platinum.multiplier(), dec("2"));
    }

    #[test]
    fn test_redeem_constants() {
        assert_eq!(REDEEM_STEP_VALUE, dec("5"));
        assert_eq!(REDEEM_CAP_PERCENT, dec("20"));
    }

    #[test]
    fn test_new_account_starts_bronze() {
        let account = LoyaltyAccount::new("user-1", 1_000);
        assert_eq!(account.tier, LoyaltyTier::Bronze);
        assert_eq!(account.available_points, 0);
        assert_eq!(account.lifetime_spend, Decimal::ZERO);
    }
}
