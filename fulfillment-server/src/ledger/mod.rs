//! Prepaid-balance ledger
//!
//! All balance mutations (voucher debits, points credits and redemptions)
//! run inside the caller's write transaction. On any error the caller aborts
//! the transaction, so a failed debit never leaves a partially consumed
//! voucher behind.

mod debit;
mod points;

pub use debit::{DebitOutcome, debit_vouchers};
pub use points::{CreditOutcome, credit_points, redeem_points};

use crate::storage::StorageError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Insufficient voucher balance: need {needed} meters, {available} available")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Order already credited: {0}")]
    AlreadyCredited(String),

    #[error("Invalid redemption: {0}")]
    InvalidRedemption(String),

    #[error("Loyalty account not found: {0}")]
    AccountNotFound(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for shared::AppError {
    fn from(e: LedgerError) -> Self {
        use shared::{AppError, ErrorCode};
        match &e {
            LedgerError::Storage(_) => AppError::database(e.to_string()),
            LedgerError::InsufficientBalance { .. } => {
                AppError::insufficient_balance(e.to_string())
            }
            LedgerError::AlreadyCredited(_) => {
                AppError::with_message(ErrorCode::AlreadyExists, e.to_string())
            }
            LedgerError::InvalidRedemption(_) => {
                AppError::with_message(ErrorCode::InvalidRedemptionAmount, e.to_string())
            }
            LedgerError::AccountNotFound(_) => {
                AppError::with_message(ErrorCode::LoyaltyAccountNotFound, e.to_string())
            }
        }
    }
}
