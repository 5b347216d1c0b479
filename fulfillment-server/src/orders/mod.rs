//! Order state machine
//!
//! Creation, the status transition engine, payment confirmation and
//! cancellation. Every state change commits atomically with its side
//! effects on the ledger (voucher debits, points credits); notifications
//! and invoices run after commit and never affect the outcome.

mod create;
mod transition;

use crate::ledger::LedgerError;
use crate::services::{InvoiceService, Notifier};
use crate::storage::{Storage, StorageError};
use shared::models::OrderStatus;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Payment required before order {0} can be confirmed")]
    PaymentRequired(String),

    #[error("Invalid order: {0}")]
    Validation(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for shared::AppError {
    fn from(e: OrderError) -> Self {
        use shared::{AppError, ErrorCode};
        let msg = e.to_string();
        match e {
            OrderError::Storage(_) => AppError::database(msg),
            OrderError::Ledger(inner) => inner.into(),
            OrderError::NotFound(_) => AppError::with_message(ErrorCode::OrderNotFound, msg),
            OrderError::InvalidTransition { .. } => AppError::invalid_transition(msg),
            OrderError::PaymentRequired(_) => {
                AppError::with_message(ErrorCode::PaymentRequired, msg)
            }
            OrderError::Validation(_) => AppError::validation(msg),
        }
    }
}

impl From<redb::CommitError> for OrderError {
    fn from(e: redb::CommitError) -> Self {
        OrderError::Storage(e.into())
    }
}

impl From<redb::StorageError> for OrderError {
    fn from(e: redb::StorageError) -> Self {
        OrderError::Storage(e.into())
    }
}

/// Order service
///
/// Cheap to clone; the storage handle and service seams are shared.
#[derive(Clone)]
pub struct OrderService {
    storage: Storage,
    notifier: Arc<dyn Notifier>,
    invoice: Arc<dyn InvoiceService>,
}

impl OrderService {
    pub fn new(
        storage: Storage,
        notifier: Arc<dyn Notifier>,
        invoice: Arc<dyn InvoiceService>,
    ) -> Self {
        Self {
            storage,
            notifier,
            invoice,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
