//! Shipment creation and tracking sync
//!
//! One shipment per order. The carrier is polled (periodically and on
//! demand) rather than trusted to push; polling is safe to repeat because
//! event insertion dedups on `(shipment_id, event_date, description)` and
//! status only ever advances.

mod sync;

pub use sync::{SyncFailure, SyncRunReport};

use crate::orders::{OrderError, OrderService};
use crate::services::{CarrierApi, CarrierError};
use crate::storage::{Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Shipment not found: {0}")]
    NotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order {0} already has a shipment")]
    Duplicate(String),

    #[error("Order {0} has no shipping address")]
    MissingAddress(String),
}

pub type ShipmentResult<T> = Result<T, ShipmentError>;

impl From<ShipmentError> for shared::AppError {
    fn from(e: ShipmentError) -> Self {
        use shared::{AppError, ErrorCode};
        let msg = e.to_string();
        match e {
            ShipmentError::Storage(_) => AppError::database(msg),
            ShipmentError::Carrier(_) => AppError::carrier_unavailable(msg),
            ShipmentError::Order(inner) => inner.into(),
            ShipmentError::NotFound(_) => {
                AppError::with_message(ErrorCode::ShipmentNotFound, msg)
            }
            ShipmentError::OrderNotFound(_) => {
                AppError::with_message(ErrorCode::OrderNotFound, msg)
            }
            ShipmentError::Duplicate(_) => {
                AppError::with_message(ErrorCode::DuplicateShipment, msg)
            }
            ShipmentError::MissingAddress(_) => {
                AppError::with_message(ErrorCode::MissingShippingAddress, msg)
            }
        }
    }
}

impl From<redb::CommitError> for ShipmentError {
    fn from(e: redb::CommitError) -> Self {
        ShipmentError::Storage(e.into())
    }
}

impl From<redb::StorageError> for ShipmentError {
    fn from(e: redb::StorageError) -> Self {
        ShipmentError::Storage(e.into())
    }
}

/// Shipment service
#[derive(Clone)]
pub struct ShipmentService {
    storage: Storage,
    carrier: Arc<dyn CarrierApi>,
    orders: OrderService,
}

impl ShipmentService {
    pub fn new(storage: Storage, carrier: Arc<dyn CarrierApi>, orders: OrderService) -> Self {
        Self {
            storage,
            carrier,
            orders,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Shipping label passthrough for operators (base64 PDF)
    pub async fn get_label(
        &self,
        shipment_id: &str,
    ) -> ShipmentResult<crate::services::CarrierLabel> {
        let shipment = self
            .storage
            .get_shipment(shipment_id)?
            .ok_or_else(|| ShipmentError::NotFound(shipment_id.to_string()))?;
        Ok(self.carrier.get_label(&shipment.carrier_reference).await?)
    }
}
