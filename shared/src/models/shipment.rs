//! Shipment & Tracking Event Models
//!
//! One shipment per order. Tracking events are deduplicated by the
//! `(shipment_id, event_date, description)` key because carrier polling
//! is idempotent-but-repeated (cron and manual triggers overlap).

use serde::{Deserialize, Serialize};

/// Shipment status, advanced only forward by the tracking sync
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Created,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    /// Carrier reported an incidence; reachable from any non-terminal state
    Exception,
}

impl ShipmentStatus {
    /// Precedence along the normal delivery progression.
    /// EXCEPTION sits outside the ordering.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Self::Created => Some(0),
            Self::PickedUp => Some(1),
            Self::InTransit => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Exception => None,
        }
    }

    /// DELIVERED is the only terminal shipment state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether the sync may advance from `self` to `candidate`.
    ///
    /// Rules: never leave DELIVERED; EXCEPTION is reachable from any
    /// non-terminal state; recovery out of EXCEPTION is always allowed;
    /// otherwise only strictly-forward moves (stale or out-of-order
    /// carrier responses never regress the status).
    pub fn can_advance_to(&self, candidate: ShipmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if candidate == Self::Exception {
            return true;
        }
        match (self.precedence(), candidate.precedence()) {
            // Out of EXCEPTION, any concrete progression is acceptable
            (None, Some(_)) => true,
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Exception => "EXCEPTION",
        };
        write!(f, "{}", s)
    }
}

/// Shipment entity (one-to-one with an order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub order_number: String,
    /// Carrier-issued shipment reference
    pub carrier_reference: String,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub last_sync_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Recorded tracking event; uniqueness key is
/// `(shipment_id, event_date, description)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentTrackingEvent {
    pub shipment_id: String,
    pub event_date: i64,
    pub description: String,
    pub location: Option<String>,
    pub status: ShipmentStatus,
}
