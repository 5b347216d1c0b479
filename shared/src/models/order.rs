//! Order Model
//!
//! The order's `status` and `payment_status` are orthogonal axes. Status
//! moves strictly forward along a fixed precedence ordering; CANCELLED is
//! reachable from any non-terminal state. All monetary fields are
//! fixed-point [`Decimal`], never floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order fulfillment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProduction,
    Ready,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Fixed precedence ordering used to reject backward transitions.
    /// CANCELLED sits outside the ordering (reachable from anywhere
    /// non-terminal, terminal itself).
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::InProduction => Some(2),
            Self::Ready => Some(3),
            Self::Shipped => Some(4),
            Self::Delivered => Some(5),
            Self::Cancelled => None,
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a transition from `self` to `new` is permitted
    pub fn can_transition_to(&self, new: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if new == Self::Cancelled {
            return true;
        }
        match (self.precedence(), new.precedence()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProduction => "IN_PRODUCTION",
            Self::Ready => "READY",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Payment status (orthogonal to fulfillment status)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Shipping address for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order line item
///
/// Tagged variants instead of an open JSON map: each known item shape is
/// modeled explicitly and validated at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItem {
    /// Purchase of a prepaid voucher (meters + free shipments)
    VoucherPurchase {
        meters: Decimal,
        shipments: i32,
        price: Decimal,
    },
    /// Print job with priority production surcharge
    Prioritized {
        design_ref: String,
        meters: Decimal,
        unit_price: Decimal,
        priority_fee: Decimal,
    },
    /// Regular print job
    Plain {
        design_ref: String,
        meters: Decimal,
        unit_price: Decimal,
    },
}

impl OrderItem {
    /// Fabric meters this item consumes (zero for voucher purchases)
    pub fn meters(&self) -> Decimal {
        match self {
            Self::VoucherPurchase { .. } => Decimal::ZERO,
            Self::Prioritized { meters, .. } | Self::Plain { meters, .. } => *meters,
        }
    }

    /// Line total for this item
    pub fn line_total(&self) -> Decimal {
        match self {
            Self::VoucherPurchase { price, .. } => *price,
            Self::Prioritized {
                meters,
                unit_price,
                priority_fee,
                ..
            } => meters * unit_price + priority_fee,
            Self::Plain {
                meters, unit_price, ..
            } => meters * unit_price,
        }
    }

    pub fn is_voucher_purchase(&self) -> bool {
        matches!(self, Self::VoucherPurchase { .. })
    }
}

/// Order entity
///
/// Identity (`order_number`) is immutable after creation; only status
/// fields and derived totals change. Items and history are owned
/// sub-entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique, human-readable order number (e.g. "PD-000042")
    pub order_number: String,
    pub user_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    /// Loyalty points credited for this order; non-zero means already
    /// credited (double-credit guard)
    pub points_earned: i64,
    pub points_used: i64,
    pub points_discount: Decimal,
    /// First voucher consumed paying for this order (audit trail)
    pub voucher_id: Option<String>,
    /// Invoice has been requested for this order (once, total > 0 only)
    pub invoice_requested: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Total fabric meters across all print items
    pub fn total_meters(&self) -> Decimal {
        self.items.iter().map(|i| i.meters()).sum()
    }

    /// Whether this order buys at least one voucher (earns the 1.25x
    /// points bonus)
    pub fn is_voucher_purchase(&self) -> bool {
        self.items.iter().any(|i| i.is_voucher_purchase())
    }
}

/// Append-only order status history entry; never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub order_number: String,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub actor: String,
    pub timestamp: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    /// Loyalty points to redeem against this order (multiple of 100)
    pub points_to_use: Option<i64>,
    /// Cover print meters from the user's prepaid vouchers
    pub pay_with_vouchers: bool,
}
