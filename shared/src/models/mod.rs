//! Domain models for the fulfillment platform
//!
//! Plain serde-serializable entities shared between the server and its
//! clients. Balance-mutating logic lives in the server's ledger; these
//! types only carry state and derive-level helpers.

pub mod loyalty;
pub mod order;
pub mod shipment;
pub mod voucher;

pub use loyalty::{LoyaltyAccount, LoyaltyTier, PointTransaction, PointTransactionType};
pub use order::{
    Order, OrderCreate, OrderItem, OrderStatus, OrderStatusHistory, PaymentStatus, ShippingAddress,
};
pub use shipment::{Shipment, ShipmentStatus, ShipmentTrackingEvent};
pub use voucher::{Voucher, VoucherCreate, VoucherType};
