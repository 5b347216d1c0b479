//! Unified error codes for the fulfillment platform
//!
//! Error codes are shared between the server and its clients and are
//! organized by range:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Ledger errors (vouchers, loyalty points)
//! - 6xxx: Shipment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Transition would move the order backward or out of a terminal state
    InvalidTransition = 4002,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4003,
    /// Order has already been delivered
    OrderAlreadyDelivered = 4004,
    /// Order has no shipping address
    MissingShippingAddress = 4005,
    /// Order must be paid before this transition
    PaymentRequired = 4006,
    /// Order has no items
    OrderEmpty = 4007,

    // ==================== 5xxx: Ledger ====================
    /// Voucher meters cannot cover the requested debit
    InsufficientBalance = 5001,
    /// Points redemption violates the redemption rules
    InvalidRedemptionAmount = 5002,
    /// Voucher not found
    VoucherNotFound = 5003,
    /// Voucher has expired
    VoucherExpired = 5004,
    /// Voucher code already exists
    VoucherCodeExists = 5005,
    /// Loyalty account not found
    LoyaltyAccountNotFound = 5006,

    // ==================== 6xxx: Shipment ====================
    /// Shipment not found
    ShipmentNotFound = 6001,
    /// Order already has a shipment
    DuplicateShipment = 6002,
    /// Carrier API timed out or returned a server error
    CarrierUnavailable = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid order status transition",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderAlreadyDelivered => "Order has already been delivered",
            ErrorCode::MissingShippingAddress => "Order has no shipping address",
            ErrorCode::PaymentRequired => "Order must be paid first",
            ErrorCode::OrderEmpty => "Order has no items",

            // Ledger
            ErrorCode::InsufficientBalance => "Insufficient voucher balance",
            ErrorCode::InvalidRedemptionAmount => "Invalid points redemption amount",
            ErrorCode::VoucherNotFound => "Voucher not found",
            ErrorCode::VoucherExpired => "Voucher has expired",
            ErrorCode::VoucherCodeExists => "Voucher code already exists",
            ErrorCode::LoyaltyAccountNotFound => "Loyalty account not found",

            // Shipment
            ErrorCode::ShipmentNotFound => "Shipment not found",
            ErrorCode::DuplicateShipment => "Order already has a shipment",
            ErrorCode::CarrierUnavailable => "Carrier API is unavailable",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderAlreadyCancelled),
            4004 => Ok(ErrorCode::OrderAlreadyDelivered),
            4005 => Ok(ErrorCode::MissingShippingAddress),
            4006 => Ok(ErrorCode::PaymentRequired),
            4007 => Ok(ErrorCode::OrderEmpty),

            // Ledger
            5001 => Ok(ErrorCode::InsufficientBalance),
            5002 => Ok(ErrorCode::InvalidRedemptionAmount),
            5003 => Ok(ErrorCode::VoucherNotFound),
            5004 => Ok(ErrorCode::VoucherExpired),
            5005 => Ok(ErrorCode::VoucherCodeExists),
            5006 => Ok(ErrorCode::LoyaltyAccountNotFound),

            // Shipment
            6001 => Ok(ErrorCode::ShipmentNotFound),
            6002 => Ok(ErrorCode::DuplicateShipment),
            6003 => Ok(ErrorCode::CarrierUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            other => Err(InvalidErrorCode(other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InsufficientBalance.code(), 5001);
        assert_eq!(ErrorCode::DuplicateShipment.code(), 6002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidTransition,
            ErrorCode::InsufficientBalance,
            ErrorCode::InvalidRedemptionAmount,
            ErrorCode::CarrierUnavailable,
            ErrorCode::DatabaseError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::InsufficientBalance.to_string(), "E5001");
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
    }

    #[test]
    fn test_serialize_as_u16() {
        let json = serde_json::to_string(&ErrorCode::InsufficientBalance).unwrap();
        assert_eq!(json, "5001");
        let code: ErrorCode = serde_json::from_str("4002").unwrap();
        assert_eq!(code, ErrorCode::InvalidTransition);
    }
}
