//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::VoucherNotFound
            | Self::LoyaltyAccountNotFound
            | Self::ShipmentNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderAlreadyCancelled
            | Self::OrderAlreadyDelivered
            | Self::VoucherCodeExists
            | Self::DuplicateShipment => StatusCode::CONFLICT,

            // 422 Unprocessable Entity - business rule violations
            Self::InvalidTransition
            | Self::PaymentRequired
            | Self::InsufficientBalance
            | Self::InvalidRedemptionAmount
            | Self::VoucherExpired => StatusCode::UNPROCESSABLE_ENTITY,

            // 400 Bad Request
            Self::Unknown
            | Self::ValidationFailed
            | Self::InvalidRequest
            | Self::MissingShippingAddress
            | Self::OrderEmpty => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway - upstream carrier failures
            Self::CarrierUnavailable => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::NetworkError
            | Self::TimeoutError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::DuplicateShipment.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::InsufficientBalance.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::CarrierUnavailable.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
