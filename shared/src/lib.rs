//! Shared types for the fulfillment platform
//!
//! Domain models and error types used across the fulfillment server
//! and its clients: orders, vouchers, loyalty accounts, shipments,
//! and the unified error/response structures.

pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
