//! Fulfillment Server - print-on-demand order core
//!
//! # Architecture
//!
//! - **Storage** (`storage`): embedded redb database; every business
//!   operation runs in one serializable write transaction
//! - **Ledger** (`ledger`): prepaid voucher debits (FIFO) and loyalty
//!   points (credit, redemption)
//! - **Orders** (`orders`): order creation and the status state machine
//! - **Shipments** (`shipments`): carrier registration and tracking sync
//! - **Services** (`services`): notifier, invoicing and carrier seams
//! - **HTTP API** (`routes`): axum routes with the unified response envelope
//!
//! # Module layout
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── storage/       # redb tables and access helpers
//! ├── ledger/        # voucher + points balance logic
//! ├── orders/        # order state machine
//! ├── shipments/     # shipment sync
//! ├── services/      # external-service traits + impls
//! ├── routes/        # HTTP handlers
//! └── utils/         # logger, clock, TTL cache
//! ```

pub mod core;
pub mod ledger;
pub mod orders;
pub mod routes;
pub mod services;
pub mod shipments;
pub mod storage;
pub mod utils;

pub use crate::core::{AppState, BackgroundTasks, Config, Server};
pub use ledger::{CreditOutcome, DebitOutcome, LedgerError};
pub use orders::{OrderError, OrderService};
pub use shipments::{ShipmentError, ShipmentService, SyncRunReport};
pub use storage::{Storage, StorageError};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
