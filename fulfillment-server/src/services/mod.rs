//! External-service seams
//!
//! Async traits for everything that leaves the process: customer/admin
//! notifications, invoicing, and the shipping carrier. Production
//! implementations live here; tests substitute recording fakes.

pub mod carrier;
pub mod invoice;
pub mod notifier;

pub use carrier::{
    CarrierApi, CarrierError, CarrierLabel, CarrierShipment, CarrierTrackingEvent,
    HttpCarrierClient, map_carrier_status,
};
pub use invoice::{InvoiceService, LogInvoiceService};
pub use notifier::{LogNotifier, Notifier};
