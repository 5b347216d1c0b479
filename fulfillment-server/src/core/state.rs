//! Application state
//!
//! One [`AppState`] per process, cloned into every handler and background
//! task. All fields are shared handles, so cloning is cheap.

use std::sync::Arc;
use std::time::Duration;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::orders::OrderService;
use crate::services::{
    CarrierApi, HttpCarrierClient, InvoiceService, LogInvoiceService, LogNotifier, Notifier,
};
use crate::shipments::ShipmentService;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub orders: OrderService,
    pub shipments: ShipmentService,
}

impl AppState {
    /// Initialize production state: open the database under the data dir
    /// and wire the real carrier client with log-only notifier/invoicing
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let storage = Storage::open(config.database_path())?;
        let carrier: Arc<dyn CarrierApi> = Arc::new(HttpCarrierClient::new(config)?);
        Ok(Self::with_services(
            config.clone(),
            storage,
            Arc::new(LogNotifier),
            Arc::new(LogInvoiceService),
            carrier,
        ))
    }

    /// Assemble state from explicit parts (tests substitute fakes here)
    pub fn with_services(
        config: Config,
        storage: Storage,
        notifier: Arc<dyn Notifier>,
        invoice: Arc<dyn InvoiceService>,
        carrier: Arc<dyn CarrierApi>,
    ) -> Self {
        let orders = OrderService::new(storage.clone(), notifier, invoice);
        let shipments = ShipmentService::new(storage.clone(), carrier, orders.clone());
        Self {
            config,
            storage,
            orders,
            shipments,
        }
    }

    /// Register the periodic tracking sync
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let shipments = self.shipments.clone();
        let interval = Duration::from_secs(self.config.tracking_sync_interval_secs);
        let shutdown = tasks.shutdown_token();

        tasks.spawn("tracking_sync", TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup is quiet
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = shipments.sync_all().await {
                            tracing::error!(error = %e, "Periodic tracking sync failed");
                        }
                    }
                }
            }
        });
    }
}
