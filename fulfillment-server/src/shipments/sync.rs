//! Shipment creation, single-shipment sync and the batch run

use super::{ShipmentError, ShipmentResult, ShipmentService};
use crate::services::map_carrier_status;
use crate::utils::now_ms;
use serde::Serialize;
use shared::models::{OrderStatus, Shipment, ShipmentStatus, ShipmentTrackingEvent};
use uuid::Uuid;

/// Outcome of one batch sync run, returned to operators
#[derive(Debug, Clone, Serialize)]
pub struct SyncRunReport {
    pub total: usize,
    pub synced: usize,
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub shipment_id: String,
    pub error: String,
}

impl ShipmentService {
    /// Register a shipment for an order with the carrier and persist it
    ///
    /// The order must have a shipping address and no shipment yet. The
    /// order's own status is not touched; production flow drives that.
    pub async fn create_shipment(&self, order_number: &str) -> ShipmentResult<Shipment> {
        let order = self
            .storage
            .get_order(order_number)?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_number.to_string()))?;
        if order.shipping_address.is_none() {
            return Err(ShipmentError::MissingAddress(order_number.to_string()));
        }
        if self.storage.get_shipment_by_order(order_number)?.is_some() {
            return Err(ShipmentError::Duplicate(order_number.to_string()));
        }

        let carrier_shipment = self.carrier.create_shipment(&order).await?;

        let now = now_ms();
        let shipment = Shipment {
            id: Uuid::new_v4().to_string(),
            order_number: order_number.to_string(),
            carrier_reference: carrier_shipment.reference,
            tracking_number: carrier_shipment.tracking_number,
            status: ShipmentStatus::Created,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        // Re-check under the write transaction; the carrier call is slow
        // enough for a second request to slip in
        if self.storage.order_has_shipment(&txn, order_number)? {
            txn.abort()?;
            return Err(ShipmentError::Duplicate(order_number.to_string()));
        }
        self.storage.insert_shipment(&txn, &shipment)?;
        txn.commit()?;

        tracing::info!(
            order = %order_number,
            shipment = %shipment.id,
            tracking = %shipment.tracking_number,
            "Shipment created"
        );

        Ok(shipment)
    }

    /// Pull tracking events for one shipment and apply them
    ///
    /// New events are inserted (old ones dedup away), the status advances
    /// monotonically, and a DELIVERED event pushes the order itself to
    /// DELIVERED.
    pub async fn sync_tracking(&self, shipment_id: &str) -> ShipmentResult<Shipment> {
        let shipment = self
            .storage
            .get_shipment(shipment_id)?
            .ok_or_else(|| ShipmentError::NotFound(shipment_id.to_string()))?;
        if shipment.status.is_terminal() {
            return Ok(shipment);
        }

        let raw_events = self.carrier.get_tracking(&shipment.carrier_reference).await?;
        let now = now_ms();

        let mut events: Vec<(i64, ShipmentTrackingEvent)> = Vec::new();
        for raw in raw_events {
            let Some(status) = map_carrier_status(raw.status_code, raw.incidence) else {
                tracing::warn!(
                    shipment = %shipment_id,
                    code = raw.status_code,
                    "Unknown carrier status code, event skipped"
                );
                continue;
            };
            events.push((
                raw.event_date,
                ShipmentTrackingEvent {
                    shipment_id: shipment_id.to_string(),
                    event_date: raw.event_date,
                    description: raw.description,
                    location: raw.location,
                    status,
                },
            ));
        }
        events.sort_by_key(|(date, _)| *date);

        let mut updated = shipment;
        let mut inserted = 0usize;

        let txn = self.storage.begin_write()?;
        let result = (|| -> ShipmentResult<()> {
            for (_, event) in &events {
                if self.storage.insert_tracking_event(&txn, event)? {
                    inserted += 1;
                }
                if updated.status.can_advance_to(event.status) {
                    updated.status = event.status;
                }
            }
            updated.last_sync_at = Some(now);
            updated.updated_at = now;
            self.storage.update_shipment(&txn, &updated)?;
            Ok(())
        })();
        if let Err(e) = result {
            txn.abort()?;
            return Err(e);
        }
        txn.commit()?;

        tracing::info!(
            shipment = %shipment_id,
            status = %updated.status,
            new_events = inserted,
            "Tracking synced"
        );

        if updated.status == ShipmentStatus::Delivered {
            self.mark_order_delivered(&updated).await?;
        }

        Ok(updated)
    }

    /// Sync every non-terminal shipment
    ///
    /// One failing shipment never stops the batch; its error goes into the
    /// report instead.
    pub async fn sync_all(&self) -> ShipmentResult<SyncRunReport> {
        let shipments = self.storage.non_terminal_shipments()?;
        let total = shipments.len();
        let mut synced = 0;
        let mut failures = Vec::new();

        for shipment in shipments {
            match self.sync_tracking(&shipment.id).await {
                Ok(_) => synced += 1,
                Err(e) => {
                    tracing::error!(shipment = %shipment.id, error = %e, "Shipment sync failed");
                    failures.push(SyncFailure {
                        shipment_id: shipment.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(total, synced, failed = failures.len(), "Tracking sync run finished");
        Ok(SyncRunReport {
            total,
            synced,
            failures,
        })
    }

    /// Carrier says delivered: drive the order to DELIVERED too.
    /// An order that cannot take the transition (already delivered,
    /// cancelled meanwhile) is logged, not an error.
    async fn mark_order_delivered(&self, shipment: &Shipment) -> ShipmentResult<()> {
        match self
            .orders
            .transition(
                &shipment.order_number,
                OrderStatus::Delivered,
                Some(format!("Carrier confirmed delivery ({})", shipment.tracking_number)),
                "carrier-sync",
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(crate::orders::OrderError::InvalidTransition { from, to }) => {
                tracing::warn!(
                    order = %shipment.order_number,
                    from = %from,
                    to = %to,
                    "Delivery recorded but order transition skipped"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
