//! Shipping carrier client
//!
//! The carrier exposes shipment creation, label download and tracking. The
//! wire protocol stays behind this trait; the sync module only sees the
//! typed events. Carrier status codes map onto [`ShipmentStatus`] as:
//! 0 = CREATED, 1-2 = PICKED_UP, 3-5 = IN_TRANSIT, 6 = OUT_FOR_DELIVERY,
//! 7 = DELIVERED; an incidence flag overrides everything as EXCEPTION.

use crate::core::Config;
use crate::utils::TtlCache;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Order, ShipmentStatus};
use std::time::Duration;
use thiserror::Error;

/// Connectivity probe results stay valid for one minute
const CONNECTIVITY_TTL_MS: i64 = 60_000;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("Carrier unreachable: {0}")]
    Unavailable(String),

    #[error("Carrier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected carrier response: {0}")]
    InvalidResponse(String),
}

/// Carrier-side shipment identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierShipment {
    pub reference: String,
    pub tracking_number: String,
}

/// One raw tracking event as the carrier reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierTrackingEvent {
    pub status_code: u32,
    #[serde(default)]
    pub incidence: bool,
    /// Unix millis
    pub event_date: i64,
    pub description: String,
    pub location: Option<String>,
}

/// Shipping label, base64-encoded PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierLabel {
    pub pdf_base64: String,
}

/// Map a carrier status code to our shipment status.
/// Unknown codes return None; the sync logs and skips them.
pub fn map_carrier_status(status_code: u32, incidence: bool) -> Option<ShipmentStatus> {
    if incidence {
        return Some(ShipmentStatus::Exception);
    }
    match status_code {
        0 => Some(ShipmentStatus::Created),
        1..=2 => Some(ShipmentStatus::PickedUp),
        3..=5 => Some(ShipmentStatus::InTransit),
        6 => Some(ShipmentStatus::OutForDelivery),
        7 => Some(ShipmentStatus::Delivered),
        _ => None,
    }
}

#[async_trait]
pub trait CarrierApi: Send + Sync {
    /// Register a shipment with the carrier
    async fn create_shipment(&self, order: &Order) -> Result<CarrierShipment, CarrierError>;

    /// Download the shipping label for a carrier reference
    async fn get_label(&self, reference: &str) -> Result<CarrierLabel, CarrierError>;

    /// All tracking events the carrier has for a reference
    async fn get_tracking(&self, reference: &str)
    -> Result<Vec<CarrierTrackingEvent>, CarrierError>;
}

#[derive(Serialize)]
struct CreateShipmentRequest<'a> {
    order_number: &'a str,
    recipient: &'a str,
    street: &'a str,
    city: &'a str,
    postal_code: &'a str,
    country: &'a str,
}

/// HTTP carrier client
///
/// Calls carry a 30s hard timeout; the connectivity probe a 10s one. Probe
/// results are TTL-cached so a batch sync issues at most one probe.
pub struct HttpCarrierClient {
    base_url: String,
    client: reqwest::Client,
    probe_client: reqwest::Client,
    connectivity: TtlCache<bool>,
}

impl HttpCarrierClient {
    pub fn new(config: &Config) -> Result<Self, CarrierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.carrier_timeout_ms))
            .build()?;
        let probe_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.carrier_connect_timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.carrier_api_url.trim_end_matches('/').to_string(),
            client,
            probe_client,
            connectivity: TtlCache::new(CONNECTIVITY_TTL_MS),
        })
    }

    /// Whether the carrier answers its status endpoint (cached)
    pub async fn is_reachable(&self) -> bool {
        if let Some(cached) = self.connectivity.get().await {
            return cached;
        }
        let url = format!("{}/status", self.base_url);
        let reachable = match self.probe_client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Carrier connectivity probe failed");
                false
            }
        };
        self.connectivity.put(reachable).await;
        reachable
    }

    async fn ensure_reachable(&self) -> Result<(), CarrierError> {
        if self.is_reachable().await {
            Ok(())
        } else {
            Err(CarrierError::Unavailable(self.base_url.clone()))
        }
    }
}

#[async_trait]
impl CarrierApi for HttpCarrierClient {
    async fn create_shipment(&self, order: &Order) -> Result<CarrierShipment, CarrierError> {
        self.ensure_reachable().await?;
        let address = order.shipping_address.as_ref().ok_or_else(|| {
            CarrierError::InvalidResponse("order has no shipping address".to_string())
        })?;

        let url = format!("{}/shipments", self.base_url);
        let request = CreateShipmentRequest {
            order_number: &order.order_number,
            recipient: &address.recipient,
            street: &address.street,
            city: &address.city,
            postal_code: &address.postal_code,
            country: &address.country,
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(CarrierError::InvalidResponse(format!(
                "create shipment returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    async fn get_label(&self, reference: &str) -> Result<CarrierLabel, CarrierError> {
        self.ensure_reachable().await?;
        let url = format!("{}/shipments/{}/label", self.base_url, reference);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(CarrierError::InvalidResponse(format!(
                "get label returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    async fn get_tracking(
        &self,
        reference: &str,
    ) -> Result<Vec<CarrierTrackingEvent>, CarrierError> {
        self.ensure_reachable().await?;
        let url = format!("{}/shipments/{}/tracking", self.base_url, reference);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(CarrierError::InvalidResponse(format!(
                "get tracking returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(map_carrier_status(0, false), Some(ShipmentStatus::Created));
        assert_eq!(map_carrier_status(1, false), Some(ShipmentStatus::PickedUp));
        assert_eq!(map_carrier_status(2, false), Some(ShipmentStatus::PickedUp));
        assert_eq!(map_carrier_status(3, false), Some(ShipmentStatus::InTransit));
        assert_eq!(map_carrier_status(5, false), Some(ShipmentStatus::InTransit));
        assert_eq!(
            map_carrier_status(6, false),
            Some(ShipmentStatus::OutForDelivery)
        );
        assert_eq!(map_carrier_status(7, false), Some(ShipmentStatus::Delivered));
        assert_eq!(map_carrier_status(8, false), None);
        assert_eq!(map_carrier_status(99, false), None);
    }

    #[test]
    fn test_incidence_overrides_code() {
        assert_eq!(map_carrier_status(3, true), Some(ShipmentStatus::Exception));
        assert_eq!(map_carrier_status(7, true), Some(ShipmentStatus::Exception));
    }
}
