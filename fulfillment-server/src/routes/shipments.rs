//! Shipment routes

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use shared::models::{Shipment, ShipmentTrackingEvent};
use shared::{ApiResponse, AppResult};

use crate::core::AppState;
use crate::services::CarrierLabel;
use crate::shipments::SyncRunReport;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orders/{order_number}/shipment",
            post(create_shipment).get(get_shipment_for_order),
        )
        .route("/api/shipments/{id}", get(get_shipment))
        .route("/api/shipments/{id}/events", get(get_events))
        .route("/api/shipments/{id}/label", get(get_label))
        .route("/api/shipments/{id}/sync", post(sync_one))
        .route("/api/shipments/sync-all", post(sync_all))
}

async fn create_shipment(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Shipment>> {
    let shipment = state.shipments.create_shipment(&order_number).await?;
    Ok(ApiResponse::success(shipment))
}

async fn get_shipment_for_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Shipment>> {
    let shipment = state
        .storage
        .get_shipment_by_order(&order_number)?
        .ok_or_else(|| {
            shared::AppError::not_found(format!("Shipment for order {}", order_number))
        })?;
    Ok(ApiResponse::success(shipment))
}

async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Shipment>> {
    let shipment = state
        .storage
        .get_shipment(&id)?
        .ok_or_else(|| shared::AppError::not_found(format!("Shipment {}", id)))?;
    Ok(ApiResponse::success(shipment))
}

async fn get_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ShipmentTrackingEvent>>> {
    let events = state.storage.get_tracking_events(&id)?;
    Ok(ApiResponse::success(events))
}

async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CarrierLabel>> {
    let label = state.shipments.get_label(&id).await?;
    Ok(ApiResponse::success(label))
}

async fn sync_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Shipment>> {
    let shipment = state.shipments.sync_tracking(&id).await?;
    Ok(ApiResponse::success(shipment))
}

async fn sync_all(State(state): State<AppState>) -> AppResult<ApiResponse<SyncRunReport>> {
    let report = state.shipments.sync_all().await?;
    Ok(ApiResponse::success(report))
}
