//! Order routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::{Order, OrderCreate, OrderStatus, OrderStatusHistory};
use shared::{ApiResponse, AppResult};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/{order_number}", get(get_order))
        .route("/api/orders/{order_number}/history", get(get_history))
        .route("/api/orders/{order_number}/transition", post(transition))
        .route(
            "/api/orders/{order_number}/payment-confirmed",
            post(payment_confirmed),
        )
        .route("/api/orders/{order_number}/cancel", post(cancel))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub actor: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentConfirmedRequest {
    pub amount: Decimal,
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub notes: Option<String>,
    pub actor: Option<String>,
}

async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<OrderCreate>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.create_order(input).await?;
    Ok(ApiResponse::success(order))
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .storage
        .get_order(&order_number)?
        .ok_or_else(|| shared::AppError::not_found(format!("Order {}", order_number)))?;
    Ok(ApiResponse::success(order))
}

async fn get_history(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Vec<OrderStatusHistory>>> {
    let history = state.storage.get_history(&order_number)?;
    Ok(ApiResponse::success(history))
}

async fn transition(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> AppResult<ApiResponse<Order>> {
    let actor = req.actor.unwrap_or_else(|| "operator".to_string());
    let order = state
        .orders
        .transition(&order_number, req.status, req.notes, &actor)
        .await?;
    Ok(ApiResponse::success(order))
}

/// Payment gateway webhook target; the gateway's own signature checks
/// happen upstream of this service
async fn payment_confirmed(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(req): Json<PaymentConfirmedRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.confirm_payment(&order_number, req.amount).await?;
    Ok(ApiResponse::success(order))
}

async fn cancel(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(req): Json<CancelRequest>,
) -> AppResult<ApiResponse<Order>> {
    let actor = req.actor.unwrap_or_else(|| "operator".to_string());
    let order = state.orders.cancel(&order_number, req.notes, &actor).await?;
    Ok(ApiResponse::success(order))
}
