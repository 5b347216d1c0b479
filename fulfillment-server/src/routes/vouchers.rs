//! Voucher administration and loyalty read routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use shared::models::{LoyaltyAccount, PointTransaction, Voucher, VoucherCreate};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::core::AppState;
use crate::utils::now_ms;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vouchers", post(create_voucher))
        .route("/api/vouchers/{code}", get(get_voucher))
        .route("/api/users/{user_id}/vouchers", get(get_user_vouchers))
        .route("/api/users/{user_id}/loyalty", get(get_loyalty_account))
        .route(
            "/api/users/{user_id}/loyalty/transactions",
            get(get_point_transactions),
        )
}

async fn create_voucher(
    State(state): State<AppState>,
    Json(input): Json<VoucherCreate>,
) -> AppResult<ApiResponse<Voucher>> {
    if input.code.trim().is_empty() {
        return Err(AppError::validation("voucher code must not be empty"));
    }
    if state.storage.get_voucher(&input.code)?.is_some() {
        return Err(AppError::with_message(
            ErrorCode::VoucherCodeExists,
            format!("Voucher code {} already exists", input.code),
        ));
    }

    let now = now_ms();
    let mut voucher = Voucher {
        code: input.code,
        voucher_type: input.voucher_type,
        user_id: input.user_id,
        initial_meters: input.meters,
        remaining_meters: input.meters,
        initial_shipments: input.shipments,
        remaining_shipments: input.shipments,
        is_active: true,
        expires_at: input.expires_at,
        created_at: now,
        updated_at: now,
    };
    voucher.recompute_active(now);

    let txn = state.storage.begin_write()?;
    state.storage.insert_voucher(&txn, &voucher)?;
    txn.commit().map_err(crate::storage::StorageError::from)?;

    tracing::info!(code = %voucher.code, "Voucher created");
    Ok(ApiResponse::success(voucher))
}

async fn get_voucher(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<Voucher>> {
    let voucher = state.storage.get_voucher(&code)?.ok_or_else(|| {
        AppError::with_message(ErrorCode::VoucherNotFound, format!("Voucher {} not found", code))
    })?;
    Ok(ApiResponse::success(voucher))
}

async fn get_user_vouchers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<Voucher>>> {
    let vouchers = state.storage.get_user_vouchers(&user_id)?;
    Ok(ApiResponse::success(vouchers))
}

async fn get_loyalty_account(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<LoyaltyAccount>> {
    let account = state.storage.get_loyalty_account(&user_id)?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::LoyaltyAccountNotFound,
            format!("Loyalty account for {} not found", user_id),
        )
    })?;
    Ok(ApiResponse::success(account))
}

async fn get_point_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PointTransaction>>> {
    let txs = state.storage.get_point_transactions(&user_id)?;
    Ok(ApiResponse::success(txs))
}
