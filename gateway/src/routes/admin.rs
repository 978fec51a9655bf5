use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use shared::dto::{
    AddInstrumentRequest, DeleteInstrumentRequest, DeleteUserRequest, DeleteUserResponse, DepositRequest,
    InstrumentView, UserView, WithdrawRequest,
};

use crate::auth::AuthedAdmin;
use crate::error::ApiError;
use crate::state::AppState;

async fn add_instrument(
    State(state): State<AppState>,
    _admin: AuthedAdmin,
    Json(body): Json<AddInstrumentRequest>,
) -> Result<Json<InstrumentView>, ApiError> {
    if !shared::models::Instrument::valid_ticker(&body.ticker) {
        return Err(ApiError::Validation(format!("invalid ticker: {}", body.ticker)));
    }
    let _: serde_json::Value = state.rpc.call("instruments", "add_instrument", &body).await?;
    Ok(Json(InstrumentView { ticker: body.ticker, name: body.name }))
}

async fn delete_instrument(
    State(state): State<AppState>,
    _admin: AuthedAdmin,
    Path(ticker): Path<String>,
) -> Result<(), ApiError> {
    let _: serde_json::Value = state
        .rpc
        .call("instruments", "delete_instrument", &DeleteInstrumentRequest { ticker })
        .await?;
    Ok(())
}

async fn delete_user(
    State(state): State<AppState>,
    _admin: AuthedAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let resp: DeleteUserResponse = state.rpc.call("users", "delete_user", &DeleteUserRequest { id }).await?;
    Ok(Json(resp.user))
}

#[derive(Debug, Deserialize)]
pub struct BalanceAdjustmentHttpRequest {
    pub user_id: Uuid,
    pub ticker: String,
    pub amount: i64,
}

async fn deposit(
    State(state): State<AppState>,
    _admin: AuthedAdmin,
    Json(body): Json<BalanceAdjustmentHttpRequest>,
) -> Result<(), ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::Validation("amount must be a strictly positive integer".to_string()));
    }
    let _: serde_json::Value = state
        .rpc
        .call(
            "users",
            "deposit",
            &DepositRequest {
                user_id: body.user_id,
                ticker: body.ticker,
                amount: body.amount,
            },
        )
        .await?;
    Ok(())
}

async fn withdraw(
    State(state): State<AppState>,
    _admin: AuthedAdmin,
    Json(body): Json<BalanceAdjustmentHttpRequest>,
) -> Result<(), ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::Validation("amount must be a strictly positive integer".to_string()));
    }
    let _: serde_json::Value = state
        .rpc
        .call(
            "users",
            "withdraw",
            &WithdrawRequest {
                user_id: body.user_id,
                ticker: body.ticker,
                amount: body.amount,
            },
        )
        .await?;
    Ok(())
}

pub fn instrument_router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_instrument))
        .route("/:ticker", delete(delete_instrument))
}

pub fn user_router() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_user))
}

pub fn balance_router() -> Router<AppState> {
    Router::new()
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
}
