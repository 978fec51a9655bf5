use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use shared::dto::{
    CreateUserRequest, CreateUserResponse, GetInstrumentsResponse, GetOrderbookRequest, GetOrderbookResponse,
    GetTransactionsRequest, GetTransactionsResponse, InstrumentView, OrderbookLevel, TransactionView, UserView,
};

use crate::auth::issue_user_token;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LEVEL_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct RegisterHttpRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterHttpResponse {
    pub user: UserView,
    pub token: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterHttpRequest>,
) -> Result<Json<RegisterHttpResponse>, ApiError> {
    let resp: CreateUserResponse = state
        .rpc
        .call("users", "create_user", &CreateUserRequest { name: body.name, role: None })
        .await?;

    let token = issue_user_token(&state.jwt_secret, resp.user.id)
        .map_err(|e| shared::DomainError::critical(format!("failed to issue token: {e}")))?;

    Ok(Json(RegisterHttpResponse { user: resp.user, token }))
}

async fn list_instruments(State(state): State<AppState>) -> Result<Json<Vec<InstrumentView>>, ApiError> {
    let resp: GetInstrumentsResponse = state.rpc.call("instruments", "get_instruments", &()).await?;
    Ok(Json(resp.instruments))
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderbookHttpResponse {
    pub bid_levels: Vec<OrderbookLevel>,
    pub ask_levels: Vec<OrderbookLevel>,
}

async fn orderbook(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LevelQuery>,
) -> Result<Json<OrderbookHttpResponse>, ApiError> {
    let resp: GetOrderbookResponse = state
        .rpc
        .call(
            "orders",
            "get_orderbook",
            &GetOrderbookRequest {
                ticker: ticker.to_uppercase(),
                limit: query.limit.unwrap_or(DEFAULT_LEVEL_LIMIT),
            },
        )
        .await?;
    Ok(Json(OrderbookHttpResponse {
        bid_levels: resp.bid_levels,
        ask_levels: resp.ask_levels,
    }))
}

async fn transactions(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LevelQuery>,
) -> Result<Json<Vec<TransactionView>>, ApiError> {
    let resp: GetTransactionsResponse = state
        .rpc
        .call(
            "orders",
            "get_transactions",
            &GetTransactionsRequest {
                ticker: ticker.to_uppercase(),
                limit: query.limit.unwrap_or(DEFAULT_LEVEL_LIMIT),
            },
        )
        .await?;
    Ok(Json(resp.transactions))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/instrument", get(list_instruments))
        .route("/orderbook/:ticker", get(orderbook))
        .route("/transactions/:ticker", get(transactions))
}
