use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use shared::dto::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, GetOrderRequest, GetOrderResponse, ListOrdersRequest,
    ListOrdersResponse, OrderBody, OrderView,
};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::state::AppState;

async fn create_order(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Json(body): Json<OrderBody>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    body.validate().map_err(ApiError::Validation)?;
    let resp: CreateOrderResponse = state
        .rpc
        .call("orders", "create_order", &CreateOrderRequest { user_id, body })
        .await?;
    Ok(Json(resp))
}

async fn list_orders(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let resp: ListOrdersResponse = state.rpc.call("orders", "list_orders", &ListOrdersRequest { user_id }).await?;
    Ok(Json(resp.orders))
}

async fn get_order(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(order_id): Path<uuid::Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let resp: GetOrderResponse = state
        .rpc
        .call("orders", "get_order", &GetOrderRequest { user_id, order_id })
        .await?;
    Ok(Json(resp.order))
}

async fn cancel_order(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(order_id): Path<uuid::Uuid>,
) -> Result<(), ApiError> {
    let _: serde_json::Value = state
        .rpc
        .call("orders", "cancel_order", &CancelOrderRequest { user_id, order_id })
        .await?;
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order).delete(cancel_order))
}
