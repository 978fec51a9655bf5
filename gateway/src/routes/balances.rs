use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use shared::dto::{GetBalanceRequest, GetBalanceResponse};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::state::AppState;

async fn get_balance(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<Json<GetBalanceResponse>, ApiError> {
    let resp: GetBalanceResponse = state.rpc.call("users", "get_balance", &GetBalanceRequest { user_id }).await?;
    Ok(Json(resp))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_balance))
}
