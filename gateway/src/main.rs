use std::env;

use axum::routing::get;
use axum::{Json, Router};
use gateway::routes::{admin, balances, orders, public};
use gateway::AppState;
use rpc::RpcClient;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gateway=debug".parse()?),
        )
        .init();

    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-in-production".to_string());
    let admin_key = env::var("ADMIN_SECRET").unwrap_or_else(|_| "dev-admin-secret".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    tracing::info!("connecting to redis...");
    let rpc = RpcClient::connect(&redis_url).await?;

    let state = AppState { rpc, jwt_secret, admin_key };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1/public", public::router())
        .nest("/api/v1/balance", balances::router())
        .nest("/api/v1/order", orders::router())
        .nest("/api/v1/admin/instrument", admin::instrument_router())
        .nest("/api/v1/admin/user", admin::user_router())
        .nest("/api/v1/admin/balance", admin::balance_router())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
