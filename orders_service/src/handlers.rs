use std::sync::Arc;

use redis::aio::ConnectionManager;
use rpc::{lock_key, HandlerTable};
use shared::dto::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, GetOrderRequest, GetOrderResponse,
    GetOrderbookRequest, GetOrderbookResponse, GetTransactionsRequest, GetTransactionsResponse,
    ListOrdersRequest, ListOrdersResponse, OrderView,
};
use shared::models::Direction;
use shared::DomainError;
use sqlx::PgPool;
use std::time::Duration;

use crate::{admission, matching, queries};

const LOCK_LEASE: Duration = Duration::from_secs(5);

async fn handle_create_order(
    pool: PgPool,
    conn: ConnectionManager,
    req: CreateOrderRequest,
) -> Result<serde_json::Value, DomainError> {
    let ticker = req.body.ticker().to_string();
    let order_id = admission::create_order(&pool, req).await?;

    let mut conn = conn;
    let key = lock_key(&ticker);
    let guard = rpc::lock::acquire(&mut conn, &key, LOCK_LEASE)
        .await
        .map_err(|e| DomainError::critical(format!("lock acquisition failed: {e}")))?;
    let result = matching::execute_orders(&pool, &ticker).await;
    rpc::lock::release(&mut conn, guard)
        .await
        .map_err(|e| DomainError::critical(format!("lock release failed: {e}")))?;
    result?;

    Ok(serde_json::to_value(CreateOrderResponse { order_id })?.into())
}

async fn handle_list_orders(pool: PgPool, req: ListOrdersRequest) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    let orders = queries::list_orders_for_user(&mut conn, req.user_id).await?;
    let orders = orders.iter().map(OrderView::from_order).collect();
    Ok(serde_json::to_value(ListOrdersResponse { orders })?)
}

async fn handle_get_order(pool: PgPool, req: GetOrderRequest) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    let order = queries::find_order(&mut conn, req.order_id)
        .await?
        .filter(|o| o.user_id == req.user_id)
        .ok_or_else(|| DomainError::order_not_found(req.order_id))?;
    Ok(serde_json::to_value(GetOrderResponse {
        order: OrderView::from_order(&order),
    })?)
}

async fn handle_cancel_order(pool: PgPool, req: CancelOrderRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    let order = queries::find_order(&mut tx, req.order_id)
        .await?
        .filter(|o| o.user_id == req.user_id)
        .ok_or_else(|| DomainError::order_not_found(req.order_id))?;

    if order.order_type == shared::models::OrderType::Market {
        return Err(DomainError::CannotCancel(format!(
            "order {} is a MARKET order and cannot be cancelled",
            order.id
        )));
    }
    if !order.status.is_fillable(order.filled, order.quantity) {
        return Err(DomainError::CannotCancel(format!(
            "order {} is not open (status: {:?})",
            order.id, order.status
        )));
    }

    queries::cancel_order_row(&mut tx, order.id).await?;
    tx.commit().await?;
    Ok(serde_json::Value::Null)
}

async fn handle_get_orderbook(pool: PgPool, req: GetOrderbookRequest) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    if !queries::instrument_exists(&mut conn, &req.ticker).await? {
        return Err(DomainError::InstrumentNotFound(req.ticker.clone()));
    }
    let bid_levels = queries::orderbook_levels(&mut conn, &req.ticker, Direction::Buy, req.limit).await?;
    let ask_levels = queries::orderbook_levels(&mut conn, &req.ticker, Direction::Sell, req.limit).await?;
    Ok(serde_json::to_value(GetOrderbookResponse { bid_levels, ask_levels })?)
}

async fn handle_get_transactions(
    pool: PgPool,
    req: GetTransactionsRequest,
) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    let transactions = queries::recent_transactions(&mut conn, &req.ticker, req.limit).await?;
    Ok(serde_json::to_value(GetTransactionsResponse { transactions })?)
}

fn decode<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, DomainError> {
    serde_json::from_value(payload).map_err(|e| DomainError::critical(format!("malformed request: {e}")))
}

pub fn build(pool: PgPool, conn: ConnectionManager) -> HandlerTable {
    let p = pool.clone();
    let c = conn.clone();
    let create = move |payload: serde_json::Value| {
        let pool = p.clone();
        let conn = c.clone();
        Box::pin(async move { handle_create_order(pool, conn, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let list = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_list_orders(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let get = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_order(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let cancel = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_cancel_order(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let orderbook = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_orderbook(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let transactions = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_transactions(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    HandlerTable::new()
        .register("create_order", Arc::new(create))
        .register("list_orders", Arc::new(list))
        .register("get_order", Arc::new(get))
        .register("cancel_order", Arc::new(cancel))
        .register("get_orderbook", Arc::new(orderbook))
        .register("get_transactions", Arc::new(transactions))
}
