use std::sync::Arc;

use rpc::HandlerTable;
use shared::dto::{AddInstrumentRequest, DeleteInstrumentRequest, GetInstrumentsResponse, InstrumentView};
use shared::DomainError;
use sqlx::PgPool;

use crate::queries;

async fn handle_get_instruments(pool: PgPool) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    let instruments = queries::list_instruments(&mut conn)
        .await?
        .into_iter()
        .map(|i| InstrumentView {
            ticker: i.ticker,
            name: i.name,
        })
        .collect();
    Ok(serde_json::to_value(GetInstrumentsResponse { instruments })?)
}

async fn handle_add_instrument(pool: PgPool, req: AddInstrumentRequest) -> Result<serde_json::Value, DomainError> {
    if !shared::models::Instrument::valid_ticker(&req.ticker) {
        return Err(DomainError::critical(format!("invalid ticker: {}", req.ticker)));
    }
    let mut conn = pool.acquire().await?;
    queries::insert_instrument(&mut conn, &req.ticker, &req.name).await?;
    tracing::info!(ticker = %req.ticker, "instrument created");
    Ok(serde_json::Value::Null)
}

async fn handle_delete_instrument(pool: PgPool, req: DeleteInstrumentRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    if queries::find_for_update(&mut tx, &req.ticker).await?.is_none() {
        return Err(DomainError::InstrumentNotFound(req.ticker));
    }
    queries::delete_instrument(&mut tx, &req.ticker).await?;
    tx.commit().await?;
    tracing::info!(ticker = %req.ticker, "instrument deleted");
    Ok(serde_json::Value::Null)
}

fn decode<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, DomainError> {
    serde_json::from_value(payload).map_err(|e| DomainError::critical(format!("malformed request: {e}")))
}

pub fn build(pool: PgPool) -> HandlerTable {
    let p = pool.clone();
    let list = move |_payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_instruments(pool).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let add = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_add_instrument(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let delete = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_delete_instrument(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    HandlerTable::new()
        .register("get_instruments", Arc::new(list))
        .register("add_instrument", Arc::new(add))
        .register("delete_instrument", Arc::new(delete))
}
