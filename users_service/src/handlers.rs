use std::sync::Arc;

use rpc::HandlerTable;
use shared::dto::{
    CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse, DepositRequest,
    GetBalanceRequest, GetBalanceResponse, GetUserRequest, GetUserResponse, UserView, WithdrawRequest,
};
use shared::models::{Instrument, OperationType, UserRole};
use shared::DomainError;
use sqlx::PgPool;

use crate::queries;

async fn handle_create_user(pool: PgPool, req: CreateUserRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    let role = req.role.unwrap_or(UserRole::User);
    let user = queries::insert_user(&mut tx, &req.name, role).await?;
    tx.commit().await?;
    tracing::info!(user_id = %user.id, "user created");
    Ok(serde_json::to_value(CreateUserResponse { user: user.into() })?)
}

async fn handle_delete_user(pool: PgPool, req: DeleteUserRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    let user = queries::find_user_for_update(&mut tx, req.id)
        .await?
        .ok_or_else(|| DomainError::user_not_found(req.id))?;
    queries::delete_user(&mut tx, req.id).await?;
    tx.commit().await?;
    tracing::info!(user_id = %req.id, "user deleted");
    Ok(serde_json::to_value(DeleteUserResponse { user: user.into() })?)
}

async fn handle_get_user(pool: PgPool, req: GetUserRequest) -> Result<serde_json::Value, DomainError> {
    let mut conn = pool.acquire().await?;
    let user = queries::find_user(&mut conn, req.id)
        .await?
        .ok_or_else(|| DomainError::user_not_found(req.id))?;
    Ok(serde_json::to_value(GetUserResponse { user: user.into() })?)
}

async fn handle_deposit(pool: PgPool, req: DepositRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    if queries::find_user_for_update(&mut tx, req.user_id).await?.is_none() {
        return Err(DomainError::user_not_found(req.user_id));
    }
    if !queries::instrument_exists(&mut tx, &req.ticker).await? {
        return Err(DomainError::InstrumentNotFound(req.ticker));
    }

    let current = queries::balance_amount(&mut tx, req.user_id, &req.ticker).await?.unwrap_or(0);
    let updated = current + req.amount;
    queries::set_balance(&mut tx, req.user_id, &req.ticker, updated).await?;
    queries::record_balance_history(&mut tx, req.user_id, &req.ticker, req.amount, OperationType::Deposit).await?;
    tx.commit().await?;

    tracing::info!(user_id = %req.user_id, ticker = %req.ticker, new_balance = updated, "deposit applied");
    Ok(serde_json::Value::Null)
}

async fn handle_withdraw(pool: PgPool, req: WithdrawRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    if queries::find_user_for_update(&mut tx, req.user_id).await?.is_none() {
        return Err(DomainError::user_not_found(req.user_id));
    }
    if !queries::instrument_exists(&mut tx, &req.ticker).await? {
        return Err(DomainError::InstrumentNotFound(req.ticker));
    }

    let current = queries::balance_amount(&mut tx, req.user_id, &req.ticker).await?.unwrap_or(0);
    if current < req.amount {
        return Err(DomainError::insufficient_funds(req.user_id, req.amount, current));
    }

    let updated = current - req.amount;
    queries::set_balance(&mut tx, req.user_id, &req.ticker, updated).await?;
    queries::record_balance_history(&mut tx, req.user_id, &req.ticker, req.amount, OperationType::Withdraw).await?;
    tx.commit().await?;

    tracing::info!(user_id = %req.user_id, ticker = %req.ticker, new_balance = updated, "withdrawal applied");
    Ok(serde_json::Value::Null)
}

async fn handle_get_balance(pool: PgPool, req: GetBalanceRequest) -> Result<serde_json::Value, DomainError> {
    let mut tx = pool.begin().await?;
    if queries::find_user(&mut tx, req.user_id).await?.is_none() {
        return Err(DomainError::user_not_found(req.user_id));
    }
    let mut balances = std::collections::HashMap::new();
    for (ticker, amount) in queries::all_balances(&mut tx, req.user_id).await? {
        balances.insert(ticker, amount);
    }
    balances.entry(Instrument::SETTLEMENT_TICKER.to_string()).or_insert(0);
    Ok(serde_json::to_value(GetBalanceResponse { balances })?)
}

fn decode<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, DomainError> {
    serde_json::from_value(payload).map_err(|e| DomainError::critical(format!("malformed request: {e}")))
}

pub fn build(pool: PgPool) -> HandlerTable {
    let p = pool.clone();
    let create = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_create_user(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let delete = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_delete_user(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let get = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_user(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let deposit = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_deposit(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let withdraw = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_withdraw(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    let p = pool.clone();
    let balance = move |payload: serde_json::Value| {
        let pool = p.clone();
        Box::pin(async move { handle_get_balance(pool, decode(payload)?).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, DomainError>> + Send>>
    };

    HandlerTable::new()
        .register("create_user", Arc::new(create))
        .register("delete_user", Arc::new(delete))
        .register("get_user", Arc::new(get))
        .register("deposit", Arc::new(deposit))
        .register("withdraw", Arc::new(withdraw))
        .register("get_balance", Arc::new(balance))
}
