use shared::models::{Instrument, User};
use shared::DomainError;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn insert_user(conn: &mut PgConnection, name: &str, role: shared::models::UserRole) -> Result<User, DomainError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, role) VALUES ($1, $2) RETURNING id, name, role, created_at",
    )
    .bind(name)
    .bind(role)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO instruments (ticker, name) VALUES ($1, 'Russian Ruble') ON CONFLICT DO NOTHING",
    )
    .bind(Instrument::SETTLEMENT_TICKER)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO balances (user_id, instrument, amount) VALUES ($1, $2, 0)
         ON CONFLICT (user_id, instrument) DO NOTHING",
    )
    .bind(user.id)
    .bind(Instrument::SETTLEMENT_TICKER)
    .execute(&mut *conn)
    .await?;

    Ok(user)
}

pub async fn find_user(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, DomainError> {
    let user = sqlx::query_as::<_, User>("SELECT id, name, role, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

/// Locks the user row for the duration of the enclosing transaction, matching
/// spec §4.5/§5: deposit, withdraw and delete-user all serialize on this lock
/// rather than on a separate lock table.
pub async fn find_user_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, DomainError> {
    let user =
        sqlx::query_as::<_, User>("SELECT id, name, role, created_at FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(user)
}

pub async fn delete_user(conn: &mut PgConnection, id: Uuid) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn instrument_exists(conn: &mut PgConnection, ticker: &str) -> Result<bool, DomainError> {
    let found: Option<String> = sqlx::query_scalar("SELECT ticker FROM instruments WHERE ticker = $1")
        .bind(ticker)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub async fn balance_amount(conn: &mut PgConnection, user_id: Uuid, ticker: &str) -> Result<Option<i64>, DomainError> {
    let amount: Option<i64> = sqlx::query_scalar("SELECT amount FROM balances WHERE user_id = $1 AND instrument = $2")
        .bind(user_id)
        .bind(ticker)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(amount)
}

pub async fn set_balance(conn: &mut PgConnection, user_id: Uuid, ticker: &str, amount: i64) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO balances (user_id, instrument, amount) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, instrument) DO UPDATE SET amount = $3",
    )
    .bind(user_id)
    .bind(ticker)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn record_balance_history(
    conn: &mut PgConnection,
    user_id: Uuid,
    ticker: &str,
    amount: i64,
    operation: shared::models::OperationType,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO balance_history (user_id, instrument, amount, operation) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(ticker)
    .bind(amount)
    .bind(operation)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn all_balances(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<(String, i64)>, DomainError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT instrument, amount FROM balances WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows)
}
