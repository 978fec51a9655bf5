use shared::DomainError;
use sqlx::PgConnection;
use uuid::Uuid;

/// `get_lock_balance` in the source: the instrument quantity already earmarked
/// by this user's open SELL orders on that instrument (spec invariant B2).
pub async fn reserved_sell(
    conn: &mut PgConnection,
    user_id: Uuid,
    ticker: &str,
) -> Result<i64, DomainError> {
    let reserved: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(quantity - filled)::BIGINT FROM orders
         WHERE user_id = $1 AND instrument = $2 AND status = 'new' AND direction = 'sell'",
    )
    .bind(user_id)
    .bind(ticker)
    .fetch_one(&mut *conn)
    .await?;
    Ok(reserved.unwrap_or(0))
}

/// `get_lock_rubs` in the source: the RUB already earmarked by this user's open
/// LIMIT BUY orders across every instrument (spec invariant B3).
pub async fn reserved_buy(conn: &mut PgConnection, user_id: Uuid) -> Result<i64, DomainError> {
    let reserved: Option<i64> = sqlx::query_scalar(
        "SELECT SUM((quantity - filled) * price)::BIGINT FROM orders
         WHERE user_id = $1 AND status = 'new' AND direction = 'buy' AND type = 'limit'",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(reserved.unwrap_or(0))
}

pub async fn current_balance(
    conn: &mut PgConnection,
    user_id: Uuid,
    ticker: &str,
) -> Result<i64, DomainError> {
    let amount: Option<i64> = sqlx::query_scalar(
        "SELECT amount FROM balances WHERE user_id = $1 AND instrument = $2",
    )
    .bind(user_id)
    .bind(ticker)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(amount.unwrap_or(0))
}

/// Apply `delta` to a user's balance row, creating it at `delta` if absent.
/// The `amount >= 0` table constraint is what actually enforces "never debit
/// past zero"; a constraint violation here is surfaced as a `CriticalError`,
/// matching the spec's "raise CriticalError" settlement-invariant language.
pub async fn adjust_balance(
    conn: &mut PgConnection,
    user_id: Uuid,
    ticker: &str,
    delta: i64,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO balances (user_id, instrument, amount) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, instrument) DO UPDATE SET amount = balances.amount + $3",
    )
    .bind(user_id)
    .bind(ticker)
    .bind(delta)
    .execute(&mut *conn)
    .await
    .map_err(|e| DomainError::critical(format!("balance update would go negative: {e}")))?;
    Ok(())
}
