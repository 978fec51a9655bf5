use shared::dto::{OrderBody, OrderbookLevel, TransactionView};
use shared::models::{Direction, Order, Transaction};
use shared::DomainError;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn instrument_exists(conn: &mut PgConnection, ticker: &str) -> Result<bool, DomainError> {
    let found: Option<String> = sqlx::query_scalar("SELECT ticker FROM instruments WHERE ticker = $1")
        .bind(ticker)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub async fn user_exists(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, DomainError> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: Uuid,
    body: &OrderBody,
) -> Result<Uuid, DomainError> {
    let order_type = body.order_type();
    let direction = body.direction();
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO orders (user_id, instrument, type, direction, status, quantity, price, filled)
         VALUES ($1, $2, $3, $4, 'new', $5, $6, 0)
         RETURNING id",
    )
    .bind(user_id)
    .bind(body.ticker())
    .bind(order_type)
    .bind(direction)
    .bind(body.qty())
    .bind(body.price())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

const ORDER_COLUMNS: &str =
    "id, user_id, instrument, type, direction, status, quantity, price, filled, created_at, updated_at";

pub async fn load_market_orders(conn: &mut PgConnection, ticker: &str) -> Result<Vec<Order>, DomainError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE instrument = $1 AND type = 'market' AND status = 'new'
         ORDER BY created_at ASC"
    ))
    .bind(ticker)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

pub async fn load_limit_buy_orders(conn: &mut PgConnection, ticker: &str) -> Result<Vec<Order>, DomainError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE instrument = $1 AND type = 'limit' AND direction = 'buy' AND status = 'new'
         ORDER BY price DESC, created_at ASC"
    ))
    .bind(ticker)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

pub async fn load_limit_sell_orders(conn: &mut PgConnection, ticker: &str) -> Result<Vec<Order>, DomainError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE instrument = $1 AND type = 'limit' AND direction = 'sell' AND status = 'new'
         ORDER BY price ASC, created_at ASC"
    ))
    .bind(ticker)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

pub async fn save_order_progress(conn: &mut PgConnection, order: &Order) -> Result<(), DomainError> {
    sqlx::query(
        "UPDATE orders SET filled = $1, status = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(order.filled)
    .bind(order.status)
    .bind(order.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_transaction(
    conn: &mut PgConnection,
    ticker: &str,
    buyer_order_id: Uuid,
    seller_order_id: Uuid,
    quantity: i64,
    price: i64,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO transactions (instrument, buyer_order_id, seller_order_id, quantity, price)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(ticker)
    .bind(buyer_order_id)
    .bind(seller_order_id)
    .bind(quantity)
    .bind(price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_order(conn: &mut PgConnection, order_id: Uuid) -> Result<Option<Order>, DomainError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(order)
}

pub async fn list_orders_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

pub async fn cancel_order_row(conn: &mut PgConnection, order_id: Uuid) -> Result<(), DomainError> {
    sqlx::query("UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Aggregate open LIMIT orders by `(direction, price)`, per spec §4.4.
pub async fn orderbook_levels(
    conn: &mut PgConnection,
    ticker: &str,
    direction: Direction,
    limit: i64,
) -> Result<Vec<OrderbookLevel>, DomainError> {
    let order_clause = match direction {
        Direction::Buy => "price DESC",
        Direction::Sell => "price ASC",
    };
    let rows: Vec<(i64, i64)> = sqlx::query_as(&format!(
        "SELECT price, SUM(quantity - filled)::BIGINT AS qty FROM orders
         WHERE instrument = $1 AND type = 'limit' AND status = 'new' AND direction = $2
         GROUP BY price
         ORDER BY {order_clause}
         LIMIT $3"
    ))
    .bind(ticker)
    .bind(direction)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(price, qty)| OrderbookLevel { price, qty })
        .collect())
}

pub async fn recent_transactions(
    conn: &mut PgConnection,
    ticker: &str,
    limit: i64,
) -> Result<Vec<TransactionView>, DomainError> {
    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT id, instrument, buyer_order_id, seller_order_id, quantity, price, executed_at
         FROM transactions WHERE instrument = $1 ORDER BY executed_at DESC LIMIT $2",
    )
    .bind(ticker)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(transactions
        .into_iter()
        .map(|tx| TransactionView {
            ticker: tx.instrument,
            amount: tx.quantity,
            price: tx.price,
            timestamp: tx.executed_at,
        })
        .collect())
}
