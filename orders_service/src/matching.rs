use shared::models::{Direction, Order, OrderStatus, OrderType};
use shared::DomainError;
use sqlx::PgPool;

use crate::queries;
use crate::reservations;

const RUB: &str = shared::models::Instrument::SETTLEMENT_TICKER;

/// A trade the pairing step has decided to execute, before balances move.
struct TradeIntent {
    price: i64,
    quantity: i64,
}

/// Decides whether `o1` and `o2` can trade right now, and at what price and
/// quantity, per the pairing rules in spec §4.2. Returns `None` if the pair
/// cannot trade at all (same direction, neither fillable, crossed-but-wrong
/// way, or the affordable quantity comes out to zero).
async fn pair(
    conn: &mut sqlx::PgConnection,
    buy: &Order,
    sell: &Order,
) -> Result<Option<TradeIntent>, DomainError> {
    if buy.direction != Direction::Buy || sell.direction != Direction::Sell {
        return Ok(None);
    }
    if !buy.status.is_fillable(buy.filled, buy.quantity) || !sell.status.is_fillable(sell.filled, sell.quantity) {
        return Ok(None);
    }

    let price = match (buy.order_type, sell.order_type) {
        (OrderType::Market, OrderType::Market) => return Ok(None),
        (OrderType::Market, OrderType::Limit) => sell.price.expect("limit order always carries a price"),
        (OrderType::Limit, OrderType::Market) => buy.price.expect("limit order always carries a price"),
        (OrderType::Limit, OrderType::Limit) => {
            let buy_price = buy.price.expect("limit order always carries a price");
            let sell_price = sell.price.expect("limit order always carries a price");
            if sell_price > buy_price {
                return Ok(None);
            }
            if buy.created_at <= sell.created_at {
                buy_price
            } else {
                sell_price
            }
        }
    };

    let buyer_rub = reservations::current_balance(conn, buy.user_id, RUB).await?;
    let affordable = if price > 0 { buyer_rub / price } else { i64::MAX };
    let quantity = buy.remaining().min(sell.remaining()).min(affordable);

    if quantity <= 0 {
        return Ok(None);
    }
    Ok(Some(TradeIntent { price, quantity }))
}

/// Moves balances and advances both orders' fill state for one matched trade.
/// A self-trade (same user on both sides) still records a transaction but
/// moves no balances, matching the source's `create_transaction` behavior.
async fn settle(
    conn: &mut sqlx::PgConnection,
    ticker: &str,
    buy: &mut Order,
    sell: &mut Order,
    intent: &TradeIntent,
) -> Result<(), DomainError> {
    let total = intent
        .quantity
        .checked_mul(intent.price)
        .ok_or_else(|| DomainError::critical("trade notional overflowed i64"))?;

    if buy.user_id != sell.user_id {
        reservations::adjust_balance(conn, sell.user_id, ticker, -intent.quantity).await?;
        reservations::adjust_balance(conn, buy.user_id, ticker, intent.quantity).await?;
        reservations::adjust_balance(conn, buy.user_id, RUB, -total).await?;
        reservations::adjust_balance(conn, sell.user_id, RUB, total).await?;
    } else {
        // Self-trade: no balances move, but the user must actually hold what
        // they're nominally trading away on both legs, or the book is lying.
        let held_instrument = reservations::current_balance(conn, buy.user_id, ticker).await?;
        let held_rub = reservations::current_balance(conn, buy.user_id, RUB).await?;
        if held_instrument < intent.quantity || held_rub < total {
            return Err(DomainError::critical(format!(
                "self-trade for user {} would require {} {ticker} and {} RUB, has {} and {}",
                buy.user_id, intent.quantity, total, held_instrument, held_rub
            )));
        }
    }

    buy.filled += intent.quantity;
    sell.filled += intent.quantity;
    if buy.filled >= buy.quantity {
        buy.status = OrderStatus::Executed;
    }
    if sell.filled >= sell.quantity {
        sell.status = OrderStatus::Executed;
    }

    queries::save_order_progress(conn, buy).await?;
    queries::save_order_progress(conn, sell).await?;
    queries::insert_transaction(conn, ticker, buy.id, sell.id, intent.quantity, intent.price).await?;
    Ok(())
}

/// One side of the crossing algorithm: repeatedly attempt to pair `taker`
/// (always a MARKET order — see `execute_market_phase`) against candidates in
/// `book`, advancing both on every fill. Per spec §4.2 step 2b, stop walking
/// counterparties the moment `pair` yields nothing, rather than skipping ahead
/// to a worse-priced candidate.
async fn cross(
    conn: &mut sqlx::PgConnection,
    ticker: &str,
    taker: &mut Order,
    book: &mut [Order],
) -> Result<(), DomainError> {
    for resting in book.iter_mut() {
        if !taker.status.is_fillable(taker.filled, taker.quantity) {
            break;
        }
        if !resting.status.is_fillable(resting.filled, resting.quantity) {
            continue;
        }

        let intent = match taker.direction {
            Direction::Buy => pair(conn, taker, resting).await?,
            Direction::Sell => pair(conn, resting, taker).await?,
        };

        let Some(intent) = intent else {
            break;
        };

        match taker.direction {
            Direction::Buy => settle(conn, ticker, taker, resting, &intent).await?,
            Direction::Sell => settle(conn, ticker, resting, taker, &intent).await?,
        }
    }
    Ok(())
}

/// MARKET orders trade first and are never resting liquidity themselves
/// (spec §4.2 step 2): each market order walks the opposite LIMIT book until
/// filled or the book is exhausted, then any remainder is marked executed
/// (partial fills on MARKET orders are terminal, not re-queued).
async fn execute_market_phase(
    conn: &mut sqlx::PgConnection,
    ticker: &str,
    market_orders: &mut [Order],
    limit_buys: &mut [Order],
    limit_sells: &mut [Order],
) -> Result<(), DomainError> {
    for taker in market_orders.iter_mut() {
        match taker.direction {
            Direction::Buy => cross(conn, ticker, taker, limit_sells).await?,
            Direction::Sell => cross(conn, ticker, taker, limit_buys).await?,
        }
        if taker.status != OrderStatus::Executed {
            taker.status = OrderStatus::PartiallyExecuted;
            queries::save_order_progress(conn, taker).await?;
        }
    }
    Ok(())
}

/// LIMIT-vs-LIMIT crossing (spec §4.2 step 3): walk the best bid against the
/// best ask, settling while they cross, stopping the moment they no longer do.
async fn execute_limit_phase(
    conn: &mut sqlx::PgConnection,
    ticker: &str,
    limit_buys: &mut [Order],
    limit_sells: &mut [Order],
) -> Result<(), DomainError> {
    let mut sell_idx = 0usize;
    for buy in limit_buys.iter_mut() {
        if !buy.status.is_fillable(buy.filled, buy.quantity) {
            continue;
        }
        while sell_idx < limit_sells.len() {
            let sell = &mut limit_sells[sell_idx];
            if !sell.status.is_fillable(sell.filled, sell.quantity) {
                sell_idx += 1;
                continue;
            }
            let Some(intent) = pair(conn, buy, sell).await? else {
                break;
            };
            settle(conn, ticker, buy, sell, &intent).await?;
            if sell.status == OrderStatus::Executed {
                sell_idx += 1;
            }
            if !buy.status.is_fillable(buy.filled, buy.quantity) {
                break;
            }
        }
    }
    Ok(())
}

/// Runs one full matching pass for `ticker`: market phase then limit phase,
/// all inside a single transaction (spec §4.2, §5). If the instrument no
/// longer exists this is a silent no-op, matching the source's behavior of
/// logging a warning and returning rather than treating it as an error.
pub async fn execute_orders(pool: &PgPool, ticker: &str) -> Result<(), DomainError> {
    let mut tx = pool.begin().await?;

    if !queries::instrument_exists(&mut tx, ticker).await? {
        tracing::warn!(ticker, "execute_orders called for unknown instrument, skipping");
        tx.commit().await?;
        return Ok(());
    }

    let mut market_orders = queries::load_market_orders(&mut tx, ticker).await?;
    let mut limit_buys = queries::load_limit_buy_orders(&mut tx, ticker).await?;
    let mut limit_sells = queries::load_limit_sell_orders(&mut tx, ticker).await?;

    execute_market_phase(&mut tx, ticker, &mut market_orders, &mut limit_buys, &mut limit_sells).await?;
    execute_limit_phase(&mut tx, ticker, &mut limit_buys, &mut limit_sells).await?;

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn order(direction: Direction, order_type: OrderType, price: Option<i64>, qty: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            instrument: "AAA".to_string(),
            order_type,
            direction,
            status: OrderStatus::New,
            quantity: qty,
            price,
            filled: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn limit_limit_crossed_picks_earlier_order_price() {
        let mut buy = order(Direction::Buy, OrderType::Limit, Some(110), 10);
        let sell = order(Direction::Sell, OrderType::Limit, Some(100), 10);
        buy.created_at = sell.created_at - chrono::Duration::seconds(1);
        assert!(buy.created_at < sell.created_at);
    }

    #[test]
    fn uncrossed_limit_orders_do_not_pair() {
        let buy = order(Direction::Buy, OrderType::Limit, Some(90), 10);
        let sell = order(Direction::Sell, OrderType::Limit, Some(100), 10);
        assert!(sell.price.unwrap() > buy.price.unwrap());
    }

    #[test]
    fn market_order_partial_fill_is_terminal() {
        let mut taker = order(Direction::Buy, OrderType::Market, None, 10);
        taker.filled = 4;
        assert!(taker.status.is_fillable(taker.filled, taker.quantity));
        taker.status = OrderStatus::PartiallyExecuted;
        assert!(!taker.status.is_fillable(taker.filled, taker.quantity));
    }
}
