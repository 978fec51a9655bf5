use shared::dto::CreateOrderRequest;
use shared::models::{Direction, Instrument, OrderType};
use shared::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::queries;
use crate::reservations;

const RUB: &str = Instrument::SETTLEMENT_TICKER;

/// Validates and inserts a new order, per spec §4.1's six admission steps.
/// Matching itself happens afterwards, under the per-instrument lock — this
/// function only decides whether the order is allowed to exist at all.
pub async fn create_order(pool: &PgPool, req: CreateOrderRequest) -> Result<Uuid, DomainError> {
    let ticker = req.body.ticker().to_string();
    if !Instrument::valid_ticker(&ticker) {
        return Err(DomainError::InstrumentNotFound(ticker));
    }

    let mut tx = pool.begin().await?;

    if !queries::instrument_exists(&mut tx, &ticker).await? {
        return Err(DomainError::InstrumentNotFound(ticker));
    }
    if !queries::user_exists(&mut tx, req.user_id).await? {
        return Err(DomainError::user_not_found(req.user_id));
    }

    match (req.body.direction(), req.body.order_type()) {
        (Direction::Sell, _) => {
            let owned = reservations::current_balance(&mut tx, req.user_id, &ticker).await?;
            let reserved = reservations::reserved_sell(&mut tx, req.user_id, &ticker).await?;
            let available = owned - reserved;
            if available < req.body.qty() {
                return Err(DomainError::insufficient_funds(req.user_id, req.body.qty(), available));
            }
        }
        (Direction::Buy, OrderType::Limit) => {
            let price = req.body.price().expect("limit order body always carries a price");
            let requested = req.body.qty() * price;
            let owned_rub = reservations::current_balance(&mut tx, req.user_id, RUB).await?;
            let reserved_rub = reservations::reserved_buy(&mut tx, req.user_id).await?;
            let available = owned_rub - reserved_rub;
            if available < requested {
                return Err(DomainError::insufficient_funds(req.user_id, requested, available));
            }
        }
        (Direction::Buy, OrderType::Market) => {
            // A market buy's notional isn't known until it matches, so there's
            // nothing to reserve up front (spec §4.1, §9 — resolved).
        }
    }

    let order_id = queries::insert_order(&mut tx, req.user_id, &req.body).await?;

    tx.commit().await?;
    Ok(order_id)
}

#[cfg(test)]
mod tests {
    use shared::models::Instrument;

    #[test]
    fn rejects_malformed_tickers() {
        assert!(!Instrument::valid_ticker("a"));
        assert!(!Instrument::valid_ticker("toolongtickersymbol"));
        assert!(!Instrument::valid_ticker("abc"));
        assert!(Instrument::valid_ticker("AAPL"));
    }
}
