use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
}

impl Instrument {
    pub const SETTLEMENT_TICKER: &'static str = "RUB";

    /// Matches the spec's `^[A-Z]{2,10}$` ticker grammar.
    pub fn valid_ticker(ticker: &str) -> bool {
        let len = ticker.len();
        (2..=10).contains(&len) && ticker.bytes().all(|b| b.is_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Balance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BalanceHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument: String,
    pub amount: i64,
    pub operation: OperationType,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

/// Stored status. `PartiallyExecuted` is only ever persisted for MARKET orders
/// (see `OrderStatus::projected`); LIMIT orders stay `New` while partially filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    PartiallyExecuted,
    Executed,
    Cancelled,
}

impl OrderStatus {
    /// View-layer projection per spec §4.2: a LIMIT order with `0 < filled < quantity`
    /// reports as `PartiallyExecuted` even though its stored status is still `New`.
    pub fn projected(stored: OrderStatus, order_type: OrderType, filled: i64, quantity: i64) -> OrderStatus {
        if stored == OrderStatus::New && order_type == OrderType::Limit && filled > 0 && filled < quantity {
            OrderStatus::PartiallyExecuted
        } else {
            stored
        }
    }

    /// The matching loop's fillability predicate, independent of the view projection.
    pub fn is_fillable(&self, filled: i64, quantity: i64) -> bool {
        *self == OrderStatus::New && filled < quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument: String,
    #[sqlx(rename = "type")]
    pub order_type: OrderType,
    pub direction: Direction,
    pub status: OrderStatus,
    pub quantity: i64,
    pub price: Option<i64>,
    pub filled: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> i64 {
        self.quantity - self.filled
    }

    pub fn reported_status(&self) -> OrderStatus {
        OrderStatus::projected(self.status, self.order_type, self.filled, self.quantity)
    }
}

/// `buyer_order_id`/`seller_order_id` are nullable: deleting a user cascades
/// their orders but never their trade history (spec §4.5/§6), so an order row
/// referenced by a transaction can disappear out from under it, leaving the
/// column `SET NULL` rather than blocking the delete.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub instrument: String,
    pub buyer_order_id: Option<Uuid>,
    pub seller_order_id: Option<Uuid>,
    pub quantity: i64,
    pub price: i64,
    pub executed_at: DateTime<Utc>,
}
