use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Direction, Order, OrderStatus, OrderType, User, UserRole};

/// Tagged union of order bodies, replacing the source's dynamically-typed
/// `Union[LimitOrderBody, MarketOrderBody]` with an explicit discriminator
/// validated at the transport boundary (see REDESIGN FLAGS, spec §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "lowercase")]
pub enum OrderBody {
    Limit {
        direction: Direction,
        ticker: String,
        qty: i64,
        price: i64,
    },
    Market {
        direction: Direction,
        ticker: String,
        qty: i64,
    },
}

impl OrderBody {
    /// Transport-boundary validation per spec §6/§9: quantity and price must be
    /// strictly positive, and the ticker must match the instrument grammar.
    /// Replaces the source's dynamic-body validators with an explicit check.
    pub fn validate(&self) -> Result<(), String> {
        if !crate::models::Instrument::valid_ticker(self.ticker()) {
            return Err(format!("invalid ticker: {}", self.ticker()));
        }
        if self.qty() <= 0 {
            return Err("quantity must be a strictly positive integer".to_string());
        }
        if let Some(price) = self.price() {
            if price <= 0 {
                return Err("price must be a strictly positive integer".to_string());
            }
        }
        Ok(())
    }

    pub fn direction(&self) -> Direction {
        match self {
            OrderBody::Limit { direction, .. } | OrderBody::Market { direction, .. } => *direction,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            OrderBody::Limit { ticker, .. } | OrderBody::Market { ticker, .. } => ticker,
        }
    }

    pub fn qty(&self) -> i64 {
        match self {
            OrderBody::Limit { qty, .. } | OrderBody::Market { qty, .. } => *qty,
        }
    }

    pub fn price(&self) -> Option<i64> {
        match self {
            OrderBody::Limit { price, .. } => Some(*price),
            OrderBody::Market { .. } => None,
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self {
            OrderBody::Limit { .. } => OrderType::Limit,
            OrderBody::Market { .. } => OrderType::Market,
        }
    }
}

/// A single order as reported to callers, with the view-layer status projection applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticker: String,
    pub order_type: OrderType,
    pub direction: Direction,
    pub status: OrderStatus,
    pub qty: i64,
    pub price: Option<i64>,
    pub filled: i64,
    pub timestamp: DateTime<Utc>,
}

impl OrderView {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            ticker: order.instrument.clone(),
            order_type: order.order_type,
            direction: order.direction,
            status: order.reported_status(),
            qty: order.quantity,
            price: order.price,
            filled: order.filled,
            timestamp: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub ticker: String,
    pub amount: i64,
    pub price: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookLevel {
    pub price: i64,
    pub qty: i64,
}

// ---- Orders RPC ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub body: OrderBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderRequest {
    pub user_id: Uuid,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderResponse {
    pub order: OrderView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub user_id: Uuid,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderbookRequest {
    pub ticker: String,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderbookResponse {
    pub bid_levels: Vec<OrderbookLevel>,
    pub ask_levels: Vec<OrderbookLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTransactionsRequest {
    pub ticker: String,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTransactionsResponse {
    pub transactions: Vec<TransactionView>,
}

// ---- Users RPC ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBalanceRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBalanceResponse {
    pub balances: std::collections::HashMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub user_id: Uuid,
    pub ticker: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub user_id: Uuid,
    pub ticker: String,
    pub amount: i64,
}

// ---- Instruments RPC ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentView {
    pub ticker: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddInstrumentRequest {
    pub ticker: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteInstrumentRequest {
    pub ticker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetInstrumentsResponse {
    pub instruments: Vec<InstrumentView>,
}
