use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The error taxonomy shared by every RPC service and round-tripped across the
/// queue boundary as part of the job result envelope (see `rpc::Envelope`).
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DomainError {
    #[error("User with ID {0} not found.")]
    UserNotFound(String),

    #[error("Instrument with ticker {0} not found.")]
    InstrumentNotFound(String),

    #[error("Order with ID {0} not found.")]
    OrderNotFound(String),

    #[error("Instrument with ticker {0} already exists.")]
    InstrumentAlreadyExists(String),

    #[error("User {user} has insufficient funds. Requested: {requested}, Available: {available}.")]
    InsufficientFunds {
        user: String,
        requested: i64,
        available: i64,
    },

    #[error("Cannot cancel order: {0}")]
    CannotCancel(String),

    #[error("CriticalError: {0}")]
    Critical(String),

    #[error("Request timed out")]
    RequestTimeout,
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound(id.to_string())
    }

    pub fn order_not_found(id: Uuid) -> Self {
        Self::OrderNotFound(id.to_string())
    }

    pub fn insufficient_funds(user: Uuid, requested: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            user: user.to_string(),
            requested,
            available,
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::Critical(message.into())
    }
}

/// `sqlx::Error` never crosses the RPC boundary directly; any unexpected database
/// failure becomes a `CriticalError`, matching the source's catch-all `except Exception`
/// blocks around every service method.
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Critical(format!("Unexpected error: {err}"))
    }
}

/// Handlers build their JSON response with `serde_json::to_value(...)?`; a
/// failure there means a response DTO didn't serialize, which is always a bug
/// rather than a caller-facing condition.
impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Critical(format!("serialization error: {err}"))
    }
}
