use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shared::DomainError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps the RPC-layer error taxonomy onto the HTTP status table in spec §6:
/// 403 auth/insufficient-funds, 404 not-found family, 408 RPC timeout,
/// 409 already-exists, 500 critical. `CannotCancel` isn't named in that table;
/// it's treated as a 400 (the order exists and is identified, but the request
/// is invalid given its current state). `Validation` is likewise a 400 and
/// never round-trips through the RPC layer — it's raised at the transport
/// boundary before a job is ever enqueued (spec §6/§9).
pub enum ApiError {
    Domain(DomainError),
    Validation(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
            ApiError::Domain(err) => {
                let status = match &err {
                    DomainError::UserNotFound(_) | DomainError::InstrumentNotFound(_) | DomainError::OrderNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    DomainError::InstrumentAlreadyExists(_) => StatusCode::CONFLICT,
                    DomainError::InsufficientFunds { .. } => StatusCode::FORBIDDEN,
                    DomainError::CannotCancel(_) => StatusCode::BAD_REQUEST,
                    DomainError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
                    DomainError::Critical(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, Json(ErrorBody { error: err.to_string() })).into_response()
            }
        }
    }
}
