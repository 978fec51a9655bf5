use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: Uuid,
}

/// Mints a user token, mirroring the source's `generate_user_api_key`.
pub fn issue_user_token(secret: &str, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), &Claims { id: user_id }, &EncodingKey::from_secret(secret.as_bytes()))
}

/// The spec's JWT payload is exactly `{id}` — no `exp` claim, unlike the
/// teacher's `AccessTokenClaims`. `Validation::default()` requires `exp` and
/// would reject every token `issue_user_token` mints, so expiry checking is
/// disabled here instead of inventing a claim the spec doesn't have.
fn token_validation() -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation
}

/// A verified user identity extracted from `Authorization: TOKEN <jwt>`.
pub struct AuthedUser(pub Uuid);

fn split_scheme(header_value: &str) -> Option<(&str, &str)> {
    let mut parts = header_value.splitn(2, ' ');
    let scheme = parts.next()?;
    let credential = parts.next().unwrap_or("").trim();
    Some((scheme, credential))
}

impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::FORBIDDEN, "Missing API key".to_string()))?;

        let (scheme, token) = split_scheme(header_value)
            .ok_or((StatusCode::FORBIDDEN, "Invalid authentication scheme".to_string()))?;
        if !scheme.eq_ignore_ascii_case("token") {
            return Err((StatusCode::FORBIDDEN, "Invalid authentication scheme".to_string()));
        }
        if token.is_empty() {
            return Err((StatusCode::FORBIDDEN, "Missing API key".to_string()));
        }

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &token_validation(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                (StatusCode::UNAUTHORIZED, "API key expired".to_string())
            }
            _ => (StatusCode::UNAUTHORIZED, "Invalid API key".to_string()),
        })?;

        Ok(AuthedUser(decoded.claims.id))
    }
}

/// A verified admin caller: the raw bearer token must equal the configured secret.
pub struct AuthedAdmin;

impl FromRequestParts<AppState> for AuthedAdmin {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::FORBIDDEN, "Missing API key".to_string()))?;

        let (scheme, token) = split_scheme(header_value)
            .ok_or((StatusCode::FORBIDDEN, "Invalid authentication scheme".to_string()))?;
        if !scheme.eq_ignore_ascii_case("token") {
            return Err((StatusCode::FORBIDDEN, "Invalid authentication scheme".to_string()));
        }
        if token.is_empty() {
            return Err((StatusCode::FORBIDDEN, "Missing API key".to_string()));
        }
        if token != state.admin_key {
            return Err((StatusCode::FORBIDDEN, "Invalid API key".to_string()));
        }

        Ok(AuthedAdmin)
    }
}
