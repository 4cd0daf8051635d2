//! Custom Axum extractors.
//!
//! - [`BearerToken`]: the token from an `Authorization: Bearer <token>` header
//!
//! # Examples
//!
//! ```ignore
//! use booth_web::extractors::BearerToken;
//!
//! async fn logout(State(state): State<AppState>, token: BearerToken) -> StatusCode {
//!     state.sessions.revoke(&token.0);
//!     StatusCode::NO_CONTENT
//! }
//! ```

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts};
use http::{header, request::Parts};

/// Bearer credential presented by the caller.
///
/// Rejects with 401 when the header is missing, not `Bearer`, or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let (scheme, token) = value
            .split_once(' ')
            .ok_or_else(|| AppError::unauthorized("Malformed Authorization header"))?;

        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AppError::unauthorized("Expected a bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}
