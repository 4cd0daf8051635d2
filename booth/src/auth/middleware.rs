//! Axum extractors guarding admin routes.
//!
//! ```rust,ignore
//! async fn list_bookings(admin: AdminUser, State(state): State<AppState>) -> ... {
//!     // admin.token names a live session
//! }
//! ```

use crate::auth::{AdminSessions, SessionError};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use booth_web::{AppError, BearerToken};

/// An authenticated admin.
///
/// Extracting this validates the bearer token against [`AdminSessions`];
/// a missing, unknown or expired token rejects with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    /// The session token the request presented.
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AdminSessions: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let sessions = AdminSessions::from_ref(state);
        sessions.validate(&token).await.map_err(|error| {
            tracing::debug!(%error, "Admin token rejected");
            AppError::from(error)
        })?;

        Ok(Self { token })
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Disabled => Self::unavailable("Admin login is not configured"),
            SessionError::InvalidPassword => Self::unauthorized("Invalid password"),
            SessionError::InvalidToken => Self::unauthorized("Invalid or revoked session"),
            SessionError::Expired => Self::unauthorized("Session expired, please log in again"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode, header};
    use booth_testing::mocks::test_clock;
    use std::sync::Arc;

    fn sessions() -> AdminSessions {
        AdminSessions::new(
            Some("hunter2".into()),
            chrono::Duration::hours(1),
            Arc::new(test_clock()),
        )
    }

    async fn extract(sessions: &AdminSessions, token: &str) -> Result<AdminUser, AppError> {
        let (mut parts, ()) = Request::builder()
            .uri("/api/admin/bookings")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        AdminUser::from_request_parts(&mut parts, sessions).await
    }

    #[tokio::test]
    async fn live_session_is_admitted() {
        let sessions = sessions();
        let session = sessions.login("hunter2").await.unwrap();

        let admin = extract(&sessions, &session.token).await.unwrap();
        assert_eq!(admin.token, session.token);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let err = extract(&sessions(), "forged").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn disabled_login_is_unavailable() {
        assert_eq!(
            AppError::from(SessionError::Disabled).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
