//! Admin dashboard sessions.
//!
//! One shared password, checked in constant time, buys a random bearer token
//! that expires after the configured TTL. Sessions live in memory, so a
//! restart logs every admin out.

pub mod middleware;

pub use middleware::AdminUser;

use base64::Engine;
use booth_core::environment::Clock;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Session errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No admin password is configured, so nobody can log in.
    #[error("admin login is disabled")]
    Disabled,

    /// Wrong password.
    #[error("invalid password")]
    InvalidPassword,

    /// Unknown or revoked token.
    #[error("invalid session token")]
    InvalidToken,

    /// The session outlived its TTL.
    #[error("session expired")]
    Expired,
}

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    /// Bearer token.
    pub token: String,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
}

/// In-memory session registry.
#[derive(Clone)]
pub struct AdminSessions {
    password: Option<Arc<str>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    sessions: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl AdminSessions {
    /// Registry accepting `password`; `None` disables login.
    #[must_use]
    pub fn new(password: Option<String>, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            password: password.map(Arc::from),
            ttl,
            clock,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Checks `password` and issues a session.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Disabled`] when no password is configured
    /// - [`SessionError::InvalidPassword`] when it does not match
    pub async fn login(&self, password: &str) -> Result<AdminSession, SessionError> {
        let expected = self.password.as_deref().ok_or(SessionError::Disabled)?;
        if !constant_time_eq::constant_time_eq(password.as_bytes(), expected.as_bytes()) {
            tracing::warn!("Admin login rejected");
            return Err(SessionError::InvalidPassword);
        }

        let now = self.clock.now();
        let session = AdminSession {
            token: generate_token(),
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(session.token.clone(), session.expires_at);
        tracing::info!(expires_at = %session.expires_at, "Admin session issued");

        Ok(session)
    }

    /// Checks that `token` names a live session.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidToken`] for unknown tokens
    /// - [`SessionError::Expired`] for expired ones, which are dropped
    pub async fn validate(&self, token: &str) -> Result<(), SessionError> {
        let now = self.clock.now();
        let expires_at = self
            .sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;

        if now >= expires_at {
            self.sessions.write().await.remove(token);
            return Err(SessionError::Expired);
        }
        Ok(())
    }

    /// Ends a session. Returns `false` when it did not exist.
    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            tracing::info!("Admin session revoked");
        }
        removed
    }

    /// Number of sessions currently held, live or not yet purged.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// `true` when no sessions are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// 256 random bits as unpadded base64url (43 characters).
fn generate_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}
