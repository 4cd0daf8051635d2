//! Axum integration for booth reservations.
//!
//! Handlers stay thin: extract the request, call the booking lifecycle, map
//! the result. This crate holds the pieces every handler shares.
//!
//! # Request Flow
//!
//! 1. **Correlation span** opened by [`middleware::correlation_id_layer`]
//! 2. **Extract data** from request (JSON, path, query, bearer token)
//! 3. **Call** the booking lifecycle
//! 4. **Map result** to HTTP response, errors via [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use booth_web::{AppError, WebResult};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create_booking(
//!     State(state): State<AppState>,
//!     Json(draft): Json<BookingDraft>,
//! ) -> WebResult<(StatusCode, Json<Booking>)> {
//!     let booking = state.lifecycle.create(draft).await?;
//!     Ok((StatusCode::CREATED, Json(booking)))
//! }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::BearerToken;
pub use middleware::{
    CORRELATION_ID_HEADER, CorrelationId, CorrelationIdExt, correlation_id_layer, permissive_cors,
};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
