//! Public booking endpoints.
//!
//! Visitors book without an account; the email they booked with is the
//! credential for viewing, changing and cancelling later.

use crate::lifecycle::Actor;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use booth_core::{Booking, BookingDraft, BookingId, BookingPatch};
use booth_web::AppError;
use serde::Deserialize;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query carrying the owner's email.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    /// Email the booking was made with.
    #[serde(default)]
    pub email: Option<String>,
}

/// Owner change request.
#[derive(Debug, Deserialize)]
pub struct OwnerUpdateRequest {
    /// Email the booking was made with.
    pub email: String,
    /// Fields to change.
    pub changes: BookingPatch,
}

// ============================================================================
// Handlers
// ============================================================================

/// Book a meeting.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings
/// ```
///
/// # Errors
///
/// - 422 for invalid fields or slots
/// - 409 when the slot is taken
/// - 504 when the write could not be confirmed in time
pub async fn create_booking(
    State(state): State<AppState>,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.lifecycle.create(draft, &Actor::Visitor).await?;

    tracing::info!(booking_id = %booking.id, slot = %booking.slot(), "Booking created");

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings made with an email, newest first.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings?email=<email>
/// ```
pub async fn find_bookings(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let email = query.email.unwrap_or_default();
    let bookings = state.lifecycle.find_by_email(&email).await?;
    Ok(Json(bookings))
}

/// One booking, as linked from the confirmation email.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings/:id
/// ```
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.get(id).await?))
}

/// Owner edit.
///
/// Only the visitor-editable fields may change; the host and status stay
/// with the admins.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/bookings/:id
/// ```
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(request): Json<OwnerUpdateRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = Actor::owner(request.email);
    let booking = state.lifecycle.update(id, request.changes, &actor).await?;
    Ok(Json(booking))
}

/// Owner cancellation.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/bookings/:id?email=<email>
/// ```
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Booking>, AppError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("email is required to cancel a booking"))?;

    let booking = state.lifecycle.cancel(id, &Actor::owner(email)).await?;

    tracing::info!(booking_id = %booking.id, "Booking cancelled by owner");

    Ok(Json(booking))
}
