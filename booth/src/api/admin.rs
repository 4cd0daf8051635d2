//! Admin dashboard endpoints.
//!
//! `login` trades the shared password for a bearer token; every other route
//! requires an [`AdminUser`].

use crate::auth::{AdminSession, AdminUser};
use crate::export;
use crate::lifecycle::{Actor, BookingFilter, BulkCancelOutcome};
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use booth_core::{
    Booking, BookingDraft, BookingId, BookingPatch, Notification, NotificationId, Utc,
};
use std::collections::HashSet;
use booth_web::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Shared admin password.
    pub password: String,
}

/// Bulk cancel request.
#[derive(Debug, Deserialize)]
pub struct BulkCancelRequest {
    /// Bookings to cancel.
    pub ids: Vec<BookingId>,
}

/// Export selection; `ids` is a comma-separated list, absent for everything.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Selected booking ids.
    #[serde(default)]
    pub ids: Option<String>,
}

impl ExportQuery {
    fn selection(&self) -> Result<HashSet<BookingId>, AppError> {
        self.ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse()
                    .map_err(|_| AppError::bad_request(format!("Invalid booking id: {raw}")))
            })
            .collect()
    }
}

/// Bulk cancel response.
#[derive(Debug, Serialize)]
pub struct BulkCancelResponse {
    /// How many were cancelled.
    pub cancelled: usize,
    /// Per-id outcome, in request order.
    pub results: Vec<BulkCancelOutcome>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start an admin session.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/login
/// ```
///
/// # Errors
///
/// - 401 for a wrong password
/// - 503 when no admin password is configured
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AdminSession>, AppError> {
    Ok(Json(state.sessions.login(&request.password).await?))
}

/// End the caller's session.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/logout
/// ```
pub async fn logout(admin: AdminUser, State(state): State<AppState>) -> StatusCode {
    state.sessions.revoke(&admin.token).await;
    StatusCode::NO_CONTENT
}

/// Every booking passing the filter, by date then time.
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/bookings?search=&product_interest=&customer_type=
/// ```
pub async fn list_bookings(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.lifecycle.list_all(&filter).await?))
}

/// Download bookings as CSV, all of them or only the selected ids.
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/bookings/export?ids=<id>,<id>
/// ```
///
/// # Errors
///
/// - 400 for a malformed id
/// - 500 if the store read or the CSV encoding fails
pub async fn export_bookings(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let selection = query.selection()?;
    let mut bookings = state.lifecycle.list_all(&BookingFilter::default()).await?;
    if !selection.is_empty() {
        bookings.retain(|b| selection.contains(&b.id));
    }

    let body = export::bookings_csv(&bookings)
        .map_err(|e| AppError::internal("Export failed").with_source(e))?;
    let file_name = export::file_name(!selection.is_empty(), Utc::now().date_naive());
    tracing::info!(rows = bookings.len(), "Bookings exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}

/// Book on a visitor's behalf; admins may assign a host.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/bookings
/// ```
pub async fn create_booking(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.lifecycle.create(draft, &Actor::Admin).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Change any field of a booking.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/admin/bookings/:id
/// ```
pub async fn update_booking(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.update(id, patch, &Actor::Admin).await?))
}

/// Cancel a booking.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/admin/bookings/:id
/// ```
pub async fn cancel_booking(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.cancel(id, &Actor::Admin).await?))
}

/// Cancel several bookings, one at a time.
///
/// Always 200; failures are reported per id.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/bookings/bulk-delete
/// ```
pub async fn bulk_cancel(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(request): Json<BulkCancelRequest>,
) -> Json<BulkCancelResponse> {
    let results = state.lifecycle.bulk_cancel(request.ids).await;
    let cancelled = results.iter().filter(|r| r.cancelled).count();
    Json(BulkCancelResponse { cancelled, results })
}

/// Mark a booking as seen.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/bookings/:id/read
/// ```
pub async fn mark_read(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.mark_read(id).await?))
}

/// Admin inbox, newest first.
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/notifications
/// ```
pub async fn list_notifications(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.lifecycle.list_notifications().await?))
}

/// Mark an inbox entry as read.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/notifications/:id/read
/// ```
pub async fn mark_notification_read(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    state.lifecycle.mark_notification_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
