//! Exhibition calendar endpoints.

use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use booth_core::booking::MEETING_HOSTS;
use booth_core::calendar::ExhibitionDay;
use booth_core::{BookingId, CustomerType, InquiryType, NaiveDate, ProductInterest, SlotAvailability};
use booth_web::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Everything the booking form needs to render.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    /// Exhibition days with their operating windows.
    pub days: Vec<ExhibitionDay>,
    /// Allowed product interests.
    pub product_interests: Vec<&'static str>,
    /// Allowed inquiry types.
    pub inquiry_types: Vec<&'static str>,
    /// Allowed customer types.
    pub customer_types: Vec<&'static str>,
    /// Hosts an admin may assign.
    pub hosts: Vec<&'static str>,
}

/// Query for `GET /api/availability/:date`.
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    /// Booking being edited, whose own slot counts as free.
    pub exclude: Option<BookingId>,
}

/// Slots of one day.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// The day.
    pub date: NaiveDate,
    /// Each slot and whether it can be booked.
    pub slots: Vec<SlotAvailability>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Exhibition days, enum values and the host roster.
///
/// # Endpoint
///
/// ```text
/// GET /api/calendar
/// ```
#[allow(clippy::unused_async)]
pub async fn calendar(State(state): State<AppState>) -> Json<CalendarResponse> {
    Json(CalendarResponse {
        days: state.lifecycle.calendar().days().to_vec(),
        product_interests: ProductInterest::ALL.iter().map(ProductInterest::as_str).collect(),
        inquiry_types: InquiryType::ALL.iter().map(InquiryType::as_str).collect(),
        customer_types: CustomerType::ALL.iter().map(CustomerType::as_str).collect(),
        hosts: MEETING_HOSTS.to_vec(),
    })
}

/// Slot availability for one exhibition day.
///
/// # Endpoint
///
/// ```text
/// GET /api/availability/:date?exclude=<booking id>
/// ```
///
/// # Errors
///
/// - 400 when `date` is not `YYYY-MM-DD`
/// - 422 when it is not an exhibition day
pub async fn availability(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("Invalid date: {date}")))?;

    let slots = state.lifecycle.availability(date, query.exclude).await?;

    Ok(Json(AvailabilityResponse { date, slots }))
}
