//! CSV export of bookings for the admin dashboard.
//!
//! One row per booking, columns in [`HEADERS`] order. The customer type
//! column holds the effective type, and the message column drops the legacy
//! trading-experience marker.

use booth_core::{Booking, NaiveDate};
use thiserror::Error;

/// Column headers, in order.
pub const HEADERS: [&str; 12] = [
    "ID",
    "Name",
    "Email",
    "Company",
    "Country",
    "Product",
    "Inquiry Type",
    "Customer Type",
    "Date",
    "Time",
    "Message",
    "Created At",
];

/// Failure while rendering the export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A record could not be written.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// The buffer could not be flushed.
    #[error("CSV flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders `bookings` as CSV, header row first.
///
/// # Errors
///
/// Returns [`ExportError`] if the writer fails.
pub fn bookings_csv(bookings: &[Booking]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for booking in bookings {
        writer.write_record([
            booking.id.to_string(),
            booking.name.clone(),
            booking.email.clone(),
            booking.company_name.clone(),
            booking.country.clone(),
            booking.product_interest.to_string(),
            booking.inquiry_type.to_string(),
            booking
                .effective_customer_type()
                .map(|t| t.to_string())
                .unwrap_or_default(),
            booking.date.to_string(),
            booking.time.to_string(),
            booking.message_without_marker(),
            booking.created_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Download name, e.g. `booth_bookings_selected_260209.csv`.
#[must_use]
pub fn file_name(selected: bool, today: NaiveDate) -> String {
    let scope = if selected { "_selected" } else { "" };
    format!("booth_bookings{scope}_{}.csv", today.format("%y%m%d"))
}
