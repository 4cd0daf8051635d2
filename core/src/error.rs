//! Error taxonomy shared by every booking operation.
//!
//! The four families mirror how failures surface to callers:
//!
//! - [`ValidationError`]: bad input, caught before any store access
//! - [`LifecycleError::SlotTaken`]: the advisory availability check failed
//! - [`StoreError`]: the system of record failed or timed out
//! - [`MailError`]: the mail provider failed; only ever logged by the lifecycle

use crate::booking::BookingId;
use crate::calendar::{Slot, SlotTime};
use crate::notification::NotificationId;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Invalid or missing booking input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank after trimming.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A text field exceeded its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum number of characters.
        max: usize,
    },

    /// Email address is not well-formed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Time string could not be parsed as `HH:MM`.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Date is not one of the exhibition days.
    #[error("{0} is not an exhibition day")]
    DateNotOffered(NaiveDate),

    /// Time is not on a half-hour boundary.
    #[error("{0} is not on a 30-minute boundary")]
    NotOnSlotBoundary(SlotTime),

    /// Time falls outside the day's operating window.
    #[error("{time} is outside operating hours on {date}")]
    OutsideOperatingHours {
        /// Requested day.
        date: NaiveDate,
        /// Requested time.
        time: SlotTime,
    },

    /// Meeting host is not on the roster.
    #[error("unknown meeting host: {0}")]
    UnknownHost(String),

    /// An update carried no changes.
    #[error("no changes supplied")]
    EmptyPatch,
}

impl ValidationError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::TooLong { .. } => "FIELD_TOO_LONG",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::InvalidTime(_) => "INVALID_TIME",
            Self::DateNotOffered(_) => "DATE_NOT_OFFERED",
            Self::NotOnSlotBoundary(_) | Self::OutsideOperatingHours { .. } => "INVALID_SLOT",
            Self::UnknownHost(_) => "UNKNOWN_HOST",
            Self::EmptyPatch => "EMPTY_PATCH",
        }
    }
}

/// Failures of the persistent store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Booking row does not exist.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Notification row does not exist.
    #[error("notification not found: {0}")]
    NotificationNotFound(NotificationId),

    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Connection or query failure.
    #[error("database error: {0}")]
    Database(String),

    /// A row could not be mapped to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Failures talking to the mail provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// Credentials, list id or trigger URL missing from configuration.
    #[error("mail provider not configured: {0}")]
    NotConfigured(&'static str),

    /// Request never produced a response.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("mail provider rejected request ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("unexpected mail provider response: {0}")]
    Decode(String),
}

/// Errors surfaced by booking operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Input rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another booking holds the slot.
    #[error("slot {0} is already booked")]
    SlotTaken(Slot),

    /// No booking with that id (or the caller does not own it).
    #[error("booking not found: {0}")]
    NotFound(BookingId),

    /// Notification id unknown.
    #[error("notification not found: {0}")]
    NotificationNotFound(NotificationId),

    /// The store write did not finish in time; its outcome is unknown.
    #[error("store write timed out after {0:?}")]
    StoreTimeout(Duration),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookingNotFound(id) => Self::NotFound(id),
            StoreError::NotificationNotFound(id) => Self::NotificationNotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Result alias for booking operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
