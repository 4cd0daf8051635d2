//! Admin inbox notifications.
//!
//! A notification records that a booking was created, updated or cancelled.
//! It is independent of any outbound email and only ever changes its read flag.
//! The booking reference is weak: cancelled bookings leave dangling ids behind.

use crate::booking::{Booking, BookingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned notification identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// What happened to the booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Booking created.
    Create,
    /// Booking changed.
    Update,
    /// Booking deleted.
    Cancel,
}

impl ActionType {
    /// Wire and column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

/// A persisted inbox entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Store-assigned id.
    pub id: NotificationId,
    /// Booking this refers to; may no longer exist.
    pub booking_id: Option<BookingId>,
    /// Human-readable summary.
    pub message: String,
    /// Kind of change.
    pub action_type: ActionType,
    /// Whether an admin has seen it.
    pub is_read: bool,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// An inbox entry about to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    /// Booking this refers to.
    pub booking_id: Option<BookingId>,
    /// Human-readable summary.
    pub message: String,
    /// Kind of change.
    pub action_type: ActionType,
}

impl NewNotification {
    /// Entry for a freshly created booking.
    #[must_use]
    pub fn created(booking: &Booking) -> Self {
        Self::about(booking, ActionType::Create, "created a booking")
    }

    /// Entry for a changed booking.
    #[must_use]
    pub fn updated(booking: &Booking) -> Self {
        Self::about(booking, ActionType::Update, "updated a booking")
    }

    /// Entry for a deleted booking.
    #[must_use]
    pub fn cancelled(booking: &Booking) -> Self {
        Self::about(booking, ActionType::Cancel, "cancelled a booking")
    }

    fn about(booking: &Booking, action_type: ActionType, verb: &str) -> Self {
        Self {
            booking_id: Some(booking.id),
            message: format!(
                "{} {verb}. ({} {})",
                booking.company_name,
                booking.date.format("%Y-%m-%d"),
                booking.time
            ),
            action_type,
        }
    }
}
