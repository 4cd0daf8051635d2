//! Shared, ordered record of side-effecting calls.
//!
//! Hand the same [`CallLog`] to the in-memory store and the recording mail
//! provider to assert on the relative order of writes and emails.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use booth_core::mail::{MailingList, Trigger};
use booth_core::{ActionType, BookingId};
use std::sync::{Arc, RwLock};

/// One observed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    /// Booking insert attempted.
    InsertBooking,
    /// Booking update attempted.
    UpdateBooking(BookingId),
    /// Booking delete attempted.
    DeleteBooking(BookingId),
    /// Notification insert attempted.
    InsertNotification(ActionType),
    /// Subscriber upsert attempted.
    Upsert {
        /// Target list.
        list: MailingList,
        /// Subscriber address.
        email: String,
    },
    /// Subscriber listing attempted.
    ListSubscribers(MailingList),
    /// Subscriber removal attempted.
    DeleteSubscriber {
        /// Target list.
        list: MailingList,
        /// Subscriber address.
        email: String,
    },
    /// Trigger attempted.
    Trigger {
        /// Template.
        trigger: Trigger,
        /// Recipient.
        email: String,
    },
}

impl Call {
    /// `true` for booking-table writes.
    #[must_use]
    pub const fn is_booking_write(&self) -> bool {
        matches!(
            self,
            Self::InsertBooking | Self::UpdateBooking(_) | Self::DeleteBooking(_)
        )
    }
}

/// Thread-safe append-only call log.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<RwLock<Vec<Call>>>,
}

impl CallLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    pub fn record(&self, call: Call) {
        self.calls.write().unwrap().push(call);
    }

    /// Snapshot of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.read().unwrap().clone()
    }

    /// Position of the first call matching `predicate`.
    #[must_use]
    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.read().unwrap().iter().position(predicate)
    }

    /// Number of calls matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.read().unwrap().iter().filter(|c| predicate(c)).count()
    }

    /// Number of triggers of one kind.
    #[must_use]
    pub fn triggers(&self, kind: Trigger) -> usize {
        self.count(|c| matches!(c, Call::Trigger { trigger, .. } if *trigger == kind))
    }

    /// Number of booking-table writes.
    #[must_use]
    pub fn booking_writes(&self) -> usize {
        self.count(Call::is_booking_write)
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.calls.write().unwrap().clear();
    }
}
