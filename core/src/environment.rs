//! Injected dependencies.
//!
//! The booking lifecycle talks to the outside world only through these traits:
//! a clock, the system of record, and the mail provider. Production adapters
//! live in the application crate; in-memory doubles live in `booth-testing`.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` rather than `async fn` so adapters can
//! be held as `Arc<dyn BookingStore>` and captured by background effects.

use crate::booking::{Booking, BookingDraft, BookingId, StatusFlag};
use crate::calendar::Slot;
use crate::error::{MailError, StoreError};
use crate::mail::{MailingList, Subscriber, SubscriberUpsert, TemplateFields, Trigger};
use crate::notification::{NewNotification, Notification, NotificationId};
use crate::patch::BookingPatch;
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by environment traits.
pub type EnvFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The bookings table.
///
/// A plain row store: no availability rules live here. Implementations may
/// add a uniqueness constraint on `(date, time)` and report it as
/// [`StoreError::UniqueViolation`].
pub trait BookingStore: Send + Sync {
    /// Inserts a row and returns it with its store-assigned id and timestamp.
    ///
    /// # Errors
    ///
    /// - `UniqueViolation`: the slot is already taken at the store level
    /// - `Database`: the write failed
    fn insert_booking(
        &self,
        draft: BookingDraft,
        status: StatusFlag,
    ) -> EnvFuture<'_, Result<Booking, StoreError>>;

    /// Loads one booking, `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn get_booking(&self, id: BookingId) -> EnvFuture<'_, Result<Option<Booking>, StoreError>>;

    /// All bookings occupying `slot`. Normally zero or one.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn bookings_at(&self, slot: Slot) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// All bookings on `date`.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn bookings_on(&self, date: NaiveDate) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// Every booking, ordered by date then time.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn list_bookings(&self) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// Bookings whose email matches case-insensitively, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn bookings_by_email(&self, email: String)
    -> EnvFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// Writes only the supplied fields and returns the stored row.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound`: no row with that id
    /// - `UniqueViolation`: the new slot is taken at the store level
    /// - `Database`: the write failed
    fn update_booking(
        &self,
        id: BookingId,
        patch: BookingPatch,
    ) -> EnvFuture<'_, Result<Booking, StoreError>>;

    /// Hard-deletes a row, freeing its slot.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound`: no row with that id
    /// - `Database`: the delete failed
    fn delete_booking(&self, id: BookingId) -> EnvFuture<'_, Result<(), StoreError>>;
}

/// The notifications table.
pub trait NotificationStore: Send + Sync {
    /// Inserts an unread entry.
    ///
    /// # Errors
    ///
    /// Returns `Database` when the write fails.
    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> EnvFuture<'_, Result<Notification, StoreError>>;

    /// Every entry, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` or `Corrupt` when the read fails.
    fn list_notifications(&self) -> EnvFuture<'_, Result<Vec<Notification>, StoreError>>;

    /// Sets the read flag.
    ///
    /// # Errors
    ///
    /// - `NotificationNotFound`: no row with that id
    /// - `Database`: the write failed
    fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> EnvFuture<'_, Result<(), StoreError>>;
}

/// Third-party mailing-list provider.
///
/// Every call is a single attempt; retries are not part of the contract.
pub trait MailProvider: Send + Sync {
    /// Adds or updates a contact in `list`. Idempotent per email.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] when the provider is unconfigured, unreachable or rejects the call.
    fn upsert_subscriber(
        &self,
        list: MailingList,
        subscriber: SubscriberUpsert,
    ) -> EnvFuture<'_, Result<(), MailError>>;

    /// Current members of `list`.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] when the provider is unconfigured, unreachable or rejects the call.
    fn list_subscribers(
        &self,
        list: MailingList,
    ) -> EnvFuture<'_, Result<Vec<Subscriber>, MailError>>;

    /// Removes a contact from `list`.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] when the provider is unconfigured, unreachable or rejects the call.
    fn delete_subscriber(
        &self,
        list: MailingList,
        email: String,
    ) -> EnvFuture<'_, Result<(), MailError>>;

    /// Sends the templated email behind `trigger` to one address.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] when the provider is unconfigured, unreachable or rejects the call.
    fn fire_trigger(
        &self,
        trigger: Trigger,
        email: String,
        extra: TemplateFields,
    ) -> EnvFuture<'_, Result<(), MailError>>;

    /// Checks, without calling out, that the credentials, `lists` and
    /// `triggers` an operation needs are all configured.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::NotConfigured`] naming the first missing setting.
    fn ensure_configured(
        &self,
        _lists: &[MailingList],
        _triggers: &[Trigger],
    ) -> Result<(), MailError> {
        Ok(())
    }
}
