//! In-memory booking and notification store.
//!
//! Behaves like the bookings/notifications tables without a uniqueness
//! constraint on `(date, time)`, so check-then-insert races stay observable.
//! Switches inject failures into individual operations.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use crate::call_log::{Call, CallLog};
use booth_core::environment::{BookingStore, EnvFuture, NotificationStore};
use booth_core::{
    Booking, BookingDraft, BookingId, BookingPatch, DateTime, NaiveDate, NewNotification,
    Notification, NotificationId, Slot, StatusFlag, StoreError, Utc,
};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Faults {
    fail_inserts: AtomicBool,
    hang_inserts: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    fail_notifications: AtomicBool,
    fail_reads: AtomicBool,
}

/// `HashMap`-backed implementation of both store traits.
///
/// # Example
///
/// ```
/// use booth_testing::{InMemoryBookingStore, fixtures};
/// use booth_core::{BookingStore, StatusFlag};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryBookingStore::new();
/// let booking = store
///     .insert_booking(fixtures::draft("2026-02-09", "10:00"), StatusFlag::New)
///     .await
///     .unwrap();
/// assert_eq!(store.len(), 1);
/// assert!(store.get_booking(booking.id).await.unwrap().is_some());
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    notifications: Arc<RwLock<Vec<Notification>>>,
    sequence: Arc<AtomicI64>,
    epoch: DateTime<Utc>,
    faults: Arc<Faults>,
    log: CallLog,
}

impl InMemoryBookingStore {
    /// An empty store with its own call log.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    /// An empty store recording into `log`.
    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            bookings: Arc::new(RwLock::new(HashMap::new())),
            notifications: Arc::new(RwLock::new(Vec::new())),
            sequence: Arc::new(AtomicI64::new(0)),
            epoch: crate::mocks::test_clock_time(),
            faults: Arc::new(Faults::default()),
            log,
        }
    }

    /// The call log this store records into.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Number of bookings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.read().unwrap().len()
    }

    /// `true` when there are no bookings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookings.read().unwrap().is_empty()
    }

    /// Snapshot of one booking.
    #[must_use]
    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings.read().unwrap().get(&id).cloned()
    }

    /// Snapshot of every notification, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().unwrap().clone()
    }

    /// Inserts a booking directly, bypassing fault switches and the log.
    pub fn seed(&self, draft: BookingDraft) -> Booking {
        let booking = Booking::from_draft(BookingId::new(), draft, StatusFlag::New, self.tick());
        self.bookings
            .write()
            .unwrap()
            .insert(booking.id, booking.clone());
        booking
    }

    /// Make inserts fail with a database error.
    pub fn fail_inserts(&self, on: bool) {
        self.faults.fail_inserts.store(on, Ordering::SeqCst);
    }

    /// Make inserts never complete.
    pub fn hang_inserts(&self, on: bool) {
        self.faults.hang_inserts.store(on, Ordering::SeqCst);
    }

    /// Make updates fail with a database error.
    pub fn fail_updates(&self, on: bool) {
        self.faults.fail_updates.store(on, Ordering::SeqCst);
    }

    /// Make deletes fail with a database error.
    pub fn fail_deletes(&self, on: bool) {
        self.faults.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Make notification inserts fail with a database error.
    pub fn fail_notifications(&self, on: bool) {
        self.faults.fail_notifications.store(on, Ordering::SeqCst);
    }

    /// Make booking reads fail with a database error.
    pub fn fail_reads(&self, on: bool) {
        self.faults.fail_reads.store(on, Ordering::SeqCst);
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.epoch + Duration::seconds(n)
    }

    fn injected(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Database(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<Vec<Booking>, StoreError> {
        Self::injected(&self.faults.fail_reads, "read")?;
        let mut all: Vec<Booking> = self.bookings.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| (a.date, a.time, a.created_at).cmp(&(b.date, b.time, b.created_at)));
        Ok(all)
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn insert_booking(
        &self,
        draft: BookingDraft,
        status: StatusFlag,
    ) -> EnvFuture<'_, Result<Booking, StoreError>> {
        Box::pin(async move {
            self.log.record(Call::InsertBooking);
            if self.faults.hang_inserts.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Self::injected(&self.faults.fail_inserts, "insert")?;
            let booking = Booking::from_draft(BookingId::new(), draft, status, self.tick());
            self.bookings
                .write()
                .unwrap()
                .insert(booking.id, booking.clone());
            Ok(booking)
        })
    }

    fn get_booking(&self, id: BookingId) -> EnvFuture<'_, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            Self::injected(&self.faults.fail_reads, "read")?;
            Ok(self.booking(id))
        })
    }

    fn bookings_at(&self, slot: Slot) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            Ok(self
                .read()?
                .into_iter()
                .filter(|b| b.slot() == slot)
                .collect())
        })
    }

    fn bookings_on(&self, date: NaiveDate) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move { Ok(self.read()?.into_iter().filter(|b| b.date == date).collect()) })
    }

    fn list_bookings(&self) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move { self.read() })
    }

    fn bookings_by_email(
        &self,
        email: String,
    ) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            let mut found: Vec<Booking> = self
                .read()?
                .into_iter()
                .filter(|b| b.is_owned_by(&email))
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(found)
        })
    }

    fn update_booking(
        &self,
        id: BookingId,
        patch: BookingPatch,
    ) -> EnvFuture<'_, Result<Booking, StoreError>> {
        Box::pin(async move {
            self.log.record(Call::UpdateBooking(id));
            Self::injected(&self.faults.fail_updates, "update")?;
            let mut bookings = self.bookings.write().unwrap();
            let current = bookings.get_mut(&id).ok_or(StoreError::BookingNotFound(id))?;
            *current = patch.apply(current);
            Ok(current.clone())
        })
    }

    fn delete_booking(&self, id: BookingId) -> EnvFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.log.record(Call::DeleteBooking(id));
            Self::injected(&self.faults.fail_deletes, "delete")?;
            self.bookings
                .write()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::BookingNotFound(id))
        })
    }
}

impl NotificationStore for InMemoryBookingStore {
    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> EnvFuture<'_, Result<Notification, StoreError>> {
        Box::pin(async move {
            self.log
                .record(Call::InsertNotification(notification.action_type));
            Self::injected(&self.faults.fail_notifications, "notification")?;
            let row = Notification {
                id: NotificationId::new(),
                booking_id: notification.booking_id,
                message: notification.message,
                action_type: notification.action_type,
                is_read: false,
                created_at: self.tick(),
            };
            self.notifications.write().unwrap().push(row.clone());
            Ok(row)
        })
    }

    fn list_notifications(&self) -> EnvFuture<'_, Result<Vec<Notification>, StoreError>> {
        Box::pin(async move {
            let mut rows = self.notifications();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        })
    }

    fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> EnvFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut rows = self.notifications.write().unwrap();
            let row = rows
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or(StoreError::NotificationNotFound(id))?;
            row.is_read = true;
            Ok(())
        })
    }
}
