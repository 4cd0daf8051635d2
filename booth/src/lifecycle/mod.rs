//! Booking lifecycle manager.
//!
//! The one place that turns a visitor or admin intent (book, edit, cancel)
//! into a durable change plus the right outbound emails:
//!
//! ```text
//! validate ─► advisory slot check ─► store write ─► notification row ─► mail effects
//!   (422)          (409)            (500 / 504)      (logged only)      (background)
//! ```
//!
//! Anything after the store write is best-effort. A failed notification row
//! or email is logged and counted, never reported to the caller, because the
//! booking change has already happened.
//!
//! Cancellation is the exception to "emails run in the background": the
//! cancellation email is attempted inline *before* the row is deleted, while
//! its recipient is still known. Its failure, or running past the mail timeout,
//! does not stop the delete.

pub mod effects;
pub mod environment;

#[cfg(test)]
mod tests;

pub use environment::BookingEnvironment;

use booth_core::mail::BookingTemplate;
use booth_core::validation::{validate_draft, validate_patch};
use booth_core::{
    Booking, BookingDraft, BookingId, BookingPatch, CustomerType, Effect, ExhibitionCalendar,
    LifecycleError, NaiveDate, NewNotification, Notification, NotificationId, ProductInterest,
    Slot, SlotAvailability, SlotTime, StatusFlag, StoreError, ValidationError,
};
use booth_runtime::EffectRunner;
use booth_runtime::metrics::{BookingMetrics, StoreMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

/// Result alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Default bound on the booking insert.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(8);

/// Default bound on the inline cancellation email.
pub const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Who is asking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    /// Anonymous visitor on the public form.
    Visitor,
    /// Visitor proving ownership with the booking's email.
    Owner {
        /// Email presented by the caller.
        email: String,
    },
    /// Authenticated admin.
    Admin,
}

impl Actor {
    /// Owner actor for `email`.
    #[must_use]
    pub fn owner(email: impl Into<String>) -> Self {
        Self::Owner {
            email: email.into(),
        }
    }

    const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Admin list filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BookingFilter {
    /// Case-insensitive substring of company, name or email.
    #[serde(default)]
    pub search: Option<String>,
    /// Only this product interest.
    #[serde(default)]
    pub product_interest: Option<ProductInterest>,
    /// Only this (effective) customer type.
    #[serde(default)]
    pub customer_type: Option<CustomerType>,
}

impl BookingFilter {
    /// `true` when `booking` passes every supplied criterion.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_none_or(|needle| {
                let needle = needle.to_lowercase();
                [&booking.company_name, &booking.name, &booking.email]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            });
        let product_ok = self
            .product_interest
            .is_none_or(|p| p == booking.product_interest);
        let customer_ok = self
            .customer_type
            .is_none_or(|c| booking.effective_customer_type() == Some(c));
        search_ok && product_ok && customer_ok
    }
}

/// Per-id result of a bulk cancel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkCancelOutcome {
    /// Booking id.
    pub id: BookingId,
    /// Whether the row was deleted.
    pub cancelled: bool,
    /// Why not, when it was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrates create, update and cancel.
///
/// Cheap to clone: adapters are behind `Arc`s and the runner is shared.
#[derive(Clone)]
pub struct BookingLifecycle {
    env: BookingEnvironment,
    runner: EffectRunner,
    calendar: ExhibitionCalendar,
    template: BookingTemplate,
    write_timeout: Duration,
    mail_timeout: Duration,
}

impl BookingLifecycle {
    /// Lifecycle over the default exhibition calendar.
    #[must_use]
    pub fn new(env: BookingEnvironment, runner: EffectRunner, template: BookingTemplate) -> Self {
        Self {
            env,
            runner,
            calendar: ExhibitionCalendar::default(),
            template,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            mail_timeout: DEFAULT_MAIL_TIMEOUT,
        }
    }

    /// Replace the calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: ExhibitionCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Replace the bound on the booking insert.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Replace the bound on the cancellation email sent before a delete.
    #[must_use]
    pub const fn with_mail_timeout(mut self, timeout: Duration) -> Self {
        self.mail_timeout = timeout;
        self
    }

    /// The exhibition calendar bookings are validated against.
    #[must_use]
    pub const fn calendar(&self) -> &ExhibitionCalendar {
        &self.calendar
    }

    /// The runner background effects are dispatched on.
    #[must_use]
    pub const fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    /// Creates a booking.
    ///
    /// Only admins may assign a host; for anyone else `meeting_with` is dropped.
    ///
    /// # Errors
    ///
    /// - `Validation`: bad input, nothing written
    /// - `SlotTaken`: the slot is occupied, nothing written
    /// - `StoreTimeout`: the insert did not finish in time, outcome unknown
    /// - `Store`: the insert failed
    #[tracing::instrument(skip_all, fields(date = %draft.date, time = %draft.time))]
    pub async fn create(&self, mut draft: BookingDraft, actor: &Actor) -> Result<Booking> {
        if !actor.is_admin() {
            draft.meeting_with = None;
        }
        let (draft, slot) = validate_draft(draft, &self.calendar)?;
        self.ensure_free(slot, None).await?;

        let inserted = timed(
            "insert_booking",
            tokio::time::timeout(
                self.write_timeout,
                self.env.bookings.insert_booking(draft, StatusFlag::New),
            ),
        )
        .await;

        let booking = match inserted {
            Err(_elapsed) => {
                tracing::error!(timeout = ?self.write_timeout, "Booking insert timed out");
                return Err(LifecycleError::StoreTimeout(self.write_timeout));
            },
            Ok(Err(StoreError::UniqueViolation(_))) => return Err(slot_taken(slot)),
            Ok(result) => result?,
        };

        BookingMetrics::record_created();
        tracing::info!(booking_id = %booking.id, "Booking created");

        self.record_notification(NewNotification::created(&booking))
            .await;
        self.runner.dispatch(Effect::merge([
            effects::confirmation(&self.env.mail, &self.template, &booking),
            effects::admin_copies(&self.env.mail, &self.template, &booking),
        ]));

        Ok(booking)
    }

    /// Applies a partial update.
    ///
    /// Owners may change content fields only. When a content field changes the
    /// status flag becomes `updated` (unless the patch sets it) and the visitor
    /// is emailed; host or status changes alone stay internal.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking, or the actor does not own it
    /// - `Validation`: bad or empty patch, or the new slot is not bookable
    /// - `SlotTaken`: the new slot is occupied by another booking
    /// - `Store`: the write failed
    #[tracing::instrument(skip_all, fields(booking_id = %id))]
    pub async fn update(&self, id: BookingId, patch: BookingPatch, actor: &Actor) -> Result<Booking> {
        let current = self.load_for(id, actor).await?;
        let patch = if actor.is_admin() {
            patch
        } else {
            patch.owner_scope()
        };
        let mut patch = validate_patch(patch)?;
        let next = patch.apply(&current);

        if patch.moves_slot(&current) {
            let slot = self.calendar.validate(next.date, next.time)?;
            self.ensure_free(slot, Some(id)).await?;
        }

        let content_changed = !current.same_content(&next);
        if content_changed && patch.status_flag.is_none() {
            patch.status_flag = Some(Some(StatusFlag::Updated));
        }

        let updated = match timed("update_booking", self.env.bookings.update_booking(id, patch)).await
        {
            Err(StoreError::UniqueViolation(_)) => return Err(slot_taken(next.slot())),
            result => result?,
        };

        BookingMetrics::record_updated();
        tracing::info!(content_changed, "Booking updated");

        self.record_notification(NewNotification::updated(&updated))
            .await;
        if content_changed {
            self.runner.dispatch(effects::change_notice(
                &self.env.mail,
                &self.template,
                &updated,
            ));
        } else {
            tracing::debug!("Only internal fields changed, visitor not emailed");
        }

        Ok(updated)
    }

    /// Deletes a booking, freeing its slot, and returns what was deleted.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking, or the actor does not own it
    /// - `Store`: the delete failed (the cancellation email may already be out)
    #[tracing::instrument(skip_all, fields(booking_id = %id))]
    pub async fn cancel(&self, id: BookingId, actor: &Actor) -> Result<Booking> {
        let booking = self.load_for(id, actor).await?;

        let notice = self
            .runner
            .run(effects::cancellation_notice(&self.env.mail, &booking));
        let emailed = match tokio::time::timeout(self.mail_timeout, notice).await {
            Ok(sent) => sent,
            Err(_elapsed) => {
                tracing::warn!(timeout = ?self.mail_timeout, "Cancellation email timed out");
                false
            },
        };
        if !emailed {
            tracing::warn!("Cancellation email failed, deleting anyway");
        }

        timed("delete_booking", self.env.bookings.delete_booking(id)).await?;

        BookingMetrics::record_cancelled();
        tracing::info!("Booking cancelled");

        self.record_notification(NewNotification::cancelled(&booking))
            .await;
        Ok(booking)
    }

    /// Cancels each id independently, as an admin.
    pub async fn bulk_cancel(&self, ids: Vec<BookingId>) -> Vec<BulkCancelOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match self.cancel(id, &Actor::Admin).await {
                Ok(_) => BulkCancelOutcome {
                    id,
                    cancelled: true,
                    error: None,
                },
                Err(error) => BulkCancelOutcome {
                    id,
                    cancelled: false,
                    error: Some(error.to_string()),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Marks a booking as seen by an admin. No email, no inbox entry.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking
    /// - `Store`: the write failed
    pub async fn mark_read(&self, id: BookingId) -> Result<Booking> {
        let patch = BookingPatch {
            status_flag: Some(Some(StatusFlag::Read)),
            ..BookingPatch::default()
        };
        Ok(timed("update_booking", self.env.bookings.update_booking(id, patch)).await?)
    }

    /// Each slot of `date` with its availability.
    ///
    /// `exclude` lets a booking being edited ignore its own slot.
    ///
    /// # Errors
    ///
    /// - `Validation`: `date` is not an exhibition day
    /// - `Store`: the read failed
    pub async fn availability(
        &self,
        date: NaiveDate,
        exclude: Option<BookingId>,
    ) -> Result<Vec<SlotAvailability>> {
        if self.calendar.window(date).is_none() {
            return Err(ValidationError::DateNotOffered(date).into());
        }
        let occupied: HashSet<SlotTime> = self
            .env
            .bookings
            .bookings_on(date)
            .await?
            .into_iter()
            .filter(|b| Some(b.id) != exclude)
            .map(|b| b.time)
            .collect();
        Ok(self.calendar.availability(date, &occupied))
    }

    /// One booking.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such booking
    /// - `Store`: the read failed
    pub async fn get(&self, id: BookingId) -> Result<Booking> {
        self.env
            .bookings
            .get_booking(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    /// Every booking passing `filter`, by date then time.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the read fails.
    pub async fn list_all(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .env
            .bookings
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect();
        bookings.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        Ok(bookings)
    }

    /// Bookings made with `email`, newest first.
    ///
    /// # Errors
    ///
    /// - `Validation`: blank email
    /// - `Store`: the read failed
    pub async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        Ok(self
            .env
            .bookings
            .bookings_by_email(email.to_string())
            .await?)
    }

    /// Admin inbox, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the read fails.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.env.notifications.list_notifications().await?)
    }

    /// Marks one inbox entry as read.
    ///
    /// # Errors
    ///
    /// - `NotificationNotFound`: no such entry
    /// - `Store`: the write failed
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<()> {
        Ok(self.env.notifications.mark_notification_read(id).await?)
    }

    async fn load_for(&self, id: BookingId, actor: &Actor) -> Result<Booking> {
        let booking = self.get(id).await?;
        let allowed = match actor {
            Actor::Admin => true,
            Actor::Owner { email } => booking.is_owned_by(email),
            Actor::Visitor => false,
        };
        if allowed {
            Ok(booking)
        } else {
            // Same answer as a missing row, so ids cannot be probed
            Err(LifecycleError::NotFound(id))
        }
    }

    /// Advisory occupancy check. Not atomic with the write that follows.
    async fn ensure_free(&self, slot: Slot, exclude: Option<BookingId>) -> Result<()> {
        let taken = self
            .env
            .bookings
            .bookings_at(slot)
            .await?
            .iter()
            .any(|b| Some(b.id) != exclude);
        if taken {
            return Err(slot_taken(slot));
        }
        Ok(())
    }

    async fn record_notification(&self, notification: NewNotification) {
        let action = notification.action_type;
        match self.env.notifications.insert_notification(notification).await {
            Ok(row) => tracing::debug!(notification_id = %row.id, %action, "Notification recorded"),
            Err(error) => tracing::warn!(%action, %error, "Failed to record notification"),
        }
    }
}

fn slot_taken(slot: Slot) -> LifecycleError {
    BookingMetrics::record_slot_conflict();
    tracing::info!(%slot, "Slot already booked");
    LifecycleError::SlotTaken(slot)
}

/// Awaits a store write and records its duration.
async fn timed<F: Future>(operation: &'static str, write: F) -> F::Output {
    let started = Instant::now();
    let output = write.await;
    StoreMetrics::record_write(operation, started.elapsed());
    output
}
