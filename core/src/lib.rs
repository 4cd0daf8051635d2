//! # Booth Core
//!
//! Domain types and rules for booking meetings at an exhibition booth.
//!
//! This crate has no I/O. It defines what a booking is, which slots exist,
//! what counts as valid input, how partial updates apply, and the traits the
//! application uses to reach the store and the mail provider.
//!
//! ## Core Concepts
//!
//! - **Slot**: a `(date, time)` pair inside the [`calendar::ExhibitionCalendar`]
//! - **Booking**: one visitor meeting occupying a slot
//! - **Notification**: an admin inbox entry recording a create, update or cancel
//! - **Effect**: a description of best-effort work (emails) to run after a change
//! - **Environment**: injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use booth_core::calendar::ExhibitionCalendar;
//! use chrono::NaiveDate;
//!
//! let calendar = ExhibitionCalendar::default();
//! let day = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
//! let slots = calendar.slots_for(day);
//! assert_eq!(slots.first().map(ToString::to_string).as_deref(), Some("10:00"));
//! assert_eq!(slots.last().map(ToString::to_string).as_deref(), Some("16:30"));
//! ```

pub mod booking;
pub mod calendar;
pub mod effect;
pub mod environment;
pub mod error;
pub mod mail;
pub mod notification;
pub mod patch;
pub mod validation;

// Re-export commonly used types
pub use booking::{
    Booking, BookingDraft, BookingId, CustomerType, InquiryType, MEETING_HOSTS, ProductInterest,
    StatusFlag,
};
pub use calendar::{ExhibitionCalendar, Slot, SlotAvailability, SlotTime};
pub use chrono::{DateTime, NaiveDate, Utc};
pub use effect::{Effect, EffectError};
pub use environment::{BookingStore, Clock, MailProvider, NotificationStore, SystemClock};
pub use error::{LifecycleError, MailError, StoreError, ValidationError};
pub use notification::{ActionType, NewNotification, Notification, NotificationId};
pub use patch::BookingPatch;
