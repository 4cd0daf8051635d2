//! # Booth Testing
//!
//! Testing utilities for booth reservations.
//!
//! This crate provides:
//! - In-memory implementations of the environment traits with failure injection
//! - A shared [`CallLog`] for asserting the order of writes and emails
//! - Fixtures and proptest strategies for bookings and slots
//!
//! ## Example
//!
//! ```
//! use booth_testing::{CallLog, InMemoryBookingStore, RecordingMailProvider, mocks::test_clock};
//!
//! let log = CallLog::new();
//! let store = InMemoryBookingStore::with_log(log.clone());
//! let mail = RecordingMailProvider::with_log(log.clone());
//! let clock = test_clock();
//! # let _ = (store, mail, clock);
//! ```

pub mod call_log;
pub mod mail_mocks;
pub mod store_mocks;

pub use call_log::{Call, CallLog};
pub use mail_mocks::{FiredTrigger, RecordingMailProvider, StoredSubscriber};
pub use store_mocks::InMemoryBookingStore;

/// Mock implementations of Environment traits
pub mod mocks {
    use booth_core::environment::Clock;
    use chrono::{DateTime, TimeZone, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use booth_testing::mocks::FixedClock;
    /// use booth_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Instant used by [`test_clock`]: 2026-01-15 09:00:00 UTC.
    #[must_use]
    pub fn test_clock_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Create a default fixed clock for tests.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_clock_time())
    }
}

/// Booking fixtures.
pub mod fixtures {
    #![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
    #![allow(clippy::missing_panics_doc)]

    use booth_core::{BookingDraft, BookingPatch, InquiryType, ProductInterest};

    /// A valid draft for `date` (`YYYY-MM-DD`) at `time` (`HH:MM`).
    #[must_use]
    pub fn draft(date: &str, time: &str) -> BookingDraft {
        BookingDraft {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            company_name: "Acme Medical".into(),
            country: "Germany".into(),
            product_interest: ProductInterest::Aeds,
            inquiry_type: InquiryType::ProductPurchasing,
            message: None,
            customer_type: None,
            date: date.parse().unwrap(),
            time: time.parse().unwrap(),
            meeting_with: None,
        }
    }

    /// A valid draft owned by `email`.
    #[must_use]
    pub fn draft_for(email: &str, date: &str, time: &str) -> BookingDraft {
        BookingDraft {
            email: email.into(),
            ..draft(date, time)
        }
    }

    /// A patch that only assigns a host.
    #[must_use]
    pub fn assign_host(host: &str) -> BookingPatch {
        BookingPatch {
            meeting_with: Some(Some(host.into())),
            ..BookingPatch::default()
        }
    }

    /// A patch that only moves the booking.
    #[must_use]
    pub fn move_to(date: &str, time: &str) -> BookingPatch {
        BookingPatch {
            date: Some(date.parse().unwrap()),
            time: Some(time.parse().unwrap()),
            ..BookingPatch::default()
        }
    }
}

/// Property-based testing utilities
pub mod properties {
    use booth_core::{ExhibitionCalendar, NaiveDate, SlotTime};
    use proptest::prelude::*;

    /// Any slot the default calendar offers.
    pub fn valid_slot() -> impl Strategy<Value = (NaiveDate, SlotTime)> {
        let pairs: Vec<(NaiveDate, SlotTime)> = {
            let calendar = ExhibitionCalendar::default();
            calendar
                .days()
                .iter()
                .flat_map(|day| {
                    calendar
                        .slots_for(day.date)
                        .into_iter()
                        .map(move |time| (day.date, time))
                })
                .collect()
        };
        proptest::sample::select(pairs)
    }

    /// Any minute-resolution time of day.
    pub fn any_time() -> impl Strategy<Value = SlotTime> {
        (0u32..24, 0u32..60).prop_filter_map("valid time", |(h, m)| SlotTime::from_hm(h, m))
    }

    /// Dates around the exhibition, most of which are not exhibition days.
    pub fn nearby_date() -> impl Strategy<Value = NaiveDate> {
        (1u32..=28).prop_filter_map("valid date", |d| NaiveDate::from_ymd_opt(2026, 2, d))
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Route `tracing` output to the test harness. Safe to call repeatedly.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}
