//! Store adapters.
//!
//! The lifecycle only sees the [`BookingStore`](booth_core::BookingStore) and
//! [`NotificationStore`](booth_core::NotificationStore) traits. Production
//! wires [`PostgresBookingStore`]; tests use `booth_testing::InMemoryBookingStore`.

pub mod postgres;

pub use postgres::PostgresBookingStore;
