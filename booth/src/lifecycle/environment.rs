//! Dependencies of the booking lifecycle.

use booth_core::{BookingStore, MailProvider, NotificationStore};
use std::sync::Arc;

/// Adapters the lifecycle talks to.
///
/// Production wires the `PostgreSQL` store and the Stibee client; tests wire
/// the in-memory doubles from `booth-testing`.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Bookings table.
    pub bookings: Arc<dyn BookingStore>,
    /// Notifications table.
    pub notifications: Arc<dyn NotificationStore>,
    /// Mail provider.
    pub mail: Arc<dyn MailProvider>,
}

impl BookingEnvironment {
    /// Create an environment from separate adapters.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        notifications: Arc<dyn NotificationStore>,
        mail: Arc<dyn MailProvider>,
    ) -> Self {
        Self {
            bookings,
            notifications,
            mail,
        }
    }

    /// Create an environment where one adapter serves both tables.
    #[must_use]
    pub fn shared<S>(store: Arc<S>, mail: Arc<dyn MailProvider>) -> Self
    where
        S: BookingStore + NotificationStore + 'static,
    {
        Self {
            bookings: Arc::clone(&store) as Arc<dyn BookingStore>,
            notifications: store,
            mail,
        }
    }
}
