//! Application state for the HTTP server.

use crate::auth::AdminSessions;
use crate::lifecycle::BookingLifecycle;
use axum::extract::FromRef;
use booth_core::MailProvider;
use booth_core::mail::BookingTemplate;
use booth_web::handlers::ReadinessProbe;
use std::sync::Arc;

/// State shared across all HTTP handlers.
///
/// Cloned per request; every field is an `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Booking create, update and cancel.
    pub lifecycle: BookingLifecycle,

    /// Admin session registry.
    pub sessions: AdminSessions,

    /// Mail provider, used directly by the mail-proxy endpoints.
    pub mail: Arc<dyn MailProvider>,

    /// Link and field builder for templated emails.
    pub template: BookingTemplate,

    /// Dependency checked by `/ready`.
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Assemble the state.
    #[must_use]
    pub fn new(
        lifecycle: BookingLifecycle,
        sessions: AdminSessions,
        mail: Arc<dyn MailProvider>,
        template: BookingTemplate,
        readiness: Arc<dyn ReadinessProbe>,
    ) -> Self {
        Self {
            lifecycle,
            sessions,
            mail,
            template,
            readiness,
        }
    }
}

impl FromRef<AppState> for AdminSessions {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ReadinessProbe> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.readiness)
    }
}
