//! Shared harness for HTTP tests: the real router over in-memory adapters.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use booth_core::environment::EnvFuture;
use booth_core::mail::BookingTemplate;
use booth_core::{BookingDraft, MailProvider};
use booth_reservations::auth::AdminSessions;
use booth_reservations::lifecycle::{BookingEnvironment, BookingLifecycle};
use booth_reservations::server::{AppState, build_router};
use booth_runtime::EffectRunner;
use booth_testing::mocks::test_clock;
use booth_testing::{CallLog, InMemoryBookingStore, RecordingMailProvider};
use booth_web::handlers::ReadinessProbe;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_PASSWORD: &str = "booth-admin";

struct AlwaysReady;

impl ReadinessProbe for AlwaysReady {
    fn component(&self) -> &'static str {
        "memory"
    }

    fn probe(&self) -> EnvFuture<'_, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryBookingStore,
    pub mail: RecordingMailProvider,
    pub log: CallLog,
    pub runner: EffectRunner,
    pub sessions: AdminSessions,
}

pub fn spawn_app() -> TestApp {
    let log = CallLog::new();
    let store = InMemoryBookingStore::with_log(log.clone());
    let mail = RecordingMailProvider::with_log(log.clone());
    let provider: Arc<dyn MailProvider> = Arc::new(mail.clone());
    let template = BookingTemplate::new("https://booth.example.com");
    let runner = EffectRunner::new();

    let lifecycle = BookingLifecycle::new(
        BookingEnvironment::shared(Arc::new(store.clone()), Arc::clone(&provider)),
        runner.clone(),
        template.clone(),
    );
    let sessions = AdminSessions::new(
        Some(ADMIN_PASSWORD.to_string()),
        chrono::Duration::hours(12),
        Arc::new(test_clock()),
    );
    let state = AppState::new(
        lifecycle,
        sessions.clone(),
        provider,
        template,
        Arc::new(AlwaysReady),
    );

    TestApp {
        server: TestServer::new(build_router(state)).unwrap(),
        store,
        mail,
        log,
        runner,
        sessions,
    }
}

impl TestApp {
    /// Waits for background emails to finish.
    pub async fn idle(&self) {
        self.runner.wait_idle(Duration::from_secs(2)).await.unwrap();
    }

    /// A live admin token, issued without going through HTTP.
    pub async fn admin_token(&self) -> String {
        self.sessions.login(ADMIN_PASSWORD).await.unwrap().token
    }
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

pub fn body(draft: &BookingDraft) -> Value {
    serde_json::to_value(draft).unwrap()
}
