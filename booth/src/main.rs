//! Booth reservation HTTP server.

use anyhow::Context;
use axum::{Router, extract::State, routing::get};
use booth_core::mail::BookingTemplate;
use booth_core::{MailProvider, SystemClock};
use booth_reservations::auth::AdminSessions;
use booth_reservations::config::Config;
use booth_reservations::lifecycle::{BookingEnvironment, BookingLifecycle};
use booth_reservations::mail::StibeeClient;
use booth_reservations::server::{AppState, build_router};
use booth_reservations::store::PostgresBookingStore;
use booth_runtime::EffectRunner;
use booth_runtime::metrics::MetricsServer;
use booth_web::handlers::ReadinessProbe;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,booth_reservations=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booth reservation server");

    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        bind = %config.server.bind_addr(),
        public_base_url = %config.server.public_base_url,
        "Configuration loaded"
    );

    // Database
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let store = Arc::new(PostgresBookingStore::new(pool));
    store.migrate().await.context("Failed to run migrations")?;
    info!("Database ready");

    // Metrics
    let mut metrics = MetricsServer::new(config.server.metrics_addr()?);
    metrics.start()?;
    spawn_metrics_endpoint(Arc::new(metrics)).await?;

    // Lifecycle
    let mail: Arc<dyn MailProvider> = Arc::new(
        StibeeClient::new(config.mail.clone()).context("Failed to build mail client")?,
    );
    if let Err(error) = mail.ensure_configured(&[], &[]) {
        warn!(%error, "Mail provider is not configured; emails will not be sent");
    }
    let template = BookingTemplate::new(config.server.public_base_url.clone());
    let runner = EffectRunner::new();
    let lifecycle = BookingLifecycle::new(
        BookingEnvironment::shared(Arc::clone(&store), Arc::clone(&mail)),
        runner.clone(),
        template.clone(),
    )
    .with_write_timeout(config.database.write_timeout())
    .with_mail_timeout(config.mail.timeout());

    let sessions = AdminSessions::new(
        config.admin.password.clone(),
        config.admin.session_ttl(),
        Arc::new(SystemClock),
    );
    if config.admin.password.is_none() {
        warn!("ADMIN_PASSWORD is not set; admin login is disabled");
    }

    let readiness: Arc<dyn ReadinessProbe> = store;
    let state = AppState::new(lifecycle, sessions, mail, template, readiness);
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(pending = runner.pending(), "Waiting for background emails");
    if let Err(error) = runner.shutdown(config.server.shutdown_timeout()).await {
        warn!(%error, "Shutdown timed out with emails still in flight");
    }

    info!("Server stopped");
    Ok(())
}

/// Serve `/metrics` on the metrics address.
async fn spawn_metrics_endpoint(metrics: Arc<MetricsServer>) -> anyhow::Result<()> {
    let addr = metrics.addr();
    let app = Router::new()
        .route(
            "/metrics",
            get(|State(metrics): State<Arc<MetricsServer>>| async move {
                metrics.render().unwrap_or_default()
            }),
        )
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics address {addr}"))?;
    info!("Metrics available at http://{addr}/metrics");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics server stopped");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
