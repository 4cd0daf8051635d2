//! Prometheus metrics for booking operations and background effects.
//!
//! # Example
//!
//! ```rust,no_run
//! use booth_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Expose `server.render()` at /metrics on the address above
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint should bind to.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint binds to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Install the global recorder and register metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// A recorder that is already installed (e.g. by another test) is tolerated
    /// with a warning; [`render`](Self::render) then returns `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 8.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("booth.bookings.created", "Bookings created");
    describe_counter!("booth.bookings.updated", "Bookings updated");
    describe_counter!("booth.bookings.cancelled", "Bookings cancelled");
    describe_counter!(
        "booth.bookings.slot_conflicts",
        "Create or update attempts rejected because the slot was taken"
    );
    describe_counter!(
        "booth.effects.executed",
        "Background effects executed, by label"
    );
    describe_counter!(
        "booth.effects.failed",
        "Background effects that failed, by label"
    );
    describe_counter!(
        "booth.effects.dropped",
        "Effects dropped because the runner was shutting down"
    );
    describe_histogram!(
        "booth.store.write_duration_seconds",
        "Time taken by store writes"
    );
}

/// Store write metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one write and how long it took.
    pub fn record_write(operation: &'static str, duration: Duration) {
        histogram!("booth.store.write_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }
}

/// Booking outcome recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// A booking was created.
    pub fn record_created() {
        counter!("booth.bookings.created").increment(1);
    }

    /// A booking was updated.
    pub fn record_updated() {
        counter!("booth.bookings.updated").increment(1);
    }

    /// A booking was cancelled.
    pub fn record_cancelled() {
        counter!("booth.bookings.cancelled").increment(1);
    }

    /// A write was refused because the slot was occupied.
    pub fn record_slot_conflict() {
        counter!("booth.bookings.slot_conflicts").increment(1);
    }
}
