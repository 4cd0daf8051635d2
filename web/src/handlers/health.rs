//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use booth_core::environment::EnvFuture;
use serde::Serialize;
use std::sync::Arc;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// A dependency the service needs before it can take traffic.
pub trait ReadinessProbe: Send + Sync {
    /// Short component name, e.g. `database`.
    fn component(&self) -> &'static str;

    /// Resolves to `Err(reason)` when the dependency is unusable.
    fn probe(&self) -> EnvFuture<'_, Result<(), String>>;
}

/// Readiness report body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Probed component.
    pub component: &'static str,
    /// `ready` or `unavailable`.
    pub status: &'static str,
    /// Failure reason, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Readiness check (for load balancers).
///
/// # Status Codes
///
/// - 200 OK: the probe succeeded
/// - 503 Service Unavailable: the probe failed
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check(
    State(probe): State<Arc<dyn ReadinessProbe>>,
) -> (StatusCode, Json<ReadinessReport>) {
    let component = probe.component();
    match probe.probe().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                component,
                status: "ready",
                message: None,
            }),
        ),
        Err(reason) => {
            tracing::warn!(component, %reason, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    component,
                    status: "unavailable",
                    message: Some(reason),
                }),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe(bool);

    impl ReadinessProbe for Probe {
        fn component(&self) -> &'static str {
            "database"
        }

        fn probe(&self) -> EnvFuture<'_, Result<(), String>> {
            let healthy = self.0;
            Box::pin(async move {
                if healthy {
                    Ok(())
                } else {
                    Err("connection refused".to_string())
                }
            })
        }
    }

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_probe() {
        let (status, Json(report)) = readiness_check(State(Arc::new(Probe(true)) as Arc<dyn ReadinessProbe>)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");

        let (status, Json(report)) = readiness_check(State(Arc::new(Probe(false)) as Arc<dyn ReadinessProbe>)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.message.as_deref(), Some("connection refused"));
    }
}
