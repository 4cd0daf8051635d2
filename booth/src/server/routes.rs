//! Router configuration.

use crate::api;
use crate::server::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};
use booth_web::handlers::{health_check, readiness_check};
use booth_web::{correlation_id_layer, permissive_cors};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`, `GET /ready`
/// - `/api/calendar`, `/api/availability/:date`
/// - `/api/bookings[/:id]`: public booking and owner self-service
/// - `/api/admin/...`: bearer-token guarded dashboard
/// - `/api/send-confirmation` and the other mail proxies
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/calendar", get(api::calendar::calendar))
        .route("/availability/:date", get(api::calendar::availability))
        .route(
            "/bookings",
            post(api::bookings::create_booking).get(api::bookings::find_bookings),
        )
        .route(
            "/bookings/:id",
            get(api::bookings::get_booking)
                .patch(api::bookings::update_booking)
                .delete(api::bookings::cancel_booking),
        );

    let admin_routes = Router::new()
        .route("/login", post(api::admin::login))
        .route("/logout", post(api::admin::logout))
        .route(
            "/bookings",
            get(api::admin::list_bookings).post(api::admin::create_booking),
        )
        .route("/bookings/bulk-delete", post(api::admin::bulk_cancel))
        .route("/bookings/export", get(api::admin::export_bookings))
        .route(
            "/bookings/:id",
            patch(api::admin::update_booking).delete(api::admin::cancel_booking),
        )
        .route("/bookings/:id/read", post(api::admin::mark_read))
        .route("/notifications", get(api::admin::list_notifications))
        .route(
            "/notifications/:id/read",
            post(api::admin::mark_notification_read),
        );

    let api_routes = public_routes
        .nest("/admin", admin_routes)
        .merge(api::mail_proxy::routes());

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(permissive_cors())
        .layer(correlation_id_layer())
        .with_state(state)
}
