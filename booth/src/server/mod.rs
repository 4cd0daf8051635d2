//! HTTP server for booth reservations.
//!
//! - Application state shared by handlers
//! - Router with health, public, admin and mail-proxy routes

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
