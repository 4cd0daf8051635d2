//! Exhibition booth meeting reservations.
//!
//! Visitors book a 30-minute meeting slot at the booth during the show;
//! admins manage bookings from a password-protected dashboard. Each booking
//! change is persisted first, then the visitor and the admins are emailed
//! through a mailing-list provider on a best-effort basis.
//!
//! # Architecture
//!
//! ```text
//!  HTTP (axum) ──► BookingLifecycle ──► BookingStore (PostgreSQL)
//!       │                 │
//!       │                 └──► EffectRunner ──► MailProvider (Stibee)
//!       │
//!       └── mail-proxy endpoints ──────────────► MailProvider
//! ```
//!
//! - [`lifecycle`]: create, update and cancel with their side effects
//! - [`store`]: `PostgreSQL` adapter for bookings and the admin inbox
//! - [`mail`]: HTTP client for the mail provider
//! - [`auth`]: admin sessions
//! - [`export`]: CSV download of bookings
//! - [`api`] and [`server`]: the HTTP surface
//! - [`config`]: environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod export;
pub mod lifecycle;
pub mod mail;
pub mod server;
pub mod store;
