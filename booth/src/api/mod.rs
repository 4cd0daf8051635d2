//! HTTP API handlers.
//!
//! - [`calendar`]: exhibition days and slot availability
//! - [`bookings`]: public booking form and owner self-service
//! - [`admin`]: login and the bearer-guarded dashboard
//! - [`mail_proxy`]: thin browser-facing proxies to the mail provider

pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod mail_proxy;
