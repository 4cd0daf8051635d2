//! Mail provider adapters.
//!
//! [`StibeeClient`] talks to the Stibee HTTP API. Tests use
//! `booth_testing::RecordingMailProvider` instead.

pub mod stibee;

pub use stibee::StibeeClient;
