//! Data models and domain types for the chronos-rs gateway.
//!
//! - [`identifier`] — the (url, method, extra) triple naming an upstream
//! - [`rate_limit`] — per-upstream pacing and quota configuration
//! - [`request`] — the frozen outbound call and its dispatch outcome
//! - [`settings`] — the on-disk configuration file shape
//! - [`error`] — the gateway's error taxonomy, mapped to HTTP responses

pub mod error;
pub mod identifier;
pub mod rate_limit;
pub mod request;
pub mod settings;
