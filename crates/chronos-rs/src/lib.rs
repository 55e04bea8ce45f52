//! chronos-rs: a per-upstream pacing and quota reverse-proxy gateway.
//!
//! The crate is organised leaf-first:
//!
//! - [`models`] — the data shapes: identifiers, rate limits, requests, errors
//! - [`matcher`] — the pure URL decomposer and identifier matcher
//! - [`upstream`] — the per-upstream priority queue and pacing worker
//! - [`registry`] — the keyed collection of upstreams plus the quota scheduler
//! - [`services`] — the outbound HTTP dispatch used by upstream workers
//! - [`routes`] — the actix-web HTTP surface (intake, admin, health, metrics)
//! - [`config`] — config file loading and validation
//! - [`logs`] — structured logging setup

pub mod config;
pub mod logs;
pub mod matcher;
pub mod models;
pub mod registry;
pub mod routes;
pub mod services;
pub mod upstream;
