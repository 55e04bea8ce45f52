//! The on-disk configuration file shape (§6).

use crate::models::identifier::Identifier;
use crate::models::rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};

/// One entry of the config file's `sources` array: an identifier paired
/// with the rate-limit it should be registered under. Also the body shape
/// accepted by `POST /admin/add_api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub identifier: Identifier,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// The full configuration file: a list of upstreams to register at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}
