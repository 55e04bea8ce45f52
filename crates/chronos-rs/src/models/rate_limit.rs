//! Per-upstream pacing and quota configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_interval() -> f64 {
    0.001
}

fn default_rpd() -> i64 {
    -1
}

/// Pacing and quota parameters for one upstream.
///
/// `interval` is the minimum gap, in seconds, the configuration *asks for*
/// between dispatch starts; the worker actually paces at `1.1 × interval`
/// (see [`RateLimitConfig::effective_interval`]) as a safety margin against
/// clock skew with the upstream's own limiter. `rpd` is requests-per-day;
/// `-1` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_interval")]
    pub interval: f64,
    #[serde(default = "default_rpd", rename = "RPD")]
    pub rpd: i64,
    #[serde(default)]
    pub add_random: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            rpd: default_rpd(),
            add_random: false,
        }
    }
}

impl RateLimitConfig {
    /// `true` when the quota is unbounded (`rpd < 0`).
    pub fn is_unlimited(&self) -> bool {
        self.rpd < 0
    }

    /// The 10%-margin pacing interval actually enforced by the worker,
    /// before any `add_random` jitter is added.
    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs_f64((self.interval * 1.1).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg: RateLimitConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.interval, 0.001);
        assert_eq!(cfg.rpd, -1);
        assert!(!cfg.add_random);
        assert!(cfg.is_unlimited());
    }

    #[test]
    fn rpd_key_is_uppercase_in_json() {
        let cfg: RateLimitConfig = serde_json::from_str(r#"{"RPD": 5}"#).unwrap();
        assert_eq!(cfg.rpd, 5);
        assert!(!cfg.is_unlimited());
    }

    #[test]
    fn effective_interval_applies_ten_percent_margin() {
        let cfg = RateLimitConfig {
            interval: 1.0,
            rpd: -1,
            add_random: false,
        };
        let got = cfg.effective_interval();
        assert!((got.as_secs_f64() - 1.1).abs() < 1e-9);
    }
}
