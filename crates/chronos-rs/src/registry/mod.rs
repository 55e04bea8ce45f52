//! The keyed collection of upstreams: construction from config, lookup,
//! registration, and lifecycle (§4.4).

pub mod quota_scheduler;

use crate::matcher::{self, MatchMode};
use crate::models::error::GatewayError;
use crate::models::identifier::{Identifier, Method};
use crate::models::settings::{Settings, SourceEntry};
use crate::upstream::Upstream;
use ahash::AHashMap;
use log::{error, info, warn};
use reqwest::Client;
use std::sync::Arc;
use std::sync::RwLock;
use tokio::sync::watch;

/// A keyed collection of upstream workers, shared across the application as
/// `actix_web::web::Data<Registry>`. The map itself never holds an `.await`
/// point while locked, so a plain `RwLock` (not `tokio::sync::RwLock`)
/// suffices — per §9, "a simple map behind a reader-writer lock".
pub struct Registry {
    upstreams: RwLock<AHashMap<String, Arc<Upstream>>>,
    client: Client,
    shutdown_tx: watch::Sender<bool>,
}

impl Registry {
    /// Builds a registry from a parsed config file. Each entry is validated
    /// and conflict-checked against everything accepted so far; failures are
    /// logged and skipped, never fatal (§4.4, §7 item 1).
    pub fn from_config(settings: &Settings, client: Client) -> Self {
        let mut upstreams = AHashMap::new();
        let mut accepted: Vec<Identifier> = Vec::new();

        for entry in &settings.sources {
            match validate_entry(entry, &accepted) {
                Ok(identifier) => {
                    let key = identifier.canonical_key();
                    info!("registering upstream {key}");
                    let upstream = Arc::new(Upstream::new(identifier.clone(), entry.rate_limit.clone()));
                    accepted.push(identifier);
                    upstreams.insert(key, upstream);
                }
                Err(e) => error!("skipping config entry: {e}"),
            }
        }

        let (shutdown_tx, _) = watch::channel(false);
        Registry {
            upstreams: RwLock::new(upstreams),
            client,
            shutdown_tx,
        }
    }

    /// O(1) hash lookup by canonical key, after resolving which identifier
    /// the (url, method, extra) triple routes to (§4.1, §4.6 step 4-5).
    pub fn lookup(&self, url: &str, method: Method, extra: &str) -> Option<Arc<Upstream>> {
        let upstreams = self.upstreams.read().expect("registry lock poisoned");
        let identifiers: Vec<Identifier> = upstreams.values().map(|u| u.identifier.clone()).collect();
        let hit = matcher::find(identifiers.iter(), url, method, extra, MatchMode::First)
            .into_iter()
            .next()?
            .clone();
        upstreams.get(&hit.canonical_key()).cloned()
    }

    /// Registers a new upstream at runtime (the admin `add_api` operation).
    /// Fails if the candidate conflicts with an already-registered identifier
    /// or duplicates one verbatim (§4.4, §7 item 2).
    pub fn register(&self, entry: SourceEntry) -> Result<(), GatewayError> {
        entry
            .identifier
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let key = entry.identifier.canonical_key();
        {
            let upstreams = self.upstreams.read().expect("registry lock poisoned");
            if upstreams.contains_key(&key) {
                return Err(GatewayError::AlreadyRegistered);
            }
            let identifiers: Vec<Identifier> = upstreams.values().map(|u| u.identifier.clone()).collect();
            let conflicts = matcher::conflicts_with(identifiers.iter(), &entry.identifier);
            if !conflicts.is_empty() {
                let names = conflicts
                    .iter()
                    .map(|c| c.canonical_key())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(GatewayError::Conflict(format!(
                    "identifiers with overlapping areas of influence were found: {names}"
                )));
            }
        }

        let upstream = Arc::new(Upstream::new(entry.identifier.clone(), entry.rate_limit));
        {
            let mut upstreams = self.upstreams.write().expect("registry lock poisoned");
            upstreams.insert(key, upstream.clone());
        }
        tokio::spawn(upstream.run(self.client.clone(), self.shutdown_tx.subscribe()));
        Ok(())
    }

    /// All registered identifiers' canonical keys (`GET /admin/get_apis`).
    pub fn all_keys(&self) -> Vec<String> {
        let upstreams = self.upstreams.read().expect("registry lock poisoned");
        upstreams.keys().cloned().collect()
    }

    /// Spawns the quota reset scheduler and one worker task per upstream
    /// already registered at construction time (§4.4 `start()`).
    pub fn start(self: &Arc<Self>) {
        let upstreams: Vec<Arc<Upstream>> = {
            let map = self.upstreams.read().expect("registry lock poisoned");
            map.values().cloned().collect()
        };
        for upstream in upstreams {
            tokio::spawn(upstream.run(self.client.clone(), self.shutdown_tx.subscribe()));
        }

        let registry = Arc::clone(self);
        let shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(quota_scheduler::run(registry, shutdown_rx));
    }

    /// Signals shutdown to every worker and the reset scheduler (§4.4 `stop()`).
    pub fn stop(&self) {
        warn!("registry shutting down, signalling all upstream workers");
        let _ = self.shutdown_tx.send(true);
    }

    /// A point-in-time snapshot of every registered upstream, used by the
    /// quota reset scheduler so upstreams added after startup are included.
    pub fn snapshot(&self) -> Vec<Arc<Upstream>> {
        let map = self.upstreams.read().expect("registry lock poisoned");
        map.values().cloned().collect()
    }
}

/// Validates one config entry's identifier and checks it doesn't conflict
/// with anything already accepted in this pass.
fn validate_entry(entry: &SourceEntry, accepted: &[Identifier]) -> Result<Identifier, GatewayError> {
    entry
        .identifier
        .validate()
        .map_err(|e| GatewayError::Config(e.to_string()))?;

    let conflicts = matcher::conflicts_with(accepted.iter(), &entry.identifier);
    if !conflicts.is_empty() {
        return Err(GatewayError::Conflict(format!(
            "{} overlaps with an already-registered identifier",
            entry.identifier.canonical_key()
        )));
    }

    Ok(entry.identifier.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rate_limit::RateLimitConfig;

    fn entry(url: &str, method: Method) -> SourceEntry {
        SourceEntry {
            identifier: Identifier {
                url: url.to_string(),
                method,
                extra: String::new(),
            },
            rate_limit: RateLimitConfig::default(),
        }
    }

    #[test]
    fn from_config_skips_conflicting_entries() {
        let settings = Settings {
            sources: vec![
                entry("http://h/a", Method::Any),
                entry("http://h/a", Method::Get),
            ],
        };
        let registry = Registry::from_config(&settings, Client::new());
        assert_eq!(registry.all_keys().len(), 1);
    }

    #[test]
    fn from_config_skips_invalid_urls() {
        let settings = Settings {
            sources: vec![entry("not-a-url", Method::Get)],
        };
        let registry = Registry::from_config(&settings, Client::new());
        assert_eq!(registry.all_keys().len(), 0);
    }

    #[test]
    fn register_rejects_duplicate() {
        let settings = Settings { sources: vec![entry("http://h/a", Method::Get)] };
        let registry = Registry::from_config(&settings, Client::new());
        let result = registry.register(entry("http://h/a", Method::Get));
        assert!(result.is_err());
    }

    #[test]
    fn register_rejects_conflict() {
        let settings = Settings { sources: vec![entry("http://h/a", Method::Any)] };
        let registry = Registry::from_config(&settings, Client::new());
        let result = registry.register(entry("http://h/a", Method::Get));
        assert!(matches!(result, Err(GatewayError::Conflict(_))));
    }

    #[test]
    fn lookup_finds_registered_upstream() {
        let settings = Settings { sources: vec![entry("http://h/a", Method::Get)] };
        let registry = Registry::from_config(&settings, Client::new());
        let hit = registry.lookup("http://h/a/b", Method::Get, "");
        assert!(hit.is_some());
    }
}
