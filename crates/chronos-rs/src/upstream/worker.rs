//! The per-upstream priority queue, pacing timer and dispatch loop (§4.3).

use crate::models::identifier::Identifier;
use crate::models::rate_limit::RateLimitConfig;
use crate::models::request::{DispatchOutcome, ProxyRequest};
use crate::upstream::queue::WorkItem;
use log::{debug, warn};
use rand::Rng;
use reqwest::Client;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex, Notify};
use tokio::time::{sleep, Duration};

/// One configured upstream: its identity, rate-limit policy, pending work,
/// and the daily counter the quota check reads and increments.
pub struct Upstream {
    pub identifier: Identifier,
    pub rate_limit: RateLimitConfig,
    queue: Mutex<BinaryHeap<WorkItem>>,
    notify: Notify,
    sequence: AtomicU64,
    counter: AtomicI64,
}

impl Upstream {
    pub fn new(identifier: Identifier, rate_limit: RateLimitConfig) -> Self {
        Upstream {
            identifier,
            rate_limit,
            queue: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            sequence: AtomicU64::new(0),
            counter: AtomicI64::new(0),
        }
    }

    /// Compare-and-update quota check (§4.6 step 5, §9 `counter ≥ rpd`).
    /// Unlimited upstreams (`rpd < 0`) always reserve successfully.
    /// Returns `true` if the call is admitted and the counter was incremented.
    pub fn try_reserve_quota(&self) -> bool {
        if self.rate_limit.is_unlimited() {
            return true;
        }
        let rpd = self.rate_limit.rpd;
        loop {
            let current = self.counter.load(Ordering::SeqCst);
            if current >= rpd {
                return false;
            }
            if self
                .counter
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub fn reset_counter(&self) {
        self.counter.store(0, Ordering::SeqCst);
    }

    /// Wraps `request` in a work item with a fresh monotonic sequence number
    /// and pushes it onto the queue. Never blocks on the queue lock for long:
    /// the critical section is just a heap push.
    pub async fn enqueue(
        &self,
        priority: i64,
        request: ProxyRequest,
    ) -> oneshot::Receiver<DispatchOutcome> {
        let (tx, rx) = oneshot::channel();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let item = WorkItem {
            priority,
            sequence,
            request,
            respond_to: tx,
        };
        {
            let mut queue = self.queue.lock().await;
            queue.push(item);
        }
        self.notify.notify_one();
        rx
    }

    fn pacing_delay(&self) -> Duration {
        let base = self.rate_limit.effective_interval();
        if self.rate_limit.add_random {
            let jitter = rand::thread_rng().gen_range(0.0..1.0);
            base + Duration::from_secs_f64(jitter)
        } else {
            base
        }
    }

    async fn pop(&self) -> Option<WorkItem> {
        let mut queue = self.queue.lock().await;
        queue.pop()
    }

    /// Runs until `shutdown` reports true. Each iteration pops the lowest
    /// `(priority, sequence)` item, spawns its dispatch concurrently, and
    /// paces the *start* of the next iteration — not the dispatch's
    /// completion. See §4.3 and §9 on why the pacing sleep follows the spawn.
    pub async fn run(self: Arc<Self>, client: Client, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let item = match self.pop().await {
                Some(item) => item,
                None => {
                    tokio::select! {
                        _ = self.notify.notified() => { continue; }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                            continue;
                        }
                    }
                }
            };

            debug!(
                "dispatching priority={} sequence={} to {}",
                item.priority, item.sequence, self.identifier.url
            );
            let dispatch_client = client.clone();
            tokio::spawn(async move {
                let outcome = crate::services::dispatch::send(&dispatch_client, &item.request).await;
                let _ = item.respond_to.send(outcome);
            });

            tokio::select! {
                _ = sleep(self.pacing_delay()) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.drain_on_shutdown().await;
    }

    /// Fails every item still queued when the worker stops, so no caller
    /// waiting on a completion is left hanging (§4.3 shutdown, §7 item 8).
    async fn drain_on_shutdown(&self) {
        let mut queue = self.queue.lock().await;
        while let Some(item) = queue.pop() {
            warn!(
                "abandoning queued item priority={} sequence={} for {} on shutdown",
                item.priority, item.sequence, self.identifier.url
            );
            let _ = item.respond_to.send(DispatchOutcome::ShutdownAbandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identifier::Method;

    fn identifier() -> Identifier {
        Identifier {
            url: "http://h/a".to_string(),
            method: Method::Get,
            extra: String::new(),
        }
    }

    #[test]
    fn unlimited_quota_always_reserves() {
        let upstream = Upstream::new(identifier(), RateLimitConfig { rpd: -1, ..Default::default() });
        for _ in 0..1000 {
            assert!(upstream.try_reserve_quota());
        }
    }

    #[test]
    fn quota_rejects_at_boundary_not_past_it() {
        let upstream = Upstream::new(identifier(), RateLimitConfig { rpd: 2, ..Default::default() });
        assert!(upstream.try_reserve_quota());
        assert!(upstream.try_reserve_quota());
        assert!(!upstream.try_reserve_quota());
    }

    #[test]
    fn reset_counter_allows_further_reservations() {
        let upstream = Upstream::new(identifier(), RateLimitConfig { rpd: 1, ..Default::default() });
        assert!(upstream.try_reserve_quota());
        assert!(!upstream.try_reserve_quota());
        upstream.reset_counter();
        assert!(upstream.try_reserve_quota());
    }

    #[tokio::test]
    async fn enqueue_returns_receiver_before_dispatch() {
        let upstream = Upstream::new(identifier(), RateLimitConfig::default());
        let rx = upstream.enqueue(0, ProxyRequest::default()).await;
        drop(rx);
    }
}
