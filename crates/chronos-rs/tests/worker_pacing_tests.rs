//! End-to-end pacing and priority-ordering tests against a real mock
//! upstream (§8 "Pacing", "Priority ordering", end-to-end scenario 3).
//!
//! These exercise the worker loop's actual dispatch timing rather than unit
//! testing the priority queue in isolation, so they run against wall-clock
//! time with small intervals instead of `tokio::time::pause` — the worker
//! dispatches over a real TCP connection to `wiremock`, and virtual time
//! does not advance a real socket's I/O.

use chronos_rs::models::identifier::{Identifier, Method};
use chronos_rs::models::rate_limit::RateLimitConfig;
use chronos_rs::models::request::ProxyRequest;
use chronos_rs::upstream::Upstream;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Records the wall-clock instant, and the `x-test-id` header value, of
/// every request it answers — in arrival order.
struct RecordingResponder {
    arrivals: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl Respond for RecordingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request
            .headers
            .get("x-test-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.arrivals.lock().unwrap().push((Instant::now(), id));
        ResponseTemplate::new(200).set_body_json(serde_json::json!({}))
    }
}

fn request_with_id(url: &str, id: &str) -> ProxyRequest {
    let mut headers = HashMap::new();
    headers.insert("x-test-id".to_string(), id.to_string());
    ProxyRequest {
        url: url.to_string(),
        method: Method::Get,
        headers,
        query: HashMap::new(),
        body: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn consecutive_dispatch_starts_are_paced_by_the_effective_interval() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(any())
        .respond_with(RecordingResponder { arrivals: arrivals.clone() })
        .mount(&server)
        .await;

    let identifier = Identifier {
        url: format!("{}/a", server.uri()),
        method: Method::Any,
        extra: String::new(),
    };
    let rate_limit = RateLimitConfig { interval: 0.05, rpd: -1, add_random: false };
    let upstream = Arc::new(Upstream::new(identifier, rate_limit));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(upstream.clone().run(Client::new(), shutdown_rx));

    let mut receivers = Vec::new();
    for i in 0..4 {
        let request = request_with_id(&upstream.identifier.url, &i.to_string());
        receivers.push(upstream.enqueue(0, request).await);
    }
    for rx in receivers {
        rx.await.unwrap();
    }

    let _ = shutdown_tx.send(true);

    let recorded = arrivals.lock().unwrap();
    assert_eq!(recorded.len(), 4);

    // effective interval = 1.1 * 0.05 = 0.055s; allow generous scheduling slack.
    let min_gap = std::time::Duration::from_secs_f64(0.05);
    for pair in recorded.windows(2) {
        let gap = pair[1].0.duration_since(pair[0].0);
        assert!(
            gap >= min_gap,
            "dispatch starts {:?} and {:?} were only {:?} apart, expected >= {:?}",
            pair[0].1,
            pair[1].1,
            gap,
            min_gap
        );
    }
}

#[tokio::test]
async fn priority_then_sequence_governs_dispatch_order() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(any())
        .respond_with(RecordingResponder { arrivals: arrivals.clone() })
        .mount(&server)
        .await;

    let identifier = Identifier {
        url: format!("{}/a", server.uri()),
        method: Method::Any,
        extra: String::new(),
    };
    let rate_limit = RateLimitConfig { interval: 0.03, rpd: -1, add_random: false };
    let upstream = Arc::new(Upstream::new(identifier, rate_limit));

    // Enqueue into a worker whose loop has not started yet, as the spec's
    // scenario 3 requires: item-1 (priority 0), item-2 (priority -5, so it
    // sorts first), item-3 (priority 0, FIFO after item-1).
    let url = upstream.identifier.url.clone();
    let rx1 = upstream.enqueue(0, request_with_id(&url, "item-1")).await;
    let rx2 = upstream.enqueue(-5, request_with_id(&url, "item-2")).await;
    let rx3 = upstream.enqueue(0, request_with_id(&url, "item-3")).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(upstream.clone().run(Client::new(), shutdown_rx));

    rx1.await.unwrap();
    rx2.await.unwrap();
    rx3.await.unwrap();

    let _ = shutdown_tx.send(true);

    let recorded = arrivals.lock().unwrap();
    let order: Vec<&str> = recorded.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(order, vec!["item-2", "item-1", "item-3"]);
}
