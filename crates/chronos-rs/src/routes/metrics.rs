//! A small process-local metrics surface exposed at `GET /admin/metrics`
//! (§10.4). Scoped down from the host project's full collector: counters
//! only, no histograms or time series, since this gateway routes and paces
//! rather than observes deep performance characteristics.

use actix_web::{web, HttpResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    pub requests_total: Arc<AtomicU64>,
    pub requests_success: Arc<AtomicU64>,
    pub requests_error: Arc<AtomicU64>,
    pub active_in_flight: Arc<AtomicU64>,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_success: Arc::new(AtomicU64::new(0)),
            requests_error: Arc::new(AtomicU64::new(0)),
            active_in_flight: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    pub fn record_start(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.active_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_end(&self, success: bool) {
        self.active_in_flight.fetch_sub(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "requests_total": self.requests_total.load(Ordering::Relaxed),
            "requests_success": self.requests_success.load(Ordering::Relaxed),
            "requests_error": self.requests_error.load(Ordering::Relaxed),
            "active_in_flight": self.active_in_flight.load(Ordering::Relaxed),
            "uptime_seconds": self.start_time.elapsed().as_secs(),
        })
    }
}

async fn metrics(collector: web::Data<MetricsCollector>) -> HttpResponse {
    HttpResponse::Ok().json(collector.snapshot())
}

pub fn configure_metrics(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/metrics", web::get().to(metrics));
}
