//! The single HTTP entry point for proxied calls (§4.6).
//!
//! Any method, any path: the entire path after the leading `/` is treated
//! as the absolute upstream URL. Two control headers steer dispatch and are
//! stripped before forwarding: `x-identifier-extra` and `x-priority`.

use crate::config::settings::ErrorStatusPolicy;
use crate::models::error::GatewayError;
use crate::models::identifier::Method;
use crate::models::request::{DispatchOutcome, ProxyRequest};
use crate::registry::Registry;
use crate::routes::metrics::MetricsCollector;
use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;
use std::collections::HashMap;
use std::str::FromStr;

const EXTRA_HEADER: &str = "x-identifier-extra";
const PRIORITY_HEADER: &str = "x-priority";

/// Registers the catch-all proxy route. Mirrors the host project's 1MB
/// payload limit on both raw and JSON bodies.
pub fn configure_intake(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(1024 * 1024))
        .app_data(web::JsonConfig::default().limit(1024 * 1024))
        .service(web::resource("/{tail:.*}").to(intake));
}

async fn intake(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
    registry: web::Data<Registry>,
    error_policy: web::Data<ErrorStatusPolicy>,
    metrics: web::Data<MetricsCollector>,
) -> Result<HttpResponse, GatewayError> {
    metrics.record_start();
    let url = path.into_inner();

    let method = match Method::from_str(req.method().as_str()) {
        Ok(m) if Method::STANDARD.contains(&m) => m,
        _ => {
            // `ANY` is an identifier-only sentinel (§4.1); a request can
            // never actually use it, so it is rejected the same as any
            // other non-standard method (§9 redesign).
            metrics.record_end(false);
            return Err(GatewayError::UnsupportedMethod(req.method().to_string()));
        }
    };

    let mut headers = HashMap::new();
    let mut extra = String::new();
    let mut priority = 0i64;

    for (name, value) in req.headers() {
        let name = name.as_str().to_ascii_lowercase();
        let value = value.to_str().unwrap_or_default().to_string();
        match name.as_str() {
            EXTRA_HEADER => extra = value,
            PRIORITY_HEADER => {
                priority = value.parse().unwrap_or_else(|_| {
                    warn!("unparsable x-priority header {value:?}, treating as 0");
                    0
                });
            }
            _ => {
                headers.insert(name, value);
            }
        }
    }

    let query: HashMap<String, String> = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default();

    let json_body: serde_json::Value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };

    let upstream = match registry.lookup(&url, method, &extra) {
        Some(u) => u,
        None => {
            metrics.record_end(false);
            return Err(GatewayError::NoMatch);
        }
    };

    if !upstream.try_reserve_quota() {
        metrics.record_end(false);
        return Err(GatewayError::QuotaExceeded);
    }

    let request = ProxyRequest {
        url: upstream.identifier.url.clone(),
        method,
        headers,
        query,
        body: json_body,
    };

    let receiver = upstream.enqueue(-priority, request).await;
    let outcome = receiver.await.unwrap_or(DispatchOutcome::ShutdownAbandoned);
    metrics.record_end(matches!(outcome, DispatchOutcome::Response { status, .. } if (200..300).contains(&status)));

    Ok(render(outcome, &error_policy))
}

fn render(outcome: DispatchOutcome, policy: &ErrorStatusPolicy) -> HttpResponse {
    match outcome {
        DispatchOutcome::Response { status, headers, body } => {
            let mut builder = HttpResponse::build(
                actix_web::http::StatusCode::from_u16(status)
                    .unwrap_or(actix_web::http::StatusCode::OK),
            );
            for (name, value) in &headers {
                builder.insert_header((name.as_str(), value.as_str()));
            }
            builder.json(body)
        }
        DispatchOutcome::TransportError { kind, message } => {
            let status = policy.transport_error_status();
            HttpResponse::build(status).json(DispatchOutcome::error_body(&kind, &message))
        }
        DispatchOutcome::ShutdownAbandoned => HttpResponse::ServiceUnavailable()
            .json(DispatchOutcome::error_body("shutdown", "gateway is shutting down")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_200_policy_overrides_default_502() {
        let legacy = ErrorStatusPolicy { legacy_200: true };
        assert_eq!(legacy.transport_error_status(), actix_web::http::StatusCode::OK);
        let modern = ErrorStatusPolicy { legacy_200: false };
        assert_eq!(modern.transport_error_status(), actix_web::http::StatusCode::BAD_GATEWAY);
    }
}
