//! The gateway's error taxonomy, mapped to HTTP responses.
//!
//! One enum covers every error surfaced to an HTTP caller so handlers can
//! return `Result<HttpResponse, GatewayError>` and let
//! `actix_web::error::ResponseError` do the status/body mapping, instead of
//! hand-building a response at every call site.

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// §7.3 — no registered identifier matches the inbound call.
    #[error("no api with such identifier")]
    NoMatch,

    /// §7.4 (redesign) — the inbound method is not one of the nine standard
    /// HTTP methods.
    #[error("unsupported http method: {0}")]
    UnsupportedMethod(String),

    /// §7.5 — the upstream's daily quota has been exhausted.
    #[error("daily quota reached")]
    QuotaExceeded,

    /// §7.2 — a candidate identifier collides with one already registered.
    #[error("identifiers with overlapping areas of influence were found: {0}")]
    Conflict(String),

    /// §7.1 — malformed identifier, rate-limit, or config entry.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Registering a key that is already present verbatim.
    #[error("identifier already registered")]
    AlreadyRegistered,

    /// Unexpected internal failure (e.g. panicked worker, lock poisoning).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            GatewayError::NoMatch => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            GatewayError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Conflict(_) => StatusCode::BAD_REQUEST,
            GatewayError::Config(_) => StatusCode::BAD_REQUEST,
            GatewayError::AlreadyRegistered => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            GatewayError::NoMatch => json!({ "msg": "no api with such identifier" }),
            GatewayError::QuotaExceeded => json!({ "msg": "daily quota reached" }),
            GatewayError::UnsupportedMethod(m) => {
                json!({ "msg": format!("unsupported http method: {m}") })
            }
            GatewayError::Conflict(msg) => json!({ "error": msg }),
            GatewayError::Config(msg) => json!({ "error": msg }),
            GatewayError::AlreadyRegistered => {
                json!({ "error": "identifier already registered" })
            }
            GatewayError::Internal(msg) => json!({ "error": msg }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn no_match_is_400() {
        assert_eq!(GatewayError::NoMatch.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn quota_exceeded_is_429() {
        assert_eq!(
            GatewayError::QuotaExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn conflict_is_400() {
        assert_eq!(
            GatewayError::Conflict("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
