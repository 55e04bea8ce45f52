//! The frozen description of one outbound call, and the envelope the
//! upstream worker resolves it with.

use crate::models::identifier::Method;
use std::collections::HashMap;

/// A request queued for dispatch to an upstream.
///
/// Headers are stored with lowercase keys so lookups and the
/// case-insensitive forwarding contract in §6 of the spec don't need a
/// separate wrapper type.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: serde_json::Value,
}

impl ProxyRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }
}

impl Default for ProxyRequest {
    fn default() -> Self {
        ProxyRequest {
            url: String::new(),
            method: Method::Get,
            headers: HashMap::new(),
            query: HashMap::new(),
            body: serde_json::Value::Null,
        }
    }
}

/// The hop-by-hop response headers stripped before forwarding to the
/// caller (§6: Content-Length, Content-Encoding and Transfer-Encoding are
/// recomputed or irrelevant once the proxy re-encodes the body).
pub const STRIPPED_RESPONSE_HEADERS: &[&str] =
    &["content-length", "content-encoding", "transfer-encoding"];

/// The outcome of dispatching one [`ProxyRequest`], delivered through the
/// work item's completion.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The upstream was reached and returned a response (2xx or otherwise);
    /// it is forwarded to the caller verbatim, status included.
    Response {
        status: u16,
        headers: HashMap<String, String>,
        body: serde_json::Value,
    },
    /// The upstream could not be reached, or its response could not be
    /// decoded. `kind` and `message` are joined into the `{"error": "..."}`
    /// envelope; the HTTP status used to surface it is a deployment choice
    /// (see [`crate::config::settings::ErrorStatusPolicy`]), not baked in here.
    TransportError { kind: String, message: String },
    /// The process is shutting down and this item was abandoned before a
    /// dispatch could start.
    ShutdownAbandoned,
}

impl DispatchOutcome {
    /// Builds the `{"error": "<kind>: <message>"}` body shared by transport
    /// errors and shutdown abandonment.
    pub fn error_body(kind: &str, message: &str) -> serde_json::Value {
        serde_json::json!({ "error": format!("{kind}: {message}") })
    }
}
