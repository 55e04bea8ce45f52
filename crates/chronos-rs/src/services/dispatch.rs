//! Outbound HTTP dispatch: turns a [`ProxyRequest`] into an upstream call
//! and the upstream's response (or failure) into a [`DispatchOutcome`].

use crate::models::request::{DispatchOutcome, ProxyRequest, STRIPPED_RESPONSE_HEADERS};
use log::{debug, warn};
use reqwest::{Client, Method as ReqwestMethod};
use std::collections::HashMap;

/// Sends one forwarded call to its upstream. Never panics on a transport
/// failure — it is folded into [`DispatchOutcome::TransportError`] so the
/// worker loop and intake handler never need to distinguish connection
/// errors from decode errors.
pub async fn send(client: &Client, request: &ProxyRequest) -> DispatchOutcome {
    let method = match ReqwestMethod::from_bytes(request.method.as_str().as_bytes()) {
        Ok(m) => m,
        Err(_) => return transport_error("method", "could not encode outbound method"),
    };

    let mut builder = client.request(method, &request.url).query(&request.query);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !request.body.is_null() {
        builder = builder.json(&request.body);
    }

    debug!("dispatching {} {}", request.method, request.url);

    let response = match builder.send().await {
        Ok(r) => r,
        Err(e) => return transport_error("connection", &e.to_string()),
    };

    let status = response.status().as_u16();
    let mut headers = HashMap::with_capacity(response.headers().len());
    for (name, value) in response.headers() {
        let name = name.as_str().to_ascii_lowercase();
        if STRIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            headers.insert(name, value.to_string());
        }
    }

    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => return transport_error("body", &e.to_string()),
    };

    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!("upstream response was not valid JSON: {e}");
                return transport_error("decode", &e.to_string());
            }
        }
    };

    DispatchOutcome::Response { status, headers, body }
}

fn transport_error(kind: &str, message: &str) -> DispatchOutcome {
    warn!("transport error dispatching request: {kind}: {message}");
    DispatchOutcome::TransportError {
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identifier::Method;

    #[tokio::test]
    async fn unreachable_host_yields_transport_error() {
        let client = Client::new();
        let request = ProxyRequest {
            url: "http://127.0.0.1:1".to_string(),
            method: Method::Get,
            headers: HashMap::new(),
            query: HashMap::new(),
            body: serde_json::Value::Null,
        };
        let outcome = send(&client, &request).await;
        assert!(matches!(outcome, DispatchOutcome::TransportError { .. }));
    }
}
