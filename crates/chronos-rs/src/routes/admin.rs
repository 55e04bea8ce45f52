//! Admin surface for listing and registering upstreams (§6).

use crate::config::settings::resolve_config_path;
use crate::models::error::GatewayError;
use crate::models::settings::SourceEntry;
use crate::registry::Registry;
use actix_web::{post, web, HttpResponse};
use serde_json::json;

/// Deserializes the body by hand rather than via `web::Json<SourceEntry>`,
/// so a malformed body — an unknown HTTP method, or an extra key on the
/// `deny_unknown_fields` `Identifier` — reaches `GatewayError` and gets
/// §6's `{"error": "<message>"}` envelope instead of actix's default
/// plain-text extractor-rejection response.
#[post("/admin/add_api")]
pub async fn add_api(
    registry: web::Data<Registry>,
    body: web::Bytes,
) -> Result<HttpResponse, GatewayError> {
    let entry: SourceEntry = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::Config(format!("malformed source entry: {e}")))?;
    registry.register(entry.clone())?;
    persist_registration(&entry).await;
    Ok(HttpResponse::Ok().json(json!({ "data": "Api has been added" })))
}

#[actix_web::get("/admin/get_apis")]
pub async fn get_apis(registry: web::Data<Registry>) -> HttpResponse {
    HttpResponse::Ok().json(registry.all_keys())
}

/// Appends a successfully registered entry to the on-disk config file so
/// admin-registered upstreams survive a restart (§6 "Persisted state").
/// Losing this write on crash does not violate any invariant: in-memory
/// state is authoritative while the process is running.
async fn persist_registration(entry: &SourceEntry) {
    let path = resolve_config_path();
    let mut settings = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => crate::models::settings::Settings::default(),
    };
    settings.sources.push(entry.clone());

    match serde_json::to_string_pretty(&settings) {
        Ok(json) => {
            if let Err(e) = tokio::fs::write(&path, json).await {
                log::error!("failed to persist admin registration to {}: {e}", path.display());
            }
        }
        Err(e) => log::error!("failed to serialize settings for persistence: {e}"),
    }
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(add_api).service(get_apis);
}
