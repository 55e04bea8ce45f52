//! Loads and resolves the on-disk config file (§6, §10.3).

use crate::models::error::GatewayError;
use crate::models::settings::Settings;
use actix_web::http::StatusCode;
use log::{info, warn};
use std::path::{Path, PathBuf};

const CONFIG_PATH_ENV: &str = "CHRONOS_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "chronos.config.json";
const MAX_CONFIG_BYTES: u64 = 10 * 1024 * 1024;

/// Whether transport errors surface as the legacy HTTP 200 with an error
/// body, or the reimplementation's default of HTTP 502 (§9 redesign note).
/// Read once at startup from `CHRONOS_ERROR_STATUS_LEGACY_200` and shared
/// through `web::Data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorStatusPolicy {
    pub legacy_200: bool,
}

impl ErrorStatusPolicy {
    pub fn from_env() -> Self {
        let legacy_200 = std::env::var("CHRONOS_ERROR_STATUS_LEGACY_200")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        ErrorStatusPolicy { legacy_200 }
    }

    pub fn transport_error_status(&self) -> StatusCode {
        if self.legacy_200 {
            StatusCode::OK
        } else {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Resolves the config file path: `CHRONOS_CONFIG_PATH` if set, else the
/// fixed default relative to the process's working directory.
pub fn resolve_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads and parses the config file, guarding against path traversal and
/// oversized files the way the host project's config loader does.
pub async fn load_config() -> Result<Settings, GatewayError> {
    let path = resolve_config_path();
    load_config_from(&path).await
}

pub async fn load_config_from(path: &Path) -> Result<Settings, GatewayError> {
    if path.components().any(|c| c.as_os_str() == "..") {
        return Err(GatewayError::Config(format!(
            "refusing path with a parent-directory segment: {}",
            path.display()
        )));
    }

    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("config file {} not found, starting with an empty registry", path.display());
            return Ok(Settings::default());
        }
        Err(e) => return Err(GatewayError::Config(format!("cannot stat config file: {e}"))),
    };

    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(GatewayError::Config(format!(
            "config file {} is {} bytes, exceeding the {} byte limit",
            path.display(),
            metadata.len(),
            MAX_CONFIG_BYTES
        )));
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GatewayError::Config(format!("cannot read config file: {e}")))?;

    let settings: Settings = serde_json::from_str(&contents)
        .map_err(|e| GatewayError::Config(format!("malformed config JSON: {e}")))?;

    info!("loaded {} source entries from {}", settings.sources.len(), path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_empty_settings() {
        let settings = load_config_from(Path::new("/nonexistent/chronos.config.json"))
            .await
            .unwrap();
        assert!(settings.sources.is_empty());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let result = load_config_from(Path::new("../escape.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn loads_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"sources":[{"identifier":{"url":"http://h/a"}}]}"#)
            .await
            .unwrap();
        let settings = load_config_from(&path).await.unwrap();
        assert_eq!(settings.sources.len(), 1);
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.json");
        let huge = vec![b'a'; (MAX_CONFIG_BYTES + 1) as usize];
        tokio::fs::write(&path, huge).await.unwrap();
        let result = load_config_from(&path).await;
        assert!(result.is_err());
    }

    #[test]
    fn error_status_policy_defaults_to_modern() {
        assert!(!ErrorStatusPolicy::default().legacy_200);
    }
}
