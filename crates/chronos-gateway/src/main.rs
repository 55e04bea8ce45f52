//! Chronos gateway server entry point.
//!
//! Loads the upstream registry from disk, starts one pacing worker per
//! upstream plus the midnight quota-reset scheduler, and serves the admin,
//! health, metrics, and catch-all proxy routes over actix-web.

use chronos_rs::config::settings::{load_config, ErrorStatusPolicy};
use chronos_rs::config::validation::ConfigValidator;
use chronos_rs::logs::logger::configure_logger;
use chronos_rs::registry::Registry;
use chronos_rs::routes::{admin, health, intake, metrics};

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    configure_logger();

    let settings = load_config().await.expect("failed to load config file");
    ConfigValidator::validate(&settings);

    let client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(32)
        .build()
        .expect("failed to build upstream http client");

    let registry = Arc::new(Registry::from_config(&settings, client));
    registry.start();
    info!("registry started with {} upstream(s)", registry.all_keys().len());

    let error_policy = web::Data::new(ErrorStatusPolicy::from_env());
    let metrics_collector = web::Data::new(metrics::MetricsCollector::default());
    let registry_data = web::Data::from(registry.clone());

    let host = std::env::var("CHRONOS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("CHRONOS_PORT")
        .unwrap_or_else(|_| "5900".to_string())
        .parse::<u16>()
        .unwrap_or(5900);

    info!("starting server on {host}:{port}");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(registry_data.clone())
            .app_data(error_policy.clone())
            .app_data(metrics_collector.clone())
            .wrap(Logger::new(r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#))
            .configure(health::configure_health)
            .configure(metrics::configure_metrics)
            .configure(admin::configure_admin)
            .configure(intake::configure_intake)
    })
    .bind((host.as_str(), port))?
    .run();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                log::error!("server error: {e}");
            }
        }
        _ = signal::ctrl_c() => {
            info!("received shutdown signal, stopping server...");
        }
    }

    registry.stop();
    Ok(())
}
