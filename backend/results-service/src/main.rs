/// Results Service - HTTP Server
///
/// Serves the dashboard's read-only queries over the compiled lottery results file.
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use results_service::{handlers, Config, DataAccessService, DataSource};
use s3_utils::S3Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,results_service=debug,s3_utils=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let s3 = S3Client::from_env()
        .await
        .context("Failed to load S3 configuration")?;
    if let Err(e) = s3.health_check().await {
        // Not fatal: an existing local copy can still be served
        warn!("S3 health check failed: {}", e);
    }

    let source = DataSource {
        bucket: config.bucket_or(&s3.config().bucket_name).to_string(),
        key: config.object_key.clone(),
        local_path: config.local_path.clone(),
    };
    info!(
        bucket = %source.bucket,
        key = %source.key,
        path = %source.local_path.display(),
        freshness = ?config.freshness_policy(),
        "Results source configured"
    );

    let service = web::Data::new(DataAccessService::new(
        Arc::new(s3.operations()),
        source,
        config.freshness_policy(),
    ));

    // Warm the local copy; failures are retried lazily on the first request
    if let Err(e) = service.data_file().await {
        warn!("Initial sync of results file failed: {}", e);
    }

    let bind_address = format!("{}:{}", config.http_host, config.http_port);
    info!("Results service starting HTTP server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
