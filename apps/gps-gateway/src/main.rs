mod auth;
mod config;
mod error;
mod http;
mod publisher;
mod record;

use crate::auth::ApiTokenSet;
use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,gps_gateway=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let tokens = Arc::new(ApiTokenSet::new(&config.api_tokens));
    let (publisher, publish_rx) = publisher::channel(config.publish_queue);

    let publisher_config = config.clone();
    let publisher_handle = tokio::spawn(async move {
        if let Err(err) = publisher::run_publisher(publisher_config, publish_rx).await {
            tracing::error!(error=%err, "mqtt publisher exited");
        }
    });

    let app = http::router(http::HttpState { publisher, tokens });
    let listener = tokio::net::TcpListener::bind(&config.http_bind).await?;
    tracing::info!(bind=%config.http_bind, "gps-gateway HTTP listening");
    let http_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
        _ = publisher_handle => {}
        _ = http_handle => {}
    }

    Ok(())
}
