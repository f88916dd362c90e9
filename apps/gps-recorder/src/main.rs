mod config;
mod mqtt;
mod notify;
mod record;
mod recorder;
mod store;

use crate::config::Config;
use crate::notify::InvalidGpsNotifier;
use crate::recorder::GpsRecorder;
use anyhow::Result;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,gps_recorder=info".into());
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

    let pool = store::build_pool(&config.database_url, config.db_pool_size).await?;

    let notifier = InvalidGpsNotifier::new(&config);
    if notifier.is_none() {
        tracing::info!("RECORDER_WEBHOOK_URL not set; invalid-GPS alerts disabled");
    }

    let recorder = GpsRecorder::new(pool, notifier);

    let listener_config = config.clone();
    let mqtt_handle = tokio::spawn(async move {
        if let Err(err) = mqtt::run_listener(listener_config, recorder).await {
            tracing::error!(error=%err, "mqtt listener exited");
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
        _ = mqtt_handle => {}
    }

    Ok(())
}
