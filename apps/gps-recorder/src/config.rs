use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_pool_size: u32,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_keepalive_secs: u64,
    pub mqtt_client_id: String,
    pub queue_topic: String,
    pub webhook_url: Option<String>,
    pub webhook_queue: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("RECORDER_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("RECORDER_DATABASE_URL or DATABASE_URL is required")?;

        let mqtt_host = env::var("RECORDER_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = env::var("RECORDER_MQTT_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(1883);
        let mqtt_username = env::var("RECORDER_MQTT_USERNAME").ok();
        let mqtt_password = env::var("RECORDER_MQTT_PASSWORD").ok();
        let mqtt_keepalive_secs = env::var("RECORDER_MQTT_KEEPALIVE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        let mqtt_client_id = env::var("RECORDER_MQTT_CLIENT_ID")
            .unwrap_or_else(|_| format!("gps-recorder-{}", std::process::id()));
        let queue_topic =
            env::var("RECORDER_QUEUE_TOPIC").unwrap_or_else(|_| "fleet/gps".to_string());

        let webhook_url = env::var("RECORDER_WEBHOOK_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let webhook_queue = env::var("RECORDER_WEBHOOK_QUEUE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(256);

        let db_pool_size = env::var("RECORDER_DB_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            db_pool_size,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_keepalive_secs,
            mqtt_client_id,
            queue_topic,
            webhook_url,
            webhook_queue,
        })
    }

    pub fn mqtt_keepalive(&self) -> Duration {
        Duration::from_secs(self.mqtt_keepalive_secs)
    }
}
