use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    pub queue_topic: String,

    pub http_bind: String,
    pub api_tokens: Vec<String>,
    pub publish_queue: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let mqtt_url = env_string("GATEWAY_MQTT_URL", Some("mqtt://127.0.0.1:1883".to_string()))?;
        let mqtt_username = env_optional("GATEWAY_MQTT_USERNAME");
        let mqtt_password = env_optional("GATEWAY_MQTT_PASSWORD");

        let url = Url::parse(&mqtt_url).context("invalid GATEWAY_MQTT_URL")?;
        let mqtt_host = url
            .host_str()
            .ok_or_else(|| anyhow!("GATEWAY_MQTT_URL missing host"))?
            .to_string();
        let mqtt_port = url.port().unwrap_or(1883);

        let mqtt_client_id = env_string(
            "GATEWAY_MQTT_CLIENT_ID",
            Some(format!("gps-gateway-{}", std::process::id())),
        )?;
        let queue_topic = env_string("GATEWAY_QUEUE_TOPIC", Some("fleet/gps".to_string()))?;

        let http_bind = env_string("GATEWAY_HTTP_BIND", Some("127.0.0.1:9301".to_string()))?;

        let api_tokens: Vec<String> = env_string("GATEWAY_API_TOKENS", None)?
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        if api_tokens.is_empty() {
            return Err(anyhow!("GATEWAY_API_TOKENS must contain at least one token"));
        }

        let publish_queue = env_u64("GATEWAY_PUBLISH_QUEUE", Some(256))? as usize;

        Ok(Self {
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_client_id,
            queue_topic,
            http_bind,
            api_tokens,
            publish_queue,
        })
    }
}

fn env_string(key: &str, default: Option<String>) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_u64(key: &str, default: Option<u64>) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid {key}")),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
