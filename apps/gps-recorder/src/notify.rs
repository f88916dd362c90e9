use crate::config::Config;
use crate::record::GpsRecord;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;

/// Background webhook sender for out-of-range records. Owns the one reused
/// HTTP client; delivery failures are logged and never retried.
#[derive(Clone)]
pub struct InvalidGpsNotifier {
    tx: mpsc::Sender<GpsRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvalidGpsAlert<'a> {
    vehicle_id: &'a str,
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a GpsRecord> for InvalidGpsAlert<'a> {
    fn from(record: &'a GpsRecord) -> Self {
        Self {
            vehicle_id: &record.vehicle_id,
            latitude: record.latitude,
            longitude: record.longitude,
            timestamp: record.timestamp,
        }
    }
}

impl InvalidGpsNotifier {
    /// Returns `None` when no webhook URL is configured; alerts are then
    /// logged and skipped by the caller.
    pub fn new(config: &Config) -> Option<Self> {
        let url = config.webhook_url.clone()?;
        let (tx, rx) = mpsc::channel(config.webhook_queue.max(1));

        tokio::spawn(async move {
            run_notifier(rx, url).await;
        });

        Some(Self { tx })
    }

    pub fn enqueue(&self, record: GpsRecord) {
        if let Err(err) = self.tx.try_send(record) {
            tracing::warn!(error=%err, "webhook queue full; dropping invalid-GPS alert");
        }
    }
}

async fn run_notifier(mut rx: mpsc::Receiver<GpsRecord>, url: String) {
    let client = Client::new();
    while let Some(record) = rx.recv().await {
        if let Err(err) = post_alert(&client, &url, &record).await {
            tracing::warn!(error=%err, vehicle=%record.vehicle_id, "failed to deliver invalid-GPS alert");
        }
    }
}

async fn post_alert(client: &Client, url: &str, record: &GpsRecord) -> Result<(), reqwest::Error> {
    let alert = InvalidGpsAlert::from(record);
    let response = client.post(url).json(&alert).send().await?;
    if !response.status().is_success() {
        tracing::warn!(
            status=%response.status(),
            vehicle=%record.vehicle_id,
            "invalid-GPS webhook returned non-success"
        );
    } else {
        tracing::info!(vehicle=%record.vehicle_id, "invalid-GPS alert delivered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::InvalidGpsAlert;
    use crate::record::GpsRecord;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn alert_payload_carries_expected_fields_only() {
        let record = GpsRecord {
            id: Uuid::new_v4(),
            vehicle_id: "V2".to_string(),
            latitude: 95.0,
            longitude: 10.0,
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(InvalidGpsAlert::from(&record)).expect("serialize");
        let object = value.as_object().expect("object");

        assert_eq!(object["vehicleId"], "V2");
        assert_eq!(object["latitude"], 95.0);
        assert_eq!(object["longitude"], 10.0);
        assert!(object.contains_key("timestamp"));
        // The record id stays out of the alert payload.
        assert!(!object.contains_key("id"));
        assert_eq!(object.len(), 4);
    }
}
