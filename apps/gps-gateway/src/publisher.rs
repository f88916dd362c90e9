use crate::config::Config;
use crate::record::GpsRecord;
use anyhow::{anyhow, Result};
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// The process-wide publish path: one long-lived MQTT client behind an mpsc
/// handle, never constructed per request.
#[derive(Debug)]
pub enum PublishCommand {
    Record {
        record: GpsRecord,
        done: oneshot::Sender<Result<()>>,
    },
}

#[derive(Clone)]
pub struct PublisherHandle {
    tx: mpsc::Sender<PublishCommand>,
}

impl PublisherHandle {
    /// Hands the record to the publisher task and waits for the enqueue
    /// outcome. Downstream processing is not awaited.
    pub async fn enqueue(&self, record: GpsRecord) -> Result<()> {
        let (done, outcome) = oneshot::channel();
        self.tx
            .send(PublishCommand::Record { record, done })
            .await
            .map_err(|_| anyhow!("publisher task is not running"))?;
        outcome
            .await
            .map_err(|_| anyhow!("publisher task dropped the request"))?
    }
}

pub fn channel(capacity: usize) -> (PublisherHandle, mpsc::Receiver<PublishCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PublisherHandle { tx }, rx)
}

pub async fn run_publisher(config: Config, mut rx: mpsc::Receiver<PublishCommand>) -> Result<()> {
    loop {
        let mut mqttoptions = MqttOptions::new(
            config.mqtt_client_id.clone(),
            config.mqtt_host.clone(),
            config.mqtt_port,
        );
        mqttoptions.set_keep_alive(Duration::from_secs(15));
        if let Some(username) = &config.mqtt_username {
            mqttoptions.set_credentials(
                username.clone(),
                config.mqtt_password.clone().unwrap_or_default(),
            );
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 256);
        let mut poller = spawn_poller(eventloop);
        tracing::info!(
            host=%config.mqtt_host,
            port=config.mqtt_port,
            topic=%config.queue_topic,
            "MQTT publisher started"
        );

        loop {
            tokio::select! {
                res = &mut poller => {
                    match res {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => tracing::warn!(error=%err, "MQTT connection dropped; reconnecting"),
                        Err(err) => tracing::warn!(error=%err, "MQTT poller task failed; reconnecting"),
                    }
                    break;
                }

                maybe = rx.recv() => {
                    let Some(PublishCommand::Record { record, done }) = maybe else {
                        poller.abort();
                        return Ok(());
                    };
                    let result = publish_record(&client, &config.queue_topic, &record).await;
                    if let Err(err) = &result {
                        tracing::warn!(error=%err, vehicle=%record.vehicle_id, "failed to enqueue GPS record");
                    }
                    let _ = done.send(result);
                }
            }
        }

        poller.abort();
        sleep(Duration::from_secs(1)).await;
    }
}

fn spawn_poller(mut eventloop: rumqttc::EventLoop) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        loop {
            eventloop.poll().await.map_err(|err| anyhow!(err))?;
        }
    })
}

async fn publish_record(client: &AsyncClient, topic: &str, record: &GpsRecord) -> Result<()> {
    let payload = serde_json::to_vec(record)?;
    client
        .publish(topic, QoS::AtLeastOnce, false, payload)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::channel;
    use crate::record::GpsRecord;

    #[tokio::test]
    async fn enqueue_fails_when_publisher_is_gone() {
        let (handle, rx) = channel(4);
        drop(rx);

        let record = GpsRecord::new("V1".to_string(), 45.0, 90.0);
        let err = handle.enqueue(record).await.unwrap_err();
        assert!(err.to_string().contains("not running"));
    }

    #[tokio::test]
    async fn enqueue_reports_the_publish_outcome() {
        let (handle, mut rx) = channel(4);

        let worker = tokio::spawn(async move {
            while let Some(super::PublishCommand::Record { done, .. }) = rx.recv().await {
                let _ = done.send(Ok(()));
            }
        });

        let record = GpsRecord::new("V1".to_string(), 45.0, 90.0);
        assert!(handle.enqueue(record).await.is_ok());
        drop(handle);
        worker.await.expect("worker");
    }
}
