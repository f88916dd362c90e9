use crate::config::Config;
use crate::record::decode_record;
use crate::recorder::GpsRecorder;
use anyhow::Result;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::time::{sleep, Duration};

/// Subscribes to the queue topic at QoS 1 and processes one message at a
/// time. Every failure past decode is logged and the message is considered
/// handled; redelivery is the broker's policy, not ours.
pub async fn run_listener(config: Config, recorder: GpsRecorder) -> Result<()> {
    loop {
        let mut mqttoptions = MqttOptions::new(
            config.mqtt_client_id.clone(),
            config.mqtt_host.clone(),
            config.mqtt_port,
        );
        mqttoptions.set_keep_alive(config.mqtt_keepalive());
        if let Some(username) = &config.mqtt_username {
            mqttoptions.set_credentials(
                username.clone(),
                config.mqtt_password.clone().unwrap_or_default(),
            );
        }

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 32);

        match client
            .subscribe(config.queue_topic.clone(), QoS::AtLeastOnce)
            .await
        {
            Ok(_) => tracing::info!(topic=%config.queue_topic, "subscribed to GPS queue"),
            Err(err) => {
                tracing::warn!(error=%err, "failed to subscribe to GPS queue; retrying");
                sleep(Duration::from_secs(2)).await;
                continue;
            }
        }

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    let mut payload = publish.payload.to_vec();
                    match decode_record(&mut payload) {
                        Ok(record) => {
                            if let Err(err) = recorder.record(record).await {
                                tracing::warn!(error=%err, "failed to process GPS record");
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                error=%err,
                                topic=%publish.topic,
                                "failed to decode GPS payload; dropping message"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error=%err, "MQTT connection dropped; reconnecting");
                    break;
                }
            }
        }

        sleep(Duration::from_secs(1)).await;
    }
}
