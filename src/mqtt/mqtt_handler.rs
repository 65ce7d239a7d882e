use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::credentials::MqttCredentials;
use super::message_manager::{MQTTMessage, MessageHandler};
use super::topics::DeviceTopics;
use crate::config::Config;
use crate::error::DeviceError;
use crate::telemetry::PropertyPost;

/// Pause before polling again after a connection error; rumqttc reconnects on the next poll.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Ticks every `period`, first after one period. Ticks missed while a publish
/// is blocked are not replayed back to back.
fn publish_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Publishes generated property reports on the device's post topic
pub struct TelemetryPublisher {
    client: AsyncClient,
    topic: String,
    qos: QoS,
    rng: StdRng,
}

impl TelemetryPublisher {
    pub fn new(client: AsyncClient, topic: String, qos: QoS, rng: StdRng) -> Self {
        Self {
            client,
            topic,
            qos,
            rng,
        }
    }

    /// Generates one report with id `id_ms` and queues it for publishing
    pub async fn publish_once(&mut self, id_ms: i64) -> Result<PropertyPost, DeviceError> {
        let post = PropertyPost::generate(&mut self.rng, id_ms);
        let payload = post.to_json()?;
        info!(topic = %self.topic, "postData {}", payload);
        self.client
            .publish(self.topic.as_str(), self.qos, false, payload)
            .await?;
        Ok(post)
    }

    /// Publishes every `period` until `cancel` fires. The first report goes out after one period.
    pub async fn run(mut self, period: Duration, cancel: CancellationToken) {
        let mut ticker = publish_ticker(period);
        info!("Publishing telemetry every {:?} on {}", period, self.topic);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Telemetry publisher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.publish_once(epoch_millis()).await {
                        warn!("Failed to publish telemetry: {}", e);
                    }
                }
            }
        }
    }
}

/// Drives the rumqttc event loop and hands inbound publishes to `handler`
pub async fn run_event_loop<H: MessageHandler>(
    mut eventloop: EventLoop,
    mut handler: H,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Event loop stopped");
                break;
            }
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("Connected with result code {:?}", ack.code);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    handler.handle(MQTTMessage::from_publish(&publish.topic, &publish.payload));
                }
                Ok(event) => {
                    debug!("MQTT event: {:?}", event);
                }
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_PAUSE) => {}
                    }
                }
            }
        }
    }
}

/// Running device session: one event-loop task and one publisher task
pub struct DeviceHandle {
    cancel: CancellationToken,
    event_task: JoinHandle<()>,
    publish_task: JoinHandle<()>,
}

impl DeviceHandle {
    /// Connects with credentials derived from `config`, subscribes to the
    /// control topic and starts publishing telemetry.
    pub async fn spawn<H: MessageHandler>(config: &Config, handler: H) -> Result<Self, DeviceError> {
        let qos = config.mqtt.qos()?;
        let mut rng = match config.telemetry.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let credentials = MqttCredentials::derive(&config.device, &mut rng, epoch_millis());
        let options = credentials.mqtt_options(&config.device, &config.mqtt);
        let (host, port) = options.broker_address();
        info!(
            "Connecting to {}:{} as {}",
            host, port, credentials.username
        );

        let (client, eventloop) = AsyncClient::new(options, config.mqtt.channel_capacity);
        let topics = DeviceTopics::for_device(&config.device);

        if let Err(e) = client.subscribe(topics.control.as_str(), qos).await {
            warn!("Failed to subscribe to {}: {}", topics.control, e);
        } else {
            info!("Subscribed to {}", topics.control);
        }

        let cancel = CancellationToken::new();
        let event_task = tokio::spawn(run_event_loop(eventloop, handler, cancel.clone()));

        let publisher = TelemetryPublisher::new(client, topics.property_post, qos, rng);
        let publish_task = tokio::spawn(publisher.run(config.mqtt.publish_interval(), cancel.clone()));

        Ok(Self {
            cancel,
            event_task,
            publish_task,
        })
    }

    /// Stops both tasks and waits for them to finish
    pub async fn shutdown(self) {
        debug!("Sending shutdown signal to device tasks");
        self.cancel.cancel();

        for (name, task) in [("event loop", self.event_task), ("publisher", self.publish_task)] {
            if let Err(e) = task.await {
                error!("Device {} task panicked: {}", name, e);
            }
        }
        info!("Device session closed");
    }
}
