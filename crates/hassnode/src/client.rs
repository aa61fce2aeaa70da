use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::AsyncClient;
use rumqttc::Event;
use rumqttc::MqttOptions;
use rumqttc::Outgoing;
use rumqttc::Packet;
use rumqttc::QoS;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::MqttConfig;
use crate::model::Qos;

/// MQTT message received from a subscription
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

/// Errors reported by an [`MqttClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("MQTT client not connected. Call connect() first.")]
    NotConnected,

    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// The transport refused the request.
    #[error("MQTT request rejected: {0}")]
    Rejected(String),
}

/// Callback invoked for every message arriving on a registered topic.
///
/// Handlers run on the client's delivery task, not on the task that
/// registered them.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: MqttMessage);
}

/// Trait for MQTT client operations
///
/// This trait allows for mocking the MQTT client for testing purposes.
/// Publishes are fire-and-forget: returning `Ok` means the request was
/// queued, not that the broker acknowledged it.
#[async_trait]
pub trait MqttClient: Send + Sync {
    /// Connect to the MQTT broker
    async fn connect(&self) -> Result<(), ClientError>;

    /// Flush queued requests and disconnect from the broker
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Publish a message to an MQTT topic
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), ClientError>;

    /// Subscribe to an MQTT topic
    async fn subscribe(&self, topic: &str) -> Result<(), ClientError>;

    /// Unsubscribe from an MQTT topic
    async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError>;

    /// Route messages arriving on `topic` to `handler`, replacing any
    /// previous handler for that topic.
    fn add_message_handler(&self, topic: &str, handler: Arc<dyn MessageHandler>);

    /// Stop routing messages arriving on `topic`.
    fn remove_message_handler(&self, topic: &str);
}

impl From<Qos> for QoS {
    fn from(qos: Qos) -> Self {
        match qos {
            Qos::AtMostOnce => QoS::AtMostOnce,
            Qos::AtLeastOnce => QoS::AtLeastOnce,
            Qos::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

type HandlerMap = Arc<RwLock<HashMap<String, Arc<dyn MessageHandler>>>>;

struct Connection {
    client: AsyncClient,
    event_loop_task: JoinHandle<()>,
    dispatch_task: JoinHandle<()>,
}

/// Real MQTT client implementation using rumqttc
pub struct RumqttcClient {
    /// MQTT connection options (stored for lazy initialization)
    mqtt_options: MqttOptions,

    /// Per-topic message handlers, shared with the dispatch task
    handlers: HandlerMap,

    /// Live client and background tasks (created in connect())
    connection: Mutex<Option<Connection>>,
}

impl RumqttcClient {
    /// Create a new RumqttcClient from configuration
    pub fn new(config: &MqttConfig, client_id: &str) -> Self {
        let mut mqtt_options = MqttOptions::new(client_id, config.broker.clone(), config.port);

        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        // Keep command subscriptions on the broker across reconnects.
        mqtt_options.set_clean_session(false);

        // Discovery documents for large device descriptors can exceed the
        // rumqttc default of 10 KiB.
        mqtt_options.set_max_packet_size(256 * 1024, 256 * 1024);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(username, password);
        }

        Self {
            mqtt_options,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            connection: Mutex::new(None),
        }
    }

    fn active_client(&self) -> Result<AsyncClient, ClientError> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|connection| connection.client.clone())
            .ok_or(ClientError::NotConnected)
    }

    /// Queue a subscription for every topic with a registered handler.
    ///
    /// Runs on the event loop task, so requests are queued without waiting.
    /// Returns how many were queued.
    fn resubscribe(client: &AsyncClient, handlers: &HandlerMap) -> usize {
        let topics: Vec<String> = handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();

        topics
            .iter()
            .filter(|topic| match client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to resubscribe to {}: {}", topic, e);
                    false
                }
            })
            .count()
    }

    /// Route one incoming message to its handler.
    async fn dispatch(handlers: &HandlerMap, message: MqttMessage) {
        let handler = handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.topic)
            .cloned();

        match handler {
            Some(handler) => handler.handle(message).await,
            None => debug!("No handler registered for topic: {}", message.topic),
        }
    }
}

#[async_trait]
impl MqttClient for RumqttcClient {
    async fn connect(&self) -> Result<(), ClientError> {
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if connection.is_some() {
            debug!("MQTT client already connected");
            return Ok(());
        }

        let (client, mut event_loop) = AsyncClient::new(self.mqtt_options.clone(), 64);

        // Incoming publishes are handed to a separate task so that a handler
        // publishing a reply never waits on the event loop it is running in.
        let (message_tx, mut message_rx) = mpsc::unbounded_channel();

        let loop_client = client.clone();
        let loop_handlers = self.handlers.clone();
        let event_loop_task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let msg = MqttMessage {
                            topic: publish.topic.to_string(),
                            payload: publish.payload.to_vec(),
                            retain: publish.retain,
                        };

                        if message_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("MQTT broker accepted connection: {:?}", ack.code);
                        if !ack.session_present {
                            let queued = RumqttcClient::resubscribe(&loop_client, &loop_handlers);
                            if queued > 0 {
                                info!("Resubscribed to {} command topics", queued);
                            }
                        }
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT event loop error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
            info!("MQTT event loop task exiting");
        });

        let handlers = self.handlers.clone();
        let dispatch_task = tokio::spawn(async move {
            while let Some(msg) = message_rx.recv().await {
                Self::dispatch(&handlers, msg).await;
            }
        });

        *connection = Some(Connection {
            client,
            event_loop_task,
            dispatch_task,
        });

        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        let connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ClientError::NotConnected)?;

        // Requests queued before this one (e.g. discovery removals) are sent
        // first; the event loop exits once the disconnect goes out.
        connection.client.disconnect().await?;
        if tokio::time::timeout(Duration::from_secs(5), connection.event_loop_task)
            .await
            .is_err()
        {
            warn!("MQTT event loop did not stop within 5s");
        }
        connection.dispatch_task.abort();

        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), ClientError> {
        self.active_client()?
            .publish(topic, qos.into(), retain, payload.to_vec())
            .await?;

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.active_client()?
            .subscribe(topic, QoS::AtLeastOnce)
            .await?;

        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.active_client()?.unsubscribe(topic).await?;

        Ok(())
    }

    fn add_message_handler(&self, topic: &str, handler: Arc<dyn MessageHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string(), handler);
    }

    fn remove_message_handler(&self, topic: &str) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(topic);
    }
}

impl Drop for RumqttcClient {
    fn drop(&mut self) {
        let connection = self
            .connection
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(connection) = connection {
            connection.event_loop_task.abort();
            connection.dispatch_task.abort();
        }
    }
}

/// A transport request recorded by [`MockMqttClient`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Disconnect,
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: Qos,
        retain: bool,
    },
    Subscribe(String),
    Unsubscribe(String),
    AddHandler(String),
    RemoveHandler(String),
}

/// Mock MQTT client for testing
///
/// Records every request in order and lets tests inject messages and
/// publish failures.
#[cfg(test)]
#[derive(Default)]
pub struct MockMqttClient {
    calls: Mutex<Vec<Call>>,
    handlers: Mutex<HashMap<String, Arc<dyn MessageHandler>>>,
    subscriptions: Mutex<Vec<String>>,
    failing_topics: Mutex<Vec<String>>,
    failing_unsubscribes: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockMqttClient {
    /// Create a new mock MQTT client
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Every request made so far, oldest first
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Payloads published to `topic`, oldest first
    pub fn published_to(&self, topic: &str) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Publish {
                    topic: t, payload, ..
                } if t == topic => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Topics currently subscribed
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn has_handler(&self, topic: &str) -> bool {
        self.handlers.lock().unwrap().contains_key(topic)
    }

    /// Make every later publish to `topic` fail after being recorded
    pub fn fail_publish_to(&self, topic: &str) {
        self.failing_topics.lock().unwrap().push(topic.to_string());
    }

    /// Make every later unsubscribe from `topic` fail after being recorded
    pub fn fail_unsubscribe_from(&self, topic: &str) {
        self.failing_unsubscribes
            .lock()
            .unwrap()
            .push(topic.to_string());
    }

    /// Deliver a message to the handler registered for `topic`.
    ///
    /// Returns false if no handler is registered.
    pub async fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        let handler = self.handlers.lock().unwrap().get(topic).cloned();
        match handler {
            Some(handler) => {
                handler
                    .handle(MqttMessage {
                        topic: topic.to_string(),
                        payload: payload.to_vec(),
                        retain: false,
                    })
                    .await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl MqttClient for MockMqttClient {
    async fn connect(&self) -> Result<(), ClientError> {
        self.record(Call::Connect);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.record(Call::Disconnect);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), ClientError> {
        self.record(Call::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        if self.failing_topics.lock().unwrap().iter().any(|t| t == topic) {
            return Err(ClientError::Rejected(format!("publish to {topic}")));
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.record(Call::Subscribe(topic.to_string()));
        self.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.record(Call::Unsubscribe(topic.to_string()));
        if self.failing_unsubscribes.lock().unwrap().iter().any(|t| t == topic) {
            return Err(ClientError::Rejected(format!("unsubscribe from {topic}")));
        }
        self.subscriptions.lock().unwrap().retain(|t| t != topic);
        Ok(())
    }

    fn add_message_handler(&self, topic: &str, handler: Arc<dyn MessageHandler>) {
        self.record(Call::AddHandler(topic.to_string()));
        self.handlers
            .lock()
            .unwrap()
            .insert(topic.to_string(), handler);
    }

    fn remove_message_handler(&self, topic: &str) {
        self.record(Call::RemoveHandler(topic.to_string()));
        self.handlers.lock().unwrap().remove(topic);
    }
}
