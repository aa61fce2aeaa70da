//! Entities and their binding lifecycle.
//!
//! An [`Entity`] is either unbound, carrying no linkage at all, or bound to
//! exactly one [`Node`]. Binding derives the entity's identity and topics
//! from the node, subscribes to command topics, and announces the entity to
//! the hub; unbinding withdraws the announcement, drops the subscriptions and
//! clears every derived field again.
//!
//! The order of those steps is fixed. Subscriptions go live before discovery
//! is published, because the hub may answer a fresh discovery document with
//! a retained command straight away. Discovery is withdrawn before the
//! subscriptions are dropped, so the hub stops sending commands first.

mod capability;
mod level;
mod reading;
mod toggle;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use capability::BindContext;
pub use capability::Capability;
pub use level::Level;
pub use reading::Gauge;
pub use reading::Probe;
pub use toggle::Toggle;
pub use toggle::UnrecognizedPayload;

use crate::client::MessageHandler;
use crate::client::MqttClient;
use crate::client::MqttMessage;
use crate::model::DeviceInfo;
use crate::model::EntityModel;
use crate::model::Qos;
use crate::node::Node;
use crate::node::NodeShared;
use crate::topics;
use crate::Error;

/// QoS used for discovery documents and their removal.
const DISCOVERY_QOS: Qos = Qos::AtLeastOnce;

/// Link from a bound entity back to its node.
///
/// The node owns its entities, never the other way round: the link holds a
/// weak handle plus the pieces of the node the entity needs to talk to the
/// broker.
struct Binding {
    node: Weak<NodeShared>,
    node_id: String,
    client: Arc<dyn MqttClient>,
    discovery_topic: String,
    retain_discovery: bool,
}

struct Record {
    model: EntityModel,
    binding: Option<Binding>,
}

struct Inner {
    id: String,
    capability: Arc<dyn Capability>,
    record: Mutex<Record>,
}

impl Inner {
    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_bound(&self) -> Error {
        Error::NotBound {
            entity_id: self.id.clone(),
        }
    }
}

/// Linkage fields common to every entity kind.
struct Linkage {
    unique_id: Option<String>,
    state_topic: Option<String>,
    device: Option<DeviceInfo>,
}

impl Linkage {
    fn derive(node_id: &str, entity_id: &str, device: &DeviceInfo) -> Self {
        Self {
            unique_id: Some(topics::unique_id(node_id, entity_id)),
            state_topic: Some(topics::state_topic(node_id, entity_id)),
            device: Some(device.clone()),
        }
    }

    fn cleared() -> Self {
        Self {
            unique_id: None,
            state_topic: None,
            device: None,
        }
    }

    fn capture(model: &EntityModel) -> (Self, Option<String>) {
        let linkage = Self {
            unique_id: model.unique_id.clone(),
            state_topic: model.state_topic.clone(),
            device: model.device.clone(),
        };
        (linkage, model.command_topic().map(str::to_string))
    }

    fn apply(self, model: &mut EntityModel) {
        model.object_id = self.unique_id.clone();
        model.unique_id = self.unique_id;
        model.state_topic = self.state_topic;
        model.device = self.device;
    }
}

/// Handle to one entity.
///
/// Cloning the handle does not clone the entity: all clones refer to the
/// same model, capability and binding.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.inner.id)
            .field("bound_node", &self.bound_node_id())
            .finish()
    }
}

impl Entity {
    /// Create a detached entity.
    ///
    /// Any linkage fields already present in `model` are cleared; they are
    /// owned by the binding.
    pub fn new(
        id: impl Into<String>,
        mut model: EntityModel,
        capability: Arc<dyn Capability>,
    ) -> Self {
        Linkage::cleared().apply(&mut model);
        model.kind.set_command_topic(None);

        Self {
            inner: Arc::new(Inner {
                id: id.into(),
                capability,
                record: Mutex::new(Record {
                    model,
                    binding: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Snapshot of the current model.
    pub fn model(&self) -> EntityModel {
        self.inner.record().model.clone()
    }

    /// Edit presentation or kind fields of the model.
    ///
    /// Linkage fields are restored after `edit` returns, so a bound entity
    /// keeps its identity. Changes reach the hub on the next
    /// [`publish_discovery`](Self::publish_discovery).
    pub fn update_model(&self, edit: impl FnOnce(&mut EntityModel)) {
        let mut record = self.inner.record();
        let (linkage, command_topic) = Linkage::capture(&record.model);
        edit(&mut record.model);
        linkage.apply(&mut record.model);
        record.model.kind.set_command_topic(command_topic);
    }

    pub fn is_bound(&self) -> bool {
        self.inner.record().binding.is_some()
    }

    /// Id of the node this entity is bound to.
    pub fn bound_node_id(&self) -> Option<String> {
        self.inner
            .record()
            .binding
            .as_ref()
            .map(|binding| binding.node_id.clone())
    }

    /// The node this entity is bound to, if it is bound and the node is still alive.
    pub fn bound_node(&self) -> Option<Node> {
        self.inner
            .record()
            .binding
            .as_ref()
            .and_then(|binding| binding.node.upgrade())
            .map(Node::from_shared)
    }

    pub fn discovery_topic(&self) -> Option<String> {
        self.inner
            .record()
            .binding
            .as_ref()
            .map(|binding| binding.discovery_topic.clone())
    }

    /// True if both handles refer to the same entity.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current state as reported by the capability.
    ///
    /// The capability reads from a snapshot of the model, so a slow reading
    /// never holds up command delivery or binding.
    pub fn get_state(&self) -> Result<String, Error> {
        let model = self.model();
        self.inner.capability.state(&model)
    }

    /// Attach this entity to `node` and make it live.
    ///
    /// Binding again to the node it is already bound to is a no-op.
    pub(crate) async fn bind(&self, node: &Node) -> Result<(), Error> {
        {
            let mut record = self.inner.record();
            if let Some(binding) = &record.binding {
                if node.is_shared(&binding.node) {
                    debug!("Entity {} already bound to node {}", self.inner.id, node.id());
                    return Ok(());
                }
                return Err(Error::AlreadyBound {
                    entity_id: self.inner.id.clone(),
                    node_id: binding.node_id.clone(),
                });
            }

            let discovery_topic = topics::discovery_topic(
                node.discovery_prefix(),
                record.model.discovery_class(),
                node.id(),
                &self.inner.id,
            );
            Linkage::derive(node.id(), &self.inner.id, node.device()).apply(&mut record.model);

            let ctx = BindContext {
                node_id: node.id(),
                entity_id: &self.inner.id,
            };
            self.inner.capability.on_bind(&ctx, &mut record.model);

            record.binding = Some(Binding {
                node: node.downgrade(),
                node_id: node.id().to_string(),
                client: node.client(),
                discovery_topic,
                retain_discovery: node.retains_discovery(),
            });
        }

        info!("Binding entity {} to node {}", self.inner.id, node.id());

        self.subscribe().await?;
        self.publish_discovery().await?;
        self.publish_state().await?;

        Ok(())
    }

    /// Withdraw this entity from the hub and detach it from its node.
    ///
    /// The entity is detached even if the transport fails; the first
    /// transport error is returned afterwards.
    pub(crate) async fn unbind(&self) -> Result<(), Error> {
        let node_id = self
            .bound_node_id()
            .ok_or_else(|| self.inner.not_bound())?;

        let unpublished = self.unpublish_discovery().await;
        let unsubscribed = self.unsubscribe().await;

        {
            let mut record = self.inner.record();
            Linkage::cleared().apply(&mut record.model);
            self.inner.capability.on_unbind(&mut record.model);
            record.binding = None;
        }

        info!("Unbound entity {} from node {}", self.inner.id, node_id);

        unpublished.and(unsubscribed)
    }

    /// Subscribe to every command topic of the capability.
    pub async fn subscribe(&self) -> Result<(), Error> {
        let (client, command_topics) = {
            let record = self.inner.record();
            let binding = record.binding.as_ref().ok_or_else(|| self.inner.not_bound())?;
            (
                binding.client.clone(),
                self.inner.capability.command_topics(&record.model),
            )
        };

        for topic in command_topics {
            // Handler first: a retained command may arrive as soon as the
            // subscription is acknowledged.
            client.add_message_handler(
                &topic,
                Arc::new(CommandHandler {
                    entity: Arc::downgrade(&self.inner),
                }),
            );
            client.subscribe(&topic).await?;
            debug!("Entity {} subscribed to {}", self.inner.id, topic);
        }

        Ok(())
    }

    /// Drop every command subscription of the capability.
    ///
    /// Every topic is attempted and its handler removed even if the
    /// transport fails; the first failure is returned.
    pub async fn unsubscribe(&self) -> Result<(), Error> {
        let (client, command_topics) = {
            let record = self.inner.record();
            let binding = record.binding.as_ref().ok_or_else(|| self.inner.not_bound())?;
            (
                binding.client.clone(),
                self.inner.capability.command_topics(&record.model),
            )
        };

        let mut result = Ok(());
        for topic in command_topics {
            let unsubscribed = client.unsubscribe(&topic).await;
            client.remove_message_handler(&topic);
            match unsubscribed {
                Ok(()) => debug!("Entity {} unsubscribed from {}", self.inner.id, topic),
                Err(e) => {
                    warn!("Entity {} failed to unsubscribe from {}: {}", self.inner.id, topic, e);
                    if result.is_ok() {
                        result = Err(e.into());
                    }
                }
            }
        }

        result
    }

    /// Publish the current state to the state topic.
    pub async fn publish_state(&self) -> Result<(), Error> {
        let (client, topic, model) = {
            let record = self.inner.record();
            let binding = record.binding.as_ref().ok_or_else(|| self.inner.not_bound())?;
            let topic = record
                .model
                .state_topic
                .clone()
                .ok_or_else(|| self.inner.not_bound())?;
            (binding.client.clone(), topic, record.model.clone())
        };

        let state = self.inner.capability.state(&model)?;
        let payload = model.encode_text(&state)?;
        client
            .publish(&topic, &payload, model.qos, model.retain)
            .await?;

        Ok(())
    }

    /// Publish the discovery document.
    pub async fn publish_discovery(&self) -> Result<(), Error> {
        let (client, topic, payload, retain) = {
            let record = self.inner.record();
            let binding = record.binding.as_ref().ok_or_else(|| self.inner.not_bound())?;
            let payload = record.model.discovery_payload().map_err(Error::Payload)?;
            (
                binding.client.clone(),
                binding.discovery_topic.clone(),
                payload,
                binding.retain_discovery,
            )
        };

        client.publish(&topic, &payload, DISCOVERY_QOS, retain).await?;
        debug!("Published discovery for entity {} to {}", self.inner.id, topic);

        Ok(())
    }

    /// Publish an empty document to the discovery topic, which tells the hub
    /// to forget the entity.
    pub async fn unpublish_discovery(&self) -> Result<(), Error> {
        let (client, topic) = {
            let record = self.inner.record();
            let binding = record.binding.as_ref().ok_or_else(|| self.inner.not_bound())?;
            (binding.client.clone(), binding.discovery_topic.clone())
        };

        client.publish(&topic, b"", DISCOVERY_QOS, false).await?;
        debug!("Withdrew discovery for entity {} from {}", self.inner.id, topic);

        Ok(())
    }
}

/// Routes command messages from the transport to one entity.
///
/// Holds the entity weakly so that a registration left behind in the
/// transport never keeps the entity alive.
struct CommandHandler {
    entity: Weak<Inner>,
}

#[async_trait]
impl MessageHandler for CommandHandler {
    async fn handle(&self, message: MqttMessage) {
        let Some(inner) = self.entity.upgrade() else {
            return;
        };

        {
            let record = inner.record();
            if record.binding.is_none() {
                debug!(
                    "Dropping command on {} for unbound entity {}",
                    message.topic, inner.id
                );
                return;
            }
            let payload = record.model.decode_text(&message.payload);
            info!("Entity {} got command {:?} on {}", inner.id, payload, message.topic);
            inner
                .capability
                .on_command(&record.model, &message.topic, &payload);
        }

        let entity = Entity { inner };
        if let Err(e) = entity.publish_state().await {
            warn!("Failed to publish state of entity {}: {}", entity.id(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::OnceLock;

    use super::*;
    use crate::client::Call;
    use crate::client::MockMqttClient;
    use crate::model::SensorModel;
    use crate::model::SwitchModel;
    use crate::node::NodeOptions;

    fn boiler(client: &Arc<MockMqttClient>) -> Node {
        Node::new(
            "boiler1",
            client.clone(),
            DeviceInfo {
                name: Some("Boiler".to_string()),
                manufacturer: Some("Protherm".to_string()),
                ..Default::default()
            },
        )
    }

    fn temperature() -> Entity {
        Entity::new(
            "temp",
            EntityModel::new(SensorModel {
                unit_of_measurement: Some("°C".to_string()),
                ..Default::default()
            })
            .with_name("Boiler temperature"),
            Arc::new(Gauge::new("21.5")),
        )
    }

    fn relay() -> (Entity, Arc<Toggle>) {
        let toggle = Arc::new(Toggle::new(false));
        let entity = Entity::new(
            "relay1",
            EntityModel::new(SwitchModel {
                payload_on: Some("ON".to_string()),
                payload_off: Some("OFF".to_string()),
                ..Default::default()
            }),
            toggle.clone(),
        );
        (entity, toggle)
    }

    /// Capability with no behaviour at all.
    struct Inert;

    impl Capability for Inert {}

    /// Capability listening on two command topics.
    struct Dual;

    impl Capability for Dual {
        fn state(&self, _model: &EntityModel) -> Result<String, Error> {
            Ok("idle".to_string())
        }

        fn command_topics(&self, _model: &EntityModel) -> Vec<String> {
            vec!["boiler1/dual/a".to_string(), "boiler1/dual/b".to_string()]
        }
    }

    #[test]
    fn test_new_entity_is_detached() {
        let mut model = EntityModel::new(SwitchModel::default());
        model.unique_id = Some("stale".to_string());
        model.state_topic = Some("stale/state".to_string());
        model.kind.set_command_topic(Some("stale/command".to_string()));

        let entity = Entity::new("relay1", model, Arc::new(Toggle::new(false)));

        assert!(!entity.is_bound());
        assert!(entity.bound_node().is_none());
        assert!(entity.discovery_topic().is_none());
        assert!(!entity.model().is_linked());
    }

    #[tokio::test]
    async fn test_bind_derives_sensor_topics() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let entity = temperature();

        entity.bind(&node).await.unwrap();

        let model = entity.model();
        assert_eq!(
            entity.discovery_topic().as_deref(),
            Some("homeassistant/sensor/boiler1/temp/config")
        );
        assert_eq!(model.state_topic.as_deref(), Some("boiler1/temp/state"));
        assert_eq!(model.unique_id.as_deref(), Some("boiler1_temp"));
        assert_eq!(model.object_id.as_deref(), Some("boiler1_temp"));
        assert_eq!(model.device.unwrap().name.as_deref(), Some("Boiler"));
        assert_eq!(entity.bound_node_id().as_deref(), Some("boiler1"));
        assert!(entity.bound_node().unwrap().ptr_eq(&node));
    }

    #[tokio::test]
    async fn test_bind_order_is_subscribe_discovery_state() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();

        entity.bind(&node).await.unwrap();

        let discovery = "homeassistant/switch/boiler1/relay1/config".to_string();
        let calls = client.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::AddHandler("boiler1/relay1/command".to_string()));
        assert_eq!(calls[1], Call::Subscribe("boiler1/relay1/command".to_string()));
        assert!(matches!(
            &calls[2],
            Call::Publish { topic, qos: Qos::AtLeastOnce, retain: false, .. } if *topic == discovery
        ));
        assert_eq!(
            calls[3],
            Call::Publish {
                topic: "boiler1/relay1/state".to_string(),
                payload: b"OFF".to_vec(),
                qos: Qos::AtMostOnce,
                retain: false,
            }
        );
    }

    #[tokio::test]
    async fn test_discovery_payload_contents() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();

        entity.bind(&node).await.unwrap();

        let payloads = client.published_to("homeassistant/switch/boiler1/relay1/config");
        let json: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(json["unique_id"], "boiler1_relay1");
        assert_eq!(json["object_id"], "boiler1_relay1");
        assert_eq!(json["state_topic"], "boiler1/relay1/state");
        assert_eq!(json["command_topic"], "boiler1/relay1/command");
        assert_eq!(json["device"]["manufacturer"], "Protherm");
        assert_eq!(json["payload_on"], "ON");
        assert!(json.get("discovery_class").is_none());
        assert!(json.get("state_on").is_none());
    }

    #[tokio::test]
    async fn test_actuator_subscribed_after_bind() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();

        entity.bind(&node).await.unwrap();

        assert_eq!(entity.model().command_topic(), Some("boiler1/relay1/command"));
        assert_eq!(client.subscriptions(), vec!["boiler1/relay1/command".to_string()]);
        assert!(client.has_handler("boiler1/relay1/command"));
    }

    #[tokio::test]
    async fn test_bind_unbind_restores_entity() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();
        entity.update_model(|model| model.icon = Some("mdi:boom-gate-up".to_string()));
        let before = entity.model();

        entity.bind(&node).await.unwrap();
        assert_ne!(entity.model(), before);
        entity.unbind().await.unwrap();

        assert_eq!(entity.model(), before);
        assert_eq!(entity.id(), "relay1");
        assert!(!entity.is_bound());
        assert!(entity.discovery_topic().is_none());
        assert!(client.subscriptions().is_empty());
        assert!(!client.has_handler("boiler1/relay1/command"));
    }

    #[tokio::test]
    async fn test_unbind_order_is_discovery_then_unsubscribe() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();
        entity.bind(&node).await.unwrap();
        client.clear_calls();

        entity.unbind().await.unwrap();

        assert_eq!(
            client.calls(),
            vec![
                Call::Publish {
                    topic: "homeassistant/switch/boiler1/relay1/config".to_string(),
                    payload: Vec::new(),
                    qos: Qos::AtLeastOnce,
                    retain: false,
                },
                Call::Unsubscribe("boiler1/relay1/command".to_string()),
                Call::RemoveHandler("boiler1/relay1/command".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unbind_when_unbound_fails() {
        let entity = temperature();
        let err = entity.unbind().await.unwrap_err();
        assert!(matches!(err, Error::NotBound { entity_id } if entity_id == "temp"));
    }

    #[tokio::test]
    async fn test_operations_require_binding() {
        let entity = temperature();
        assert!(matches!(entity.subscribe().await, Err(Error::NotBound { .. })));
        assert!(matches!(entity.unsubscribe().await, Err(Error::NotBound { .. })));
        assert!(matches!(entity.publish_state().await, Err(Error::NotBound { .. })));
        assert!(matches!(entity.publish_discovery().await, Err(Error::NotBound { .. })));
        assert!(matches!(
            entity.unpublish_discovery().await,
            Err(Error::NotBound { .. })
        ));
        // Reading state does not need a binding.
        assert_eq!(entity.get_state().unwrap(), "21.5");
    }

    #[tokio::test]
    async fn test_rebind_same_node_is_noop() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let entity = temperature();
        entity.bind(&node).await.unwrap();
        client.clear_calls();

        entity.bind(&node).await.unwrap();

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bind_other_node_fails() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let other = Node::with_options(
            "boiler2",
            client.clone(),
            DeviceInfo::default(),
            NodeOptions::default(),
        );
        let entity = temperature();
        entity.bind(&node).await.unwrap();

        let err = entity.bind(&other).await.unwrap_err();

        assert!(matches!(
            err,
            Error::AlreadyBound { entity_id, node_id } if entity_id == "temp" && node_id == "boiler1"
        ));
        assert_eq!(entity.bound_node_id().as_deref(), Some("boiler1"));
    }

    #[tokio::test]
    async fn test_on_command_switches_state_and_publishes_once() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, toggle) = relay();
        entity.bind(&node).await.unwrap();
        client.clear_calls();

        assert!(client.deliver("boiler1/relay1/command", b"ON").await);

        assert!(toggle.is_on());
        assert_eq!(entity.get_state().unwrap(), "ON");
        assert_eq!(client.published_to("boiler1/relay1/state"), vec![b"ON".to_vec()]);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_command_still_publishes() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, toggle) = relay();
        entity.bind(&node).await.unwrap();
        client.deliver("boiler1/relay1/command", b"ON").await;
        client.clear_calls();

        client.deliver("boiler1/relay1/command", b"on").await;

        assert!(!toggle.is_on());
        assert_eq!(client.published_to("boiler1/relay1/state"), vec![b"OFF".to_vec()]);
    }

    #[tokio::test]
    async fn test_command_after_unbind_is_dropped() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, toggle) = relay();
        entity.bind(&node).await.unwrap();

        // Keep a handler around as a transport might after a failed removal.
        let stale = CommandHandler {
            entity: Arc::downgrade(&entity.inner),
        };
        entity.unbind().await.unwrap();
        client.clear_calls();

        stale
            .handle(MqttMessage {
                topic: "boiler1/relay1/command".to_string(),
                payload: b"ON".to_vec(),
                retain: false,
            })
            .await;

        assert!(!toggle.is_on());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_state_fails_bind_after_discovery() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let entity = Entity::new("inert", EntityModel::new(SensorModel::default()), Arc::new(Inert));

        let err = entity.bind(&node).await.unwrap_err();

        assert!(matches!(err, Error::NotImplemented("state")));
        assert!(entity.is_bound());
        assert_eq!(
            client
                .published_to("homeassistant/sensor/boiler1/inert/config")
                .len(),
            1
        );
        assert!(matches!(entity.get_state(), Err(Error::NotImplemented(_))));
    }

    #[tokio::test]
    async fn test_update_model_keeps_linkage() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let (entity, _) = relay();
        entity.bind(&node).await.unwrap();

        entity.update_model(|model| {
            model.name = Some("Gate".to_string());
            model.unique_id = None;
            model.kind.set_command_topic(Some("elsewhere".to_string()));
        });

        let model = entity.model();
        assert_eq!(model.name.as_deref(), Some("Gate"));
        assert_eq!(model.unique_id.as_deref(), Some("boiler1_relay1"));
        assert_eq!(model.command_topic(), Some("boiler1/relay1/command"));
    }

    #[tokio::test]
    async fn test_state_encoding_failure() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let entity = temperature();
        entity.update_model(|model| model.encoding = "utf-16".to_string());

        let err = entity.bind(&node).await.unwrap_err();

        assert!(matches!(err, Error::UnsupportedEncoding(_)));
    }

    #[tokio::test]
    async fn test_unsubscribe_failure_still_drops_every_topic() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let entity = Entity::new("dual", EntityModel::new(SensorModel::default()), Arc::new(Dual));
        entity.bind(&node).await.unwrap();
        client.fail_unsubscribe_from("boiler1/dual/a");
        client.clear_calls();

        let err = entity.unbind().await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(client.calls().contains(&Call::Unsubscribe("boiler1/dual/b".to_string())));
        assert!(!client.has_handler("boiler1/dual/a"));
        assert!(!client.has_handler("boiler1/dual/b"));
        // The broker kept the first subscription; nothing routes to it.
        assert_eq!(client.subscriptions(), vec!["boiler1/dual/a".to_string()]);
        assert!(!entity.is_bound());
    }

    #[tokio::test]
    async fn test_state_read_may_inspect_own_entity() {
        let client = MockMqttClient::new();
        let node = boiler(&client);
        let slot: Arc<OnceLock<Entity>> = Arc::new(OnceLock::new());
        let reader = slot.clone();
        let entity = Entity::new(
            "label",
            EntityModel::new(SensorModel::default()).with_name("Hall"),
            Arc::new(Probe::new(move || {
                let entity = reader.get().ok_or("entity not set")?;
                Ok(entity.model().name.unwrap_or_default())
            })),
        );
        let _ = slot.set(entity.clone());

        entity.bind(&node).await.unwrap();
        entity.publish_state().await.unwrap();

        assert_eq!(entity.get_state().unwrap(), "Hall");
        assert_eq!(
            client.published_to("boiler1/label/state"),
            vec![b"Hall".to_vec(), b"Hall".to_vec()]
        );
    }
}
