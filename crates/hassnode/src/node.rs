//! Nodes: the device an entity set is announced under.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use strum::IntoStaticStr;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::client::MqttClient;
use crate::entity::Entity;
use crate::model::DeviceInfo;
use crate::topics::DEFAULT_DISCOVERY_PREFIX;
use crate::Error;

/// Settings fixed when a node is created.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// First level of every discovery topic
    pub discovery_prefix: String,

    /// Whether discovery documents are published retained
    pub retain_discovery: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            discovery_prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            retain_discovery: false,
        }
    }
}

pub(crate) struct NodeShared {
    id: String,
    device: DeviceInfo,
    discovery_prefix: String,
    retain_discovery: AtomicBool,
    client: Arc<dyn MqttClient>,
    entities: Mutex<BTreeMap<String, Entity>>,
}

/// A device and the entities bound to it.
///
/// Clones share the same entity set. Dropping the last handle does not
/// unbind anything; call [`Node::shutdown`] to withdraw every entity from the
/// hub first.
#[derive(Clone)]
pub struct Node {
    shared: Arc<NodeShared>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.shared.id)
            .field("discovery_prefix", &self.shared.discovery_prefix)
            .finish_non_exhaustive()
    }
}

/// Names an entity to remove: by id or by handle.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Id(&'a str),
    Entity(&'a Entity),
}

impl<'a> From<&'a str> for EntityRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for EntityRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a Entity> for EntityRef<'a> {
    fn from(entity: &'a Entity) -> Self {
        Self::Entity(entity)
    }
}

impl EntityRef<'_> {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Entity(entity) => entity.id(),
        }
    }
}

/// Operations fanned out to every member by the `*_all` methods.
#[derive(Debug, Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum BulkOp {
    PublishStateAll,
    PublishDiscoveryAll,
    UnpublishDiscoveryAll,
    SubscribeAll,
    UnsubscribeAll,
}

impl BulkOp {
    async fn apply(self, entity: &Entity) -> Result<(), Error> {
        match self {
            Self::PublishStateAll => entity.publish_state().await,
            Self::PublishDiscoveryAll => entity.publish_discovery().await,
            Self::UnpublishDiscoveryAll => entity.unpublish_discovery().await,
            Self::SubscribeAll => entity.subscribe().await,
            Self::UnsubscribeAll => entity.unsubscribe().await,
        }
    }
}

/// Turn per-entity failures into a single result.
fn collect_failures(
    operation: &'static str,
    attempted: usize,
    failures: Vec<(String, Error)>,
) -> Result<(), Error> {
    if failures.is_empty() {
        return Ok(());
    }

    Err(Error::Bulk {
        operation,
        attempted,
        failures,
    })
}

impl Node {
    pub fn new(id: impl Into<String>, client: Arc<dyn MqttClient>, device: DeviceInfo) -> Self {
        Self::with_options(id, client, device, NodeOptions::default())
    }

    /// Create a node with explicit options.
    ///
    /// A device with neither identifiers nor connections is identified by
    /// the node id; the hub only groups entities under a device that has
    /// one of the two.
    pub fn with_options(
        id: impl Into<String>,
        client: Arc<dyn MqttClient>,
        mut device: DeviceInfo,
        options: NodeOptions,
    ) -> Self {
        let id = id.into();
        if device.identifiers.is_empty() && device.connections.is_empty() {
            device.identifiers.push(id.clone());
        }

        Self {
            shared: Arc::new(NodeShared {
                id,
                device,
                discovery_prefix: options.discovery_prefix,
                retain_discovery: AtomicBool::new(options.retain_discovery),
                client,
                entities: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Publish discovery documents retained, so the hub finds them after a
    /// restart without the node re-announcing. Applies to entities bound
    /// from now on.
    pub fn with_retained_discovery(self, retain: bool) -> Self {
        self.shared.retain_discovery.store(retain, Ordering::SeqCst);
        self
    }

    pub(crate) fn from_shared(shared: Arc<NodeShared>) -> Self {
        Self { shared }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.shared.device
    }

    pub fn discovery_prefix(&self) -> &str {
        &self.shared.discovery_prefix
    }

    pub(crate) fn retains_discovery(&self) -> bool {
        self.shared.retain_discovery.load(Ordering::SeqCst)
    }

    pub(crate) fn client(&self) -> Arc<dyn MqttClient> {
        self.shared.client.clone()
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeShared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn is_shared(&self, other: &Weak<NodeShared>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.shared), other.as_ptr())
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Make `entity` a member of this node and announce it.
    ///
    /// An entity bound to another node is removed from that node first. If
    /// announcing fails the entity stays a member, bound, and the error is
    /// returned; remove it to withdraw whatever was published.
    ///
    /// When another node adopts the entity while this one waits for its
    /// member lock, the other node wins: this fails with
    /// [`Error::AlreadyBound`] and the member set is left unchanged.
    pub async fn add_entity(&self, entity: &Entity) -> Result<(), Error> {
        if let Some(owner) = entity.bound_node() {
            if owner.ptr_eq(self) {
                debug!("Entity {} already belongs to node {}", entity.id(), self.id());
                return Ok(());
            }
            info!(
                "Moving entity {} from node {} to node {}",
                entity.id(),
                owner.id(),
                self.id()
            );
            owner.remove_entity(entity).await?;
        } else if entity.is_bound() {
            // Its node is gone without a shutdown.
            entity.unbind().await?;
        }

        let mut entities = self.shared.entities.lock().await;
        if entities
            .get(entity.id())
            .is_some_and(|member| member.ptr_eq(entity))
        {
            return Ok(());
        }
        if let Some(node_id) = entity.bound_node_id() {
            return Err(Error::AlreadyBound {
                entity_id: entity.id().to_string(),
                node_id,
            });
        }
        if entities.contains_key(entity.id()) {
            return Err(Error::DuplicateId {
                node_id: self.id().to_string(),
                entity_id: entity.id().to_string(),
            });
        }

        entities.insert(entity.id().to_string(), entity.clone());
        let result = entity.bind(self).await;
        if let Err(Error::AlreadyBound { node_id, .. }) = &result {
            debug!(
                "Entity {} was taken by node {} before node {} could bind it",
                entity.id(),
                node_id,
                self.id()
            );
            entities.remove(entity.id());
        }

        result
    }

    /// Withdraw an entity from the hub and drop it from this node.
    ///
    /// Returns the detached entity. If the transport fails the entity is
    /// still detached and removed, and the error is returned.
    pub async fn remove_entity<'a>(&self, entity: impl Into<EntityRef<'a>>) -> Result<Entity, Error> {
        let entity_ref = entity.into();
        let mut entities = self.shared.entities.lock().await;

        let member = entities
            .get(entity_ref.id())
            .filter(|member| match entity_ref {
                EntityRef::Id(_) => true,
                EntityRef::Entity(entity) => member.ptr_eq(entity),
            })
            .cloned()
            .ok_or_else(|| Error::NotFound {
                node_id: self.id().to_string(),
                entity_id: entity_ref.id().to_string(),
            })?;

        let result = member.unbind().await;
        entities.remove(member.id());

        result.map(|()| member)
    }

    /// Move the entity with `id` to another node.
    ///
    /// Fails without touching either node if `to` already has an entity
    /// with that id.
    pub async fn transfer_entity(&self, id: &str, to: &Node) -> Result<(), Error> {
        if to.ptr_eq(self) {
            return match self.entity(id).await {
                Some(_) => Ok(()),
                None => Err(self.not_found(id)),
            };
        }

        if to.entity(id).await.is_some() {
            return Err(Error::DuplicateId {
                node_id: to.id().to_string(),
                entity_id: id.to_string(),
            });
        }

        let entity = self.remove_entity(id).await?;
        to.add_entity(&entity).await
    }

    fn not_found(&self, id: &str) -> Error {
        Error::NotFound {
            node_id: self.id().to_string(),
            entity_id: id.to_string(),
        }
    }

    pub async fn entity(&self, id: &str) -> Option<Entity> {
        self.shared.entities.lock().await.get(id).cloned()
    }

    /// Member ids in iteration order.
    pub async fn entity_ids(&self) -> Vec<String> {
        self.shared.entities.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.shared.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shared.entities.lock().await.is_empty()
    }

    /// Current state of one member.
    pub async fn state(&self, id: &str) -> Result<String, Error> {
        let entity = self.entity(id).await.ok_or_else(|| self.not_found(id))?;
        entity.get_state()
    }

    /// Publish the state of one member.
    pub async fn publish_state(&self, id: &str) -> Result<(), Error> {
        let entity = self.entity(id).await.ok_or_else(|| self.not_found(id))?;
        entity.publish_state().await
    }

    async fn run_bulk(&self, op: BulkOp) -> Result<(), Error> {
        let operation: &'static str = op.into();
        let entities = self.shared.entities.lock().await;

        let mut failures = Vec::new();
        for (id, entity) in entities.iter() {
            if let Err(e) = op.apply(entity).await {
                warn!("{} failed for entity {} on node {}: {}", operation, id, self.id(), e);
                failures.push((id.clone(), e));
            }
        }

        collect_failures(operation, entities.len(), failures)
    }

    pub async fn publish_state_all(&self) -> Result<(), Error> {
        self.run_bulk(BulkOp::PublishStateAll).await
    }

    pub async fn publish_discovery_all(&self) -> Result<(), Error> {
        self.run_bulk(BulkOp::PublishDiscoveryAll).await
    }

    pub async fn unpublish_discovery_all(&self) -> Result<(), Error> {
        self.run_bulk(BulkOp::UnpublishDiscoveryAll).await
    }

    pub async fn subscribe_all(&self) -> Result<(), Error> {
        self.run_bulk(BulkOp::SubscribeAll).await
    }

    pub async fn unsubscribe_all(&self) -> Result<(), Error> {
        self.run_bulk(BulkOp::UnsubscribeAll).await
    }

    /// Unbind and remove every member.
    ///
    /// Every member ends up detached even when the transport fails; the
    /// failures are reported together.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let mut entities = self.shared.entities.lock().await;
        let attempted = entities.len();
        info!("Shutting down node {} with {} entities", self.id(), attempted);

        let mut failures = Vec::new();
        for (id, entity) in std::mem::take(&mut *entities) {
            if let Err(e) = entity.unbind().await {
                warn!("Failed to unbind entity {} from node {}: {}", id, self.id(), e);
                failures.push((id, e));
            }
        }

        collect_failures("shutdown", attempted, failures)
    }
}
