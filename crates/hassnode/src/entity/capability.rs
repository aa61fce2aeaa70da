use crate::model::EntityModel;
use crate::Error;

/// Identity of the node an entity is being bound to.
#[derive(Debug, Clone, Copy)]
pub struct BindContext<'a> {
    pub node_id: &'a str,
    pub entity_id: &'a str,
}

/// Behaviour behind an entity: how it reads its state and reacts to commands.
///
/// The binding lifecycle itself (linkage fields, subscriptions, discovery)
/// is run by [`Entity`](super::Entity); implementations only supply the
/// kind-specific pieces through these hooks. All hooks except `state` are
/// called with the entity's model locked and must not block.
pub trait Capability: Send + Sync {
    /// Current state as published to the state topic.
    ///
    /// Called on a snapshot of the model with no lock held, possibly from a
    /// runtime worker thread.
    fn state(&self, _model: &EntityModel) -> Result<String, Error> {
        Err(Error::NotImplemented("state"))
    }

    /// Derive kind-specific fields after the common linkage has been set and
    /// before anything is subscribed or published.
    fn on_bind(&self, _ctx: &BindContext<'_>, _model: &mut EntityModel) {}

    /// Clear whatever `on_bind` derived.
    fn on_unbind(&self, _model: &mut EntityModel) {}

    /// Topics to subscribe to while bound. Messages on them are passed to
    /// `on_command`.
    fn command_topics(&self, _model: &EntityModel) -> Vec<String> {
        Vec::new()
    }

    /// Apply a decoded command payload. State is published afterwards
    /// whatever the payload was.
    fn on_command(&self, _model: &EntityModel, _topic: &str, _payload: &str) {}
}
