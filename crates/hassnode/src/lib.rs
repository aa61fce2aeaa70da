//! Announce a device and its entities to Home Assistant over MQTT discovery.
//!
//! A [`Node`] owns a transport handle and a set of [`Entity`] members. Adding
//! an entity binds it: its identity and topics are derived from the node,
//! its command topics are subscribed, and its discovery document and current
//! state are published. Removing it reverses those steps.

pub mod client;
pub mod config;
pub mod entity;
mod error;
pub mod model;
pub mod node;
pub mod topics;

pub use client::ClientError;
pub use client::MqttClient;
pub use client::RumqttcClient;
pub use config::Config;
pub use config::LogLevel;
pub use entity::Capability;
pub use entity::Entity;
pub use entity::Gauge;
pub use entity::Level;
pub use entity::Probe;
pub use entity::Toggle;
pub use entity::UnrecognizedPayload;
pub use error::Error;
pub use node::EntityRef;
pub use node::Node;
pub use node::NodeOptions;
