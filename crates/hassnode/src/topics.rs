//! Topic naming for discovery, state and command traffic.
//!
//! Discovery: `{prefix}/{class}/{node_id}/{entity_id}/config`
//! State:     `{node_id}/{entity_id}/state`
//! Command:   `{node_id}/{entity_id}/command`

pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Identifier the hub uses to track the entity across restarts.
pub fn unique_id(node_id: &str, entity_id: &str) -> String {
    format!("{}_{}", node_id, entity_id)
}

pub fn state_topic(node_id: &str, entity_id: &str) -> String {
    format!("{}/{}/state", node_id, entity_id)
}

pub fn command_topic(node_id: &str, entity_id: &str) -> String {
    format!("{}/{}/command", node_id, entity_id)
}

pub fn discovery_topic(prefix: &str, class: &str, node_id: &str, entity_id: &str) -> String {
    format!("{}/{}/{}/{}/config", prefix, class, node_id, entity_id)
}

/// Check that `segment` can be used as a single topic level.
///
/// Node and entity ids are embedded in topics, so they must be non-empty and
/// free of level separators and wildcards.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '+', '#']) && !segment.contains(char::is_whitespace)
}
