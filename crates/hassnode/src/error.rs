use crate::client::ClientError;

/// Errors produced by entity and node operations.
///
/// `NotBound`, `AlreadyBound`, `DuplicateId` and `NotFound` are structural:
/// they indicate a misuse of the binding lifecycle and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("entity '{entity_id}' is not bound to a node")]
    NotBound { entity_id: String },

    #[error("entity '{entity_id}' is already bound to node '{node_id}'")]
    AlreadyBound { entity_id: String, node_id: String },

    #[error("node '{node_id}' already has an entity with id '{entity_id}'")]
    DuplicateId { node_id: String, entity_id: String },

    #[error("node '{node_id}' has no entity '{entity_id}'")]
    NotFound { node_id: String, entity_id: String },

    /// A capability was asked for something it does not provide.
    #[error("'{0}' is not implemented for this entity")]
    NotImplemented(&'static str),

    #[error("transport error")]
    Transport(#[from] ClientError),

    #[error("failed to serialize discovery payload")]
    Payload(#[source] serde_json::Error),

    #[error("unsupported payload encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The capability failed to produce a reading.
    #[error("failed to read entity state")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Per-entity failures collected by a bulk node operation.
    #[error("{operation}: {} of {attempted} entities failed", failures.len())]
    Bulk {
        operation: &'static str,
        attempted: usize,
        failures: Vec<(String, Error)>,
    },
}

impl Error {
    /// True for lifecycle misuse, as opposed to transport or payload failures.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NotBound { .. }
                | Self::AlreadyBound { .. }
                | Self::DuplicateId { .. }
                | Self::NotFound { .. }
        )
    }
}
