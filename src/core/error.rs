use thiserror::Error;

use crate::core::types::EdgeId;

/// Hard failures. Soft not-applicable conditions are reported in-band and
/// never surface through this type.
#[derive(Error, Debug)]
pub enum FrontError {
    #[error("Malformed edge id {id:?}: {reason}")]
    MalformedEdgeId { id: String, reason: &'static str },

    #[error("Edge id {id:?} is not canonical (expected a < b)")]
    NonCanonicalEdgeId { id: String },

    #[error("Invalid settlement id {id:?}: {reason}")]
    InvalidSettlementId { id: String, reason: &'static str },

    #[error("Pressure edge {edge_id} references settlements outside the graph namespace")]
    NamespaceMismatch { edge_id: EdgeId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FrontError>;
