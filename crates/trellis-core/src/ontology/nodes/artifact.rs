//! Flat nodes: artifacts and builders.

use serde::{Deserialize, Serialize};

use crate::ontology::NodeId;

/// A content-addressed artifact. Algorithm and digest are stored lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: NodeId,
    pub algorithm: String,
    pub digest: String,
}

impl Artifact {
    pub fn new(id: impl Into<NodeId>, algorithm: &str, digest: &str) -> Self {
        Self {
            id: id.into(),
            algorithm: algorithm.to_lowercase(),
            digest: digest.to_lowercase(),
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

/// The entity that produced an artifact, identified by URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    pub id: NodeId,
    pub uri: String,
}
