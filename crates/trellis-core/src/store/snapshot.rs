//! JSON snapshot of a whole graph.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::index::{EntityRow, GraphIndex};
use crate::error::{GraphError, Result};
use crate::ontology::GraphNode;

/// Entity rows (parents first) plus evidence records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSnapshot {
    pub rows: Vec<EntityRow>,
    pub evidence: Vec<GraphNode>,
}

impl GraphSnapshot {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphError::BackendUnavailable(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            GraphError::BackendUnavailable(format!("cannot write snapshot {}: {}", path.display(), e))
        })
    }

    /// Build an index, skipping evidence kinds this build does not know.
    pub fn into_index(self) -> Result<GraphIndex> {
        let mut index = GraphIndex::new();
        for row in self.rows {
            index.insert_row(row)?;
        }
        for node in self.evidence {
            if node.edge_kind().is_none() {
                tracing::debug!(node_type = node.type_name(), "skipping non-evidence snapshot record");
                continue;
            }
            index.insert_evidence(node)?;
        }
        Ok(index)
    }

    pub fn from_index(index: &GraphIndex) -> Self {
        Self {
            rows: index.rows().cloned().collect(),
            evidence: index.evidence_records().cloned().collect(),
        }
    }
}
