//! In-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::index::{EntityRow, GraphIndex};
use super::snapshot::GraphSnapshot;
use super::GraphBackend;
use crate::error::{GraphError, Result};
use crate::identity::{PackageCoordinate, SourceCoordinate};
use crate::ontology::{
    Artifact, Builder, EdgeFilter, GraphNode, IsDependency, License, NodeId, Package, Source,
    Vulnerability, VulnerabilityType,
};
use crate::spec::{
    ArtifactSpec, BuilderSpec, EvidenceSpec, IsDependencySpec, LicenseSpec, PkgSpec, SourceSpec,
    VulnerabilitySpec,
};

#[derive(Default)]
struct MemoryState {
    index: GraphIndex,
    next_id: u64,
    /// Canonical evidence content (id blanked) → assigned id.
    evidence_keys: HashMap<String, NodeId>,
}

impl MemoryState {
    fn fresh_id(&mut self) -> NodeId {
        loop {
            self.next_id += 1;
            let id = NodeId::new(self.next_id.to_string());
            if !self.index.contains(&id) {
                return id;
            }
        }
    }

    fn insert(&mut self, row: EntityRow) -> Result<NodeId> {
        let id = row.id().clone();
        self.index.insert_row(row)?;
        Ok(id)
    }
}

/// Graph held entirely in memory.
///
/// Used for tests, for the CLI `--snapshot` mode, and as the staging area
/// when importing a snapshot into SurrealDB.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let index = snapshot.into_index()?;
        let mut evidence_keys = HashMap::new();
        for node in index.evidence_records() {
            if let Some(id) = node.id() {
                evidence_keys.insert(evidence_key(node)?, id.clone());
            }
        }
        tracing::info!(
            entities = index.entity_count(),
            evidence = index.evidence_count(),
            "loaded graph snapshot"
        );
        Ok(Self {
            state: RwLock::new(MemoryState {
                index,
                next_id: 0,
                evidence_keys,
            }),
        })
    }

    pub async fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from_index(&self.state.read().await.index)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Upsert every level of a package coordinate. Returns the trimmed tree
    /// ending at the version node (version `""` when the coordinate has none).
    pub async fn ingest_package(&self, coord: &PackageCoordinate) -> Result<Package> {
        let mut state = self.state.write().await;

        let type_id = match state.index.find_root(|row| {
            matches!(row, EntityRow::PackageType { pkg_type, .. } if *pkg_type == coord.pkg_type)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::PackageType {
                    id,
                    pkg_type: coord.pkg_type.clone(),
                })?
            }
        };

        let ns_id = match state.index.find_child(&type_id, |row| {
            matches!(row, EntityRow::PackageNamespace { namespace, .. } if *namespace == coord.namespace)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::PackageNamespace {
                    id,
                    parent: type_id,
                    namespace: coord.namespace.clone(),
                })?
            }
        };

        let name_id = match state.index.find_child(&ns_id, |row| {
            matches!(row, EntityRow::PackageName { name, .. } if *name == coord.name)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::PackageName {
                    id,
                    parent: ns_id,
                    name: coord.name.clone(),
                })?
            }
        };

        let version = coord.version.clone().unwrap_or_default();
        let subpath = coord.subpath.clone().unwrap_or_default();
        let version_id = match state.index.find_child(&name_id, |row| {
            matches!(row, EntityRow::PackageVersion { version: v, subpath: s, qualifiers: q, .. }
                if *v == version && *s == subpath && *q == coord.qualifiers)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::PackageVersion {
                    id,
                    parent: name_id,
                    version,
                    subpath,
                    qualifiers: coord.qualifiers.clone(),
                })?
            }
        };

        state
            .index
            .build_packages(std::slice::from_ref(&version_id))
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::NotFound(format!("package {}", version_id)))
    }

    /// Upsert every level of a source coordinate.
    pub async fn ingest_source(&self, coord: &SourceCoordinate) -> Result<Source> {
        let mut state = self.state.write().await;

        let type_id = match state.index.find_root(|row| {
            matches!(row, EntityRow::SourceType { src_type, .. } if *src_type == coord.src_type)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::SourceType {
                    id,
                    src_type: coord.src_type.clone(),
                })?
            }
        };

        let ns_id = match state.index.find_child(&type_id, |row| {
            matches!(row, EntityRow::SourceNamespace { namespace, .. } if *namespace == coord.namespace)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::SourceNamespace {
                    id,
                    parent: type_id,
                    namespace: coord.namespace.clone(),
                })?
            }
        };

        let name_id = match state.index.find_child(&ns_id, |row| {
            matches!(row, EntityRow::SourceName { name, tag, commit, .. }
                if *name == coord.name && *tag == coord.tag && *commit == coord.commit)
        }) {
            Some(id) => id,
            None => {
                let id = state.fresh_id();
                state.insert(EntityRow::SourceName {
                    id,
                    parent: ns_id,
                    name: coord.name.clone(),
                    tag: coord.tag.clone(),
                    commit: coord.commit.clone(),
                })?
            }
        };

        state
            .index
            .build_sources(std::slice::from_ref(&name_id))
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::NotFound(format!("source {}", name_id)))
    }

    pub async fn ingest_artifact(&self, algorithm: &str, digest: &str) -> Result<Artifact> {
        let mut state = self.state.write().await;
        let normalized = Artifact::new(NodeId::default(), algorithm, digest);
        if let Some(EntityRow::Artifact(existing)) = state
            .index
            .find_root(|row| {
                matches!(row, EntityRow::Artifact(a)
                    if a.algorithm == normalized.algorithm && a.digest == normalized.digest)
            })
            .and_then(|id| state.index.row(&id).cloned())
        {
            return Ok(existing);
        }
        let artifact = Artifact {
            id: state.fresh_id(),
            ..normalized
        };
        state.insert(EntityRow::Artifact(artifact.clone()))?;
        Ok(artifact)
    }

    pub async fn ingest_builder(&self, uri: &str) -> Result<Builder> {
        let mut state = self.state.write().await;
        if let Some(EntityRow::Builder(existing)) = state
            .index
            .find_root(|row| matches!(row, EntityRow::Builder(b) if b.uri == uri))
            .and_then(|id| state.index.row(&id).cloned())
        {
            return Ok(existing);
        }
        let builder = Builder {
            id: state.fresh_id(),
            uri: uri.to_string(),
        };
        state.insert(EntityRow::Builder(builder.clone()))?;
        Ok(builder)
    }

    pub async fn ingest_vulnerability(
        &self,
        vuln_type: VulnerabilityType,
        vulnerability_id: &str,
    ) -> Result<Vulnerability> {
        let mut state = self.state.write().await;
        let normalized = Vulnerability::new(NodeId::default(), vuln_type, vulnerability_id);
        if let Some(EntityRow::Vulnerability(existing)) = state
            .index
            .find_root(|row| {
                matches!(row, EntityRow::Vulnerability(v)
                    if v.vuln_type == normalized.vuln_type && v.vulnerability_id == normalized.vulnerability_id)
            })
            .and_then(|id| state.index.row(&id).cloned())
        {
            return Ok(existing);
        }
        let vuln = Vulnerability {
            id: state.fresh_id(),
            ..normalized
        };
        state.insert(EntityRow::Vulnerability(vuln.clone()))?;
        Ok(vuln)
    }

    pub async fn ingest_license(
        &self,
        name: &str,
        inline: Option<&str>,
        list_version: Option<&str>,
    ) -> Result<License> {
        let mut state = self.state.write().await;
        let inline = inline.map(str::to_string);
        let list_version = list_version.map(str::to_string);
        if let Some(EntityRow::License(existing)) = state
            .index
            .find_root(|row| {
                matches!(row, EntityRow::License(l)
                    if l.name == name && l.inline == inline && l.list_version == list_version)
            })
            .and_then(|id| state.index.row(&id).cloned())
        {
            return Ok(existing);
        }
        let license = License {
            id: state.fresh_id(),
            name: name.to_string(),
            inline,
            list_version,
        };
        state.insert(EntityRow::License(license.clone()))?;
        Ok(license)
    }

    /// Upsert an evidence record; any id it carries is replaced.
    ///
    /// Ingesting the same content twice returns the record stored first.
    pub async fn ingest_evidence(&self, record: impl Into<GraphNode>) -> Result<GraphNode> {
        let mut node = record.into();
        if node.edge_kind().is_none() {
            return Err(GraphError::BackendUnavailable(format!(
                "{} is not an evidence record",
                node.type_name()
            )));
        }
        let key = evidence_key(&node)?;

        let mut state = self.state.write().await;
        if let Some(existing) = state
            .evidence_keys
            .get(&key)
            .and_then(|id| state.index.node(id))
        {
            return Ok(existing);
        }

        let id = state.fresh_id();
        node.set_evidence_id(id.clone());
        state.index.insert_evidence(node.clone())?;
        state.evidence_keys.insert(key, id);
        Ok(node)
    }
}

/// Identity of an evidence record's content: kind, sorted subject ids and
/// the remaining attributes. The record id is ignored and equality
/// subjects are taken as an unordered pair.
fn evidence_key(node: &GraphNode) -> Result<String> {
    let mut attributes = node.clone();
    attributes.set_evidence_id(NodeId::default());
    match &mut attributes {
        GraphNode::HashEqual(e) => e.artifacts.sort_by(|a, b| a.id.cmp(&b.id)),
        GraphNode::PkgEqual(e) => e.packages.sort_by(|a, b| a.leaf_id().cmp(b.leaf_id())),
        _ => {}
    }

    let mut subjects = node.subject_ids();
    subjects.sort();
    let kind = node.edge_kind().map(|k| k.type_name()).unwrap_or_default();

    Ok(serde_json::to_string(&(kind, subjects, attributes))?)
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn packages(&self, spec: &PkgSpec) -> Result<Vec<Package>> {
        Ok(self.state.read().await.index.packages(spec))
    }

    async fn sources(&self, spec: &SourceSpec) -> Result<Vec<Source>> {
        Ok(self.state.read().await.index.sources(spec))
    }

    async fn artifacts(&self, spec: &ArtifactSpec) -> Result<Vec<Artifact>> {
        Ok(self.state.read().await.index.artifacts(spec))
    }

    async fn builders(&self, spec: &BuilderSpec) -> Result<Vec<Builder>> {
        Ok(self.state.read().await.index.builders(spec))
    }

    async fn vulnerabilities(&self, spec: &VulnerabilitySpec) -> Result<Vec<Vulnerability>> {
        Ok(self.state.read().await.index.vulnerabilities(spec))
    }

    async fn licenses(&self, spec: &LicenseSpec) -> Result<Vec<License>> {
        Ok(self.state.read().await.index.licenses(spec))
    }

    async fn evidence(&self, spec: &EvidenceSpec) -> Result<Vec<GraphNode>> {
        Ok(self.state.read().await.index.evidence(spec))
    }

    async fn dependencies(&self, spec: &IsDependencySpec) -> Result<Vec<IsDependency>> {
        Ok(self.state.read().await.index.dependencies(spec))
    }

    async fn node(&self, id: &NodeId) -> Result<GraphNode> {
        self.state
            .read()
            .await
            .index
            .node(id)
            .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))
    }

    async fn adjacent(&self, id: &NodeId, filter: &EdgeFilter) -> Result<Vec<GraphNode>> {
        tracing::trace!(%id, "memory adjacent");
        self.state.read().await.index.adjacent(id, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{HashEqual, PkgEqual};

    #[tokio::test]
    async fn test_ingest_package_is_idempotent() {
        let backend = MemoryBackend::new();
        let coord = PackageCoordinate::parse("pkg:npm/lodash@4.17.21").unwrap();
        let first = backend.ingest_package(&coord).await.unwrap();
        let second = backend.ingest_package(&coord).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.snapshot().await.rows.len(), 4);
    }

    #[tokio::test]
    async fn test_ingest_evidence_is_idempotent() {
        let backend = MemoryBackend::new();
        let a = backend.ingest_artifact("sha256", "aa").await.unwrap();
        let b = backend.ingest_artifact("sha256", "bb").await.unwrap();
        let record = HashEqual {
            artifacts: vec![a, b],
            justification: "same build".to_string(),
            ..Default::default()
        };
        let first = backend.ingest_evidence(record.clone()).await.unwrap();
        let second = backend.ingest_evidence(record).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(backend.snapshot().await.evidence.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_equality_ignores_subject_order() {
        let backend = MemoryBackend::new();
        let a = backend.ingest_artifact("sha256", "aa").await.unwrap();
        let b = backend.ingest_artifact("sha256", "bb").await.unwrap();
        let forward = HashEqual {
            artifacts: vec![a.clone(), b.clone()],
            justification: "rebuilt".to_string(),
            ..Default::default()
        };
        let reverse = HashEqual {
            artifacts: vec![b, a],
            justification: "rebuilt".to_string(),
            ..Default::default()
        };
        let first = backend.ingest_evidence(forward).await.unwrap();
        let second = backend.ingest_evidence(reverse).await.unwrap();
        assert_eq!(first.id(), second.id());

        let p = backend
            .ingest_package(&PackageCoordinate::parse("pkg:npm/left-pad@1.3.0").unwrap())
            .await
            .unwrap();
        let q = backend
            .ingest_package(&PackageCoordinate::parse("pkg:npm/leftpad@1.3.0").unwrap())
            .await
            .unwrap();
        let pq = backend
            .ingest_evidence(PkgEqual {
                packages: vec![p.clone(), q.clone()],
                ..Default::default()
            })
            .await
            .unwrap();
        let qp = backend
            .ingest_evidence(PkgEqual {
                packages: vec![q, p],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pq.id(), qp.id());
        assert_eq!(backend.snapshot().await.evidence.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_equality_keeps_distinct_justifications() {
        let backend = MemoryBackend::new();
        let a = backend.ingest_artifact("sha256", "aa").await.unwrap();
        let b = backend.ingest_artifact("sha256", "bb").await.unwrap();
        for justification in ["rebuilt", "mirrored"] {
            backend
                .ingest_evidence(HashEqual {
                    artifacts: vec![a.clone(), b.clone()],
                    justification: justification.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        assert_eq!(backend.snapshot().await.evidence.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_evidence_rejects_unknown_subject() {
        let backend = MemoryBackend::new();
        let record = HashEqual {
            artifacts: vec![
                Artifact::new("404", "sha256", "aa"),
                Artifact::new("405", "sha256", "bb"),
            ],
            ..Default::default()
        };
        let err = backend.ingest_evidence(record).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
