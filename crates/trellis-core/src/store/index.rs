//! In-memory row index shared by the backends.
//!
//! Entities are stored as flat rows linked by `parent`; trimmed trees are
//! rebuilt on demand from a node's ancestry chain. Evidence records are kept
//! whole and indexed by the ids they are attached to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::ontology::{
    Artifact, Builder, EdgeFilter, EntityKind, GraphNode, IsDependency, License, NodeId, Package,
    PackageLeaf, PackageName, PackageNamespace, PackageQualifier, PackageVersion, Source,
    SourceLeaf, SourceName, SourceNamespace, Vulnerability,
};
use crate::spec::{
    ArtifactSpec, BuilderSpec, EvidenceSpec, IsDependencySpec, LicenseSpec, Matches, PkgSpec,
    SourceSpec, VulnerabilitySpec,
};

// =============================================================================
// ROWS
// =============================================================================

/// One stored entity node. Hierarchy levels point at their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "row_type", rename_all = "snake_case")]
pub enum EntityRow {
    PackageType {
        id: NodeId,
        pkg_type: String,
    },
    PackageNamespace {
        id: NodeId,
        parent: NodeId,
        namespace: String,
    },
    PackageName {
        id: NodeId,
        parent: NodeId,
        name: String,
    },
    PackageVersion {
        id: NodeId,
        parent: NodeId,
        version: String,
        subpath: String,
        qualifiers: Vec<PackageQualifier>,
    },
    SourceType {
        id: NodeId,
        src_type: String,
    },
    SourceNamespace {
        id: NodeId,
        parent: NodeId,
        namespace: String,
    },
    SourceName {
        id: NodeId,
        parent: NodeId,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
    },
    Artifact(Artifact),
    Builder(Builder),
    Vulnerability(Vulnerability),
    License(License),
}

impl EntityRow {
    pub fn id(&self) -> &NodeId {
        match self {
            Self::PackageType { id, .. }
            | Self::PackageNamespace { id, .. }
            | Self::PackageName { id, .. }
            | Self::PackageVersion { id, .. }
            | Self::SourceType { id, .. }
            | Self::SourceNamespace { id, .. }
            | Self::SourceName { id, .. } => id,
            Self::Artifact(a) => &a.id,
            Self::Builder(b) => &b.id,
            Self::Vulnerability(v) => &v.id,
            Self::License(l) => &l.id,
        }
    }

    pub fn parent(&self) -> Option<&NodeId> {
        match self {
            Self::PackageNamespace { parent, .. }
            | Self::PackageName { parent, .. }
            | Self::PackageVersion { parent, .. }
            | Self::SourceNamespace { parent, .. }
            | Self::SourceName { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::PackageType { .. }
            | Self::PackageNamespace { .. }
            | Self::PackageName { .. }
            | Self::PackageVersion { .. } => EntityKind::Package,
            Self::SourceType { .. } | Self::SourceNamespace { .. } | Self::SourceName { .. } => {
                EntityKind::Source
            }
            Self::Artifact(_) => EntityKind::Artifact,
            Self::Builder(_) => EntityKind::Builder,
            Self::Vulnerability(_) => EntityKind::Vulnerability,
            Self::License(_) => EntityKind::License,
        }
    }

    /// Storage discriminator, one per row variant.
    pub fn row_kind(&self) -> &'static str {
        match self {
            Self::PackageType { .. } => "package_type",
            Self::PackageNamespace { .. } => "package_namespace",
            Self::PackageName { .. } => "package_name",
            Self::PackageVersion { .. } => "package_version",
            Self::SourceType { .. } => "source_type",
            Self::SourceNamespace { .. } => "source_namespace",
            Self::SourceName { .. } => "source_name",
            Self::Artifact(_) => "artifact",
            Self::Builder(_) => "builder",
            Self::Vulnerability(_) => "vulnerability",
            Self::License(_) => "license",
        }
    }
}

/// Row discriminators belonging to one entity kind.
pub fn row_kinds_of(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Package => &[
            "package_type",
            "package_namespace",
            "package_name",
            "package_version",
        ],
        EntityKind::Source => &["source_type", "source_namespace", "source_name"],
        EntityKind::Artifact => &["artifact"],
        EntityKind::Builder => &["builder"],
        EntityKind::Vulnerability => &["vulnerability"],
        EntityKind::License => &["license"],
    }
}

// =============================================================================
// INDEX
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    rows: HashMap<NodeId, EntityRow>,
    row_order: Vec<NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    evidence: HashMap<NodeId, GraphNode>,
    evidence_order: Vec<NodeId>,
    /// Subject id → evidence ids, in insertion order.
    attached: HashMap<NodeId, Vec<NodeId>>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.rows.contains_key(id) || self.evidence.contains_key(id)
    }

    pub fn entity_count(&self) -> usize {
        self.rows.len()
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence.len()
    }

    /// Add an entity row. Parents must be inserted first; re-inserting an
    /// existing id is a no-op.
    pub fn insert_row(&mut self, row: EntityRow) -> Result<()> {
        let id = row.id().clone();
        if self.rows.contains_key(&id) {
            return Ok(());
        }
        if let Some(parent) = row.parent() {
            if !self.rows.contains_key(parent) {
                return Err(GraphError::NotFound(format!(
                    "parent {} of {} {}",
                    parent,
                    row.row_kind(),
                    id
                )));
            }
            self.children.entry(parent.clone()).or_default().push(id.clone());
        }
        self.rows.insert(id.clone(), row);
        self.row_order.push(id);
        Ok(())
    }

    /// Add an evidence record and attach it to each of its subjects.
    pub fn insert_evidence(&mut self, node: GraphNode) -> Result<()> {
        let Some(id) = node.id().cloned() else {
            return Ok(());
        };
        if node.edge_kind().is_none() {
            return Err(GraphError::BackendUnavailable(format!(
                "{} {} is not an evidence record",
                node.type_name(),
                id
            )));
        }
        if self.evidence.contains_key(&id) {
            return Ok(());
        }
        let subjects = node.subject_ids();
        if let Some(missing) = subjects.iter().find(|s| !self.rows.contains_key(*s)) {
            return Err(GraphError::NotFound(format!(
                "subject {} of {} {}",
                missing,
                node.type_name(),
                id
            )));
        }
        for subject in subjects {
            let attached = self.attached.entry(subject).or_default();
            if !attached.contains(&id) {
                attached.push(id.clone());
            }
        }
        self.evidence.insert(id.clone(), node);
        self.evidence_order.push(id);
        Ok(())
    }

    pub fn row(&self, id: &NodeId) -> Option<&EntityRow> {
        self.rows.get(id)
    }

    /// Rows in insertion order (parents before children).
    pub fn rows(&self) -> impl Iterator<Item = &EntityRow> {
        self.row_order.iter().filter_map(|id| self.rows.get(id))
    }

    /// Evidence records in insertion order.
    pub fn evidence_records(&self) -> impl Iterator<Item = &GraphNode> {
        self.evidence_order.iter().filter_map(|id| self.evidence.get(id))
    }

    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First child of `parent` satisfying `pred`.
    pub fn find_child(&self, parent: &NodeId, pred: impl Fn(&EntityRow) -> bool) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .find(|id| self.rows.get(*id).is_some_and(&pred))
            .cloned()
    }

    /// First parentless row satisfying `pred`.
    pub fn find_root(&self, pred: impl Fn(&EntityRow) -> bool) -> Option<NodeId> {
        self.rows()
            .find(|row| row.parent().is_none() && pred(row))
            .map(|row| row.id().clone())
    }

    /// Ancestry chain from `id` up to its root, `id` first.
    pub fn chain(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.rows.get(id);
        while let Some(row) = current {
            chain.push(row.id().clone());
            current = row.parent().and_then(|p| self.rows.get(p));
        }
        chain
    }

    // =========================================================================
    // Tree building
    // =========================================================================

    /// Trimmed package trees holding exactly the branches that end at the
    /// given ids. Branches sharing ancestors are merged.
    pub fn build_packages(&self, ids: &[NodeId]) -> Vec<Package> {
        let mut trees: Vec<Package> = Vec::new();
        for id in ids {
            let mut chain = self.chain(id);
            chain.reverse();
            let mut levels = chain.iter().filter_map(|id| self.rows.get(id));

            let Some(EntityRow::PackageType { id, pkg_type }) = levels.next() else {
                continue;
            };
            let tree = slot(&mut trees, id, |p| &p.id, || Package {
                id: id.clone(),
                pkg_type: pkg_type.clone(),
                namespaces: Vec::new(),
            });

            let Some(EntityRow::PackageNamespace { id, namespace, .. }) = levels.next() else {
                continue;
            };
            let ns = slot(&mut tree.namespaces, id, |n| &n.id, || PackageNamespace {
                id: id.clone(),
                namespace: namespace.clone(),
                names: Vec::new(),
            });

            let Some(EntityRow::PackageName { id, name, .. }) = levels.next() else {
                continue;
            };
            let name_node = slot(&mut ns.names, id, |n| &n.id, || PackageName {
                id: id.clone(),
                name: name.clone(),
                versions: Vec::new(),
            });

            let Some(EntityRow::PackageVersion {
                id,
                version,
                subpath,
                qualifiers,
                ..
            }) = levels.next()
            else {
                continue;
            };
            slot(&mut name_node.versions, id, |v| &v.id, || PackageVersion {
                id: id.clone(),
                version: version.clone(),
                subpath: subpath.clone(),
                qualifiers: qualifiers.clone(),
            });
        }
        trees
    }

    /// Trimmed source trees holding the branches that end at the given ids.
    pub fn build_sources(&self, ids: &[NodeId]) -> Vec<Source> {
        let mut trees: Vec<Source> = Vec::new();
        for id in ids {
            let mut chain = self.chain(id);
            chain.reverse();
            let mut levels = chain.iter().filter_map(|id| self.rows.get(id));

            let Some(EntityRow::SourceType { id, src_type }) = levels.next() else {
                continue;
            };
            let tree = slot(&mut trees, id, |s| &s.id, || Source {
                id: id.clone(),
                src_type: src_type.clone(),
                namespaces: Vec::new(),
            });

            let Some(EntityRow::SourceNamespace { id, namespace, .. }) = levels.next() else {
                continue;
            };
            let ns = slot(&mut tree.namespaces, id, |n| &n.id, || SourceNamespace {
                id: id.clone(),
                namespace: namespace.clone(),
                names: Vec::new(),
            });

            let Some(EntityRow::SourceName {
                id,
                name,
                tag,
                commit,
                ..
            }) = levels.next()
            else {
                continue;
            };
            slot(&mut ns.names, id, |n| &n.id, || SourceName {
                id: id.clone(),
                name: name.clone(),
                tag: tag.clone(),
                commit: commit.clone(),
            });
        }
        trees
    }

    /// Ids of the deepest node on every branch under `root`.
    fn branch_ends(&self, root: &NodeId, out: &mut Vec<NodeId>) {
        let children = self.children_of(root);
        if children.is_empty() {
            out.push(root.clone());
        }
        for child in children {
            self.branch_ends(child, out);
        }
    }

    fn roots_of(&self, kind: EntityKind) -> Vec<NodeId> {
        self.rows()
            .filter(|row| row.parent().is_none() && row.entity_kind() == kind)
            .map(|row| row.id().clone())
            .collect()
    }

    /// Every package branch, flattened.
    pub fn package_leaves(&self) -> Vec<PackageLeaf> {
        let mut ends = Vec::new();
        for root in self.roots_of(EntityKind::Package) {
            self.branch_ends(&root, &mut ends);
        }
        self.build_packages(&ends)
            .iter()
            .flat_map(Package::leaves)
            .collect()
    }

    /// Every source branch, flattened.
    pub fn source_leaves(&self) -> Vec<SourceLeaf> {
        let mut ends = Vec::new();
        for root in self.roots_of(EntityKind::Source) {
            self.branch_ends(&root, &mut ends);
        }
        self.build_sources(&ends)
            .iter()
            .flat_map(Source::leaves)
            .collect()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The node with this id. Hierarchy levels come back as a trimmed tree
    /// ending at the addressed level.
    pub fn node(&self, id: &NodeId) -> Option<GraphNode> {
        if let Some(record) = self.evidence.get(id) {
            return Some(record.clone());
        }
        let row = self.rows.get(id)?;
        let ids = std::slice::from_ref(id);
        match row {
            EntityRow::Artifact(a) => Some(GraphNode::Artifact(a.clone())),
            EntityRow::Builder(b) => Some(GraphNode::Builder(b.clone())),
            EntityRow::Vulnerability(v) => Some(GraphNode::Vulnerability(v.clone())),
            EntityRow::License(l) => Some(GraphNode::License(l.clone())),
            _ => match row.entity_kind() {
                EntityKind::Package => self.build_packages(ids).into_iter().next().map(GraphNode::Package),
                _ => self.build_sources(ids).into_iter().next().map(GraphNode::Source),
            },
        }
    }

    /// Everything one hop from `id`.
    ///
    /// For an evidence record: its subjects. For an entity: its hierarchy
    /// parent and children (only when `filter` allows everything), then the
    /// attached evidence of allowed kinds in insertion order.
    pub fn adjacent(&self, id: &NodeId, filter: &EdgeFilter) -> Result<Vec<GraphNode>> {
        if let Some(record) = self.evidence.get(id) {
            return Ok(record
                .subject_ids()
                .iter()
                .filter_map(|s| self.node(s))
                .collect());
        }
        let row = self
            .rows
            .get(id)
            .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))?;

        let mut out = Vec::new();
        if filter.is_all() {
            if let Some(parent) = row.parent() {
                out.extend(self.node(parent));
            }
            for child in self.children_of(id) {
                out.extend(self.node(child));
            }
        }
        for evidence_id in self.attached.get(id).into_iter().flatten() {
            if let Some(record) = self.evidence.get(evidence_id) {
                if record.edge_kind().is_some_and(|k| filter.allows(k)) {
                    out.push(record.clone());
                }
            }
        }
        Ok(out)
    }

    pub fn packages(&self, spec: &PkgSpec) -> Vec<Package> {
        let ids: Vec<NodeId> = self
            .package_leaves()
            .into_iter()
            .filter(|leaf| spec.matches(leaf))
            .map(|leaf| leaf.id)
            .collect();
        self.build_packages(&ids)
    }

    pub fn sources(&self, spec: &SourceSpec) -> Vec<Source> {
        let ids: Vec<NodeId> = self
            .source_leaves()
            .into_iter()
            .filter(|leaf| spec.matches(leaf))
            .map(|leaf| leaf.id)
            .collect();
        self.build_sources(&ids)
    }

    pub fn artifacts(&self, spec: &ArtifactSpec) -> Vec<Artifact> {
        self.rows()
            .filter_map(|row| match row {
                EntityRow::Artifact(a) if spec.matches(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn builders(&self, spec: &BuilderSpec) -> Vec<Builder> {
        self.rows()
            .filter_map(|row| match row {
                EntityRow::Builder(b) if spec.matches(b) => Some(b.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn vulnerabilities(&self, spec: &VulnerabilitySpec) -> Vec<Vulnerability> {
        self.rows()
            .filter_map(|row| match row {
                EntityRow::Vulnerability(v) if spec.matches(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn licenses(&self, spec: &LicenseSpec) -> Vec<License> {
        self.rows()
            .filter_map(|row| match row {
                EntityRow::License(l) if spec.matches(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn evidence(&self, spec: &EvidenceSpec) -> Vec<GraphNode> {
        self.evidence_records()
            .filter(|node| spec.matches(*node))
            .cloned()
            .collect()
    }

    pub fn dependencies(&self, spec: &IsDependencySpec) -> Vec<IsDependency> {
        self.evidence_records()
            .filter_map(|node| match node {
                GraphNode::IsDependency(dep) if spec.matches(dep) => Some(dep.clone()),
                _ => None,
            })
            .collect()
    }
}

/// The element of `items` with this id, inserted via `make` if absent.
fn slot<'a, T>(
    items: &'a mut Vec<T>,
    id: &NodeId,
    id_of: impl Fn(&T) -> &NodeId,
    make: impl FnOnce() -> T,
) -> &'a mut T {
    let pos = match items.iter().position(|item| id_of(item) == id) {
        Some(pos) => pos,
        None => {
            items.push(make());
            items.len() - 1
        }
    };
    &mut items[pos]
}
