//! Everything known about one subject.
//!
//! Resolves a package, source or artifact identity to its node and collects
//! the evidence attached to it. A versioned package yields two sections: one
//! for the name node and one for the version node.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use super::{build_path, fan_out, NeighborResolver, Neighbors, QueryContext};
use crate::error::Result;
use crate::identity::Subject;
use crate::ontology::{EdgeFilter, GraphNode, NodeId};
use crate::store::{GraphBackend, ResolvedSubject};

/// Which node a report section describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    PackageName,
    PackageVersion,
    SourceName,
    Artifact,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::PackageName => "Package Name",
            SectionKind::PackageVersion => "Package Version",
            SectionKind::SourceName => "Source Name",
            SectionKind::Artifact => "Artifact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownSection {
    pub kind: SectionKind,
    /// The node the section is about.
    pub id: NodeId,
    /// Ancestry of `id`, `id` first.
    pub chain: Vec<NodeId>,
    pub neighbors: Neighbors,
    /// `chain` followed by the neighbor ids, deduplicated.
    pub path: Vec<NodeId>,
}

/// Vulnerability certifications across a report. Clean scans are counted
/// apart from findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilitySummary {
    /// CertifyVuln records carrying the NoVuln sentinel.
    pub certified_clean: usize,
    /// CertifyVuln records naming a real vulnerability.
    pub vulnerable: usize,
    /// Distinct real vulnerability ids, sorted.
    pub distinct_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownReport {
    pub subject: Subject,
    /// The resolved subject node.
    pub node: GraphNode,
    pub sections: Vec<KnownSection>,
}

impl KnownReport {
    pub fn section(&self, kind: SectionKind) -> Option<&KnownSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn vulnerability_summary(&self) -> VulnerabilitySummary {
        let mut seen = HashSet::new();
        let mut summary = VulnerabilitySummary::default();
        let mut ids = BTreeSet::new();
        for section in &self.sections {
            for cert in &section.neighbors.certify_vuln {
                if !seen.insert(&cert.id) {
                    continue;
                }
                if cert.vulnerability.is_no_vuln() {
                    summary.certified_clean += 1;
                } else {
                    summary.vulnerable += 1;
                    ids.insert(cert.vulnerability.to_string());
                }
            }
        }
        summary.distinct_ids = ids.into_iter().collect();
        summary
    }
}

/// Runs the known query against one backend.
pub struct KnownQuery<'a> {
    backend: &'a dyn GraphBackend,
    resolver: &'a NeighborResolver,
}

impl<'a> KnownQuery<'a> {
    pub fn new(backend: &'a dyn GraphBackend, resolver: &'a NeighborResolver) -> Self {
        Self { backend, resolver }
    }

    pub async fn known(&self, ctx: &QueryContext, subject: &Subject) -> Result<KnownReport> {
        let spec = subject.to_spec();
        let resolved = ctx.call(self.backend.resolve_identity(&spec)).await?;
        tracing::debug!(%subject, id = %resolved.id, "resolved subject");

        let targets = section_targets(subject, &resolved);
        let all = EdgeFilter::all();
        let neighbor_sets = fan_out(
            ctx,
            targets
                .iter()
                .map(|(_, chain)| self.resolver.neighbors(ctx, &chain[0], &all)),
        )
        .await?;

        let sections = targets
            .into_iter()
            .zip(neighbor_sets)
            .map(|((kind, chain), neighbors)| {
                let path = build_path(&chain, &neighbors.path);
                KnownSection {
                    kind,
                    id: chain[0].clone(),
                    chain,
                    neighbors,
                    path,
                }
            })
            .collect();

        Ok(KnownReport {
            subject: subject.clone(),
            node: resolved.node,
            sections,
        })
    }
}

/// Sections to collect, each with its non-empty root chain.
fn section_targets(subject: &Subject, resolved: &ResolvedSubject) -> Vec<(SectionKind, Vec<NodeId>)> {
    let chain = if resolved.chain.is_empty() {
        vec![resolved.id.clone()]
    } else {
        resolved.chain.clone()
    };
    match subject {
        Subject::Package(coord) if coord.version.is_some() && chain.len() > 1 => vec![
            (SectionKind::PackageName, chain[1..].to_vec()),
            (SectionKind::PackageVersion, chain),
        ],
        Subject::Package(_) => vec![(SectionKind::PackageName, chain)],
        Subject::Source(_) => vec![(SectionKind::SourceName, chain)],
        Subject::Artifact(_) => vec![(SectionKind::Artifact, chain)],
    }
}
