//! Specs over evidence records.

use serde::{Deserialize, Serialize};

use super::{field_eq, Matches, PkgNameSpec, PkgSpec, SubjectSpec};
use crate::ontology::{
    Artifact, DependencyType, EdgeKind, GraphNode, IsDependency, NodeId, Package,
    PackageOrArtifact, PackageOrSource, PackageSourceOrArtifact, Source,
};

/// Filtered search across every evidence kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceSpec {
    pub id: Option<NodeId>,
    /// Allowed kinds; empty allows all.
    pub kinds: Vec<EdgeKind>,
    /// Matches when any embedded subject of the record matches.
    pub subject: Option<SubjectSpec>,
    pub justification: Option<String>,
    pub origin: Option<String>,
    pub collector: Option<String>,
}

impl Matches<GraphNode> for EvidenceSpec {
    fn matches(&self, node: &GraphNode) -> bool {
        let Some(evidence) = node.as_evidence() else {
            return false;
        };
        if let Some(id) = &self.id {
            return evidence.id() == id;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&evidence.kind()) {
            return false;
        }
        if !(field_eq(&self.justification, evidence.justification())
            && field_eq(&self.origin, Some(evidence.origin()))
            && field_eq(&self.collector, Some(evidence.collector())))
        {
            return false;
        }
        match &self.subject {
            None => true,
            Some(spec) => embedded_subjects(node)
                .into_iter()
                .any(|subject| subject.matched_by(spec)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsDependencySpec {
    pub id: Option<NodeId>,
    pub package: Option<PkgSpec>,
    pub dependency_package: Option<PkgNameSpec>,
    pub version_range: Option<String>,
    pub dependency_type: Option<DependencyType>,
    pub justification: Option<String>,
    pub origin: Option<String>,
    pub collector: Option<String>,
}

impl Matches<IsDependency> for IsDependencySpec {
    fn matches(&self, dep: &IsDependency) -> bool {
        if let Some(id) = &self.id {
            return &dep.id == id;
        }
        self.package.as_ref().map_or(true, |s| s.matches(&dep.package))
            && self
                .dependency_package
                .as_ref()
                .map_or(true, |s| s.matches(&dep.dependency_package))
            && field_eq(&self.version_range, Some(dep.version_range.as_str()))
            && self.dependency_type.map_or(true, |t| t == dep.dependency_type)
            && field_eq(&self.justification, Some(dep.justification.as_str()))
            && field_eq(&self.origin, Some(dep.origin.as_str()))
            && field_eq(&self.collector, Some(dep.collector.as_str()))
    }
}

impl Matches<GraphNode> for IsDependencySpec {
    fn matches(&self, node: &GraphNode) -> bool {
        match node {
            GraphNode::IsDependency(dep) => self.matches(dep),
            _ => false,
        }
    }
}

// =============================================================================
// EMBEDDED SUBJECTS
// =============================================================================

/// Borrowed view of a subject tree embedded in an evidence record.
enum SubjectRef<'a> {
    Package(&'a Package),
    Source(&'a Source),
    Artifact(&'a Artifact),
}

impl SubjectRef<'_> {
    fn matched_by(&self, spec: &SubjectSpec) -> bool {
        match (self, spec) {
            (SubjectRef::Package(p), SubjectSpec::Package(s)) => s.matches(*p),
            (SubjectRef::Source(src), SubjectSpec::Source(s)) => s.matches(*src),
            (SubjectRef::Artifact(a), SubjectSpec::Artifact(s)) => s.matches(*a),
            _ => false,
        }
    }
}

impl<'a> From<&'a PackageOrSource> for SubjectRef<'a> {
    fn from(subject: &'a PackageOrSource) -> Self {
        match subject {
            PackageOrSource::Package(p) => SubjectRef::Package(p),
            PackageOrSource::Source(s) => SubjectRef::Source(s),
        }
    }
}

impl<'a> From<&'a PackageOrArtifact> for SubjectRef<'a> {
    fn from(subject: &'a PackageOrArtifact) -> Self {
        match subject {
            PackageOrArtifact::Package(p) => SubjectRef::Package(p),
            PackageOrArtifact::Artifact(a) => SubjectRef::Artifact(a),
        }
    }
}

impl<'a> From<&'a PackageSourceOrArtifact> for SubjectRef<'a> {
    fn from(subject: &'a PackageSourceOrArtifact) -> Self {
        match subject {
            PackageSourceOrArtifact::Package(p) => SubjectRef::Package(p),
            PackageSourceOrArtifact::Source(s) => SubjectRef::Source(s),
            PackageSourceOrArtifact::Artifact(a) => SubjectRef::Artifact(a),
        }
    }
}

fn embedded_subjects(node: &GraphNode) -> Vec<SubjectRef<'_>> {
    match node {
        GraphNode::IsDependency(e) => vec![
            SubjectRef::Package(&e.package),
            SubjectRef::Package(&e.dependency_package),
        ],
        GraphNode::IsOccurrence(e) => {
            vec![SubjectRef::from(&e.subject), SubjectRef::Artifact(&e.artifact)]
        }
        GraphNode::HashEqual(e) => e.artifacts.iter().map(SubjectRef::Artifact).collect(),
        GraphNode::PkgEqual(e) => e.packages.iter().map(SubjectRef::Package).collect(),
        GraphNode::HasSourceAt(e) => {
            vec![SubjectRef::Package(&e.package), SubjectRef::Source(&e.source)]
        }
        GraphNode::HasSbom(e) => vec![SubjectRef::from(&e.subject)],
        GraphNode::HasSlsa(e) => std::iter::once(SubjectRef::Artifact(&e.subject))
            .chain(e.built_from.iter().map(SubjectRef::Artifact))
            .collect(),
        GraphNode::CertifyVuln(e) => vec![SubjectRef::Package(&e.package)],
        GraphNode::CertifyVexStatement(e) => vec![SubjectRef::from(&e.subject)],
        GraphNode::CertifyBad(e) => vec![SubjectRef::from(&e.subject)],
        GraphNode::CertifyGood(e) => vec![SubjectRef::from(&e.subject)],
        GraphNode::CertifyScorecard(e) => vec![SubjectRef::Source(&e.source)],
        GraphNode::CertifyLegal(e) => vec![SubjectRef::from(&e.subject)],
        GraphNode::Package(_)
        | GraphNode::Source(_)
        | GraphNode::Artifact(_)
        | GraphNode::Builder(_)
        | GraphNode::Vulnerability(_)
        | GraphNode::License(_)
        | GraphNode::Unrecognized => Vec::new(),
    }
}
