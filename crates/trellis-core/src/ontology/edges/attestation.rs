//! Attestation evidence: where things occur, come from and how they were built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_evidence, PackageOrArtifact, PackageOrSource};
use crate::ontology::nodes::{Artifact, Builder, Package, Source};
use crate::ontology::{EdgeKind, NodeId};

/// A package or source is realized by an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsOccurrence {
    pub id: NodeId,
    pub subject: PackageOrSource,
    pub artifact: Artifact,
    pub justification: String,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(IsOccurrence, EdgeKind::IsOccurrence, justification, |r| vec![
    r.subject.leaf_id().clone(),
    r.artifact.id.clone(),
]);

/// A package was built from a source repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HasSourceAt {
    pub id: NodeId,
    pub package: Package,
    pub source: Source,
    pub known_since: DateTime<Utc>,
    pub justification: String,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(HasSourceAt, EdgeKind::HasSourceAt, justification, |r| vec![
    r.package.leaf_id().clone(),
    r.source.leaf_id().clone(),
]);

/// A software bill of materials exists for a package or artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HasSbom {
    pub id: NodeId,
    pub subject: PackageOrArtifact,
    pub uri: String,
    pub algorithm: String,
    pub digest: String,
    pub download_location: String,
    pub known_since: DateTime<Utc>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(HasSbom, EdgeKind::HasSbom, |r| vec![r.subject.leaf_id().clone()]);

/// One `key=value` entry of a SLSA predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlsaPredicate {
    pub key: String,
    pub value: String,
}

/// SLSA provenance for an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HasSlsa {
    pub id: NodeId,
    pub subject: Artifact,
    pub built_by: Builder,
    pub built_from: Vec<Artifact>,
    pub build_type: String,
    pub predicate: Vec<SlsaPredicate>,
    pub slsa_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_on: Option<DateTime<Utc>>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(HasSlsa, EdgeKind::HasSlsa, |r| {
    let mut ids = vec![r.subject.id.clone()];
    if !r.built_by.id.is_empty() {
        ids.push(r.built_by.id.clone());
    }
    ids.extend(r.built_from.iter().map(|a| a.id.clone()));
    ids
});
