//! Certification evidence: vulnerability findings, VEX, trust and legal data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_evidence, PackageOrArtifact, PackageOrSource, PackageSourceOrArtifact};
use crate::ontology::nodes::{License, Package, Source, Vulnerability};
use crate::ontology::{EdgeKind, NodeId};

// =============================================================================
// VULNERABILITY FINDINGS
// =============================================================================

/// Metadata of the scan that produced a vulnerability certification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub time_scanned: DateTime<Utc>,
    pub db_uri: String,
    pub db_version: String,
    pub scanner_uri: String,
    pub scanner_version: String,
}

/// A scanner found `vulnerability` in `package`. A `novuln` vulnerability
/// records a clean scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyVuln {
    pub id: NodeId,
    pub package: Package,
    pub vulnerability: Vulnerability,
    pub metadata: ScanMetadata,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyVuln, EdgeKind::CertifyVuln, |r| vec![
    r.package.leaf_id().clone(),
    r.vulnerability.id.clone(),
]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexStatus {
    NotAffected,
    Affected,
    Fixed,
    #[default]
    UnderInvestigation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexJustification {
    ComponentNotPresent,
    VulnerableCodeNotPresent,
    VulnerableCodeNotInExecutePath,
    VulnerableCodeCannotBeControlledByAdversary,
    InlineMitigationsAlreadyExist,
    #[default]
    NotProvided,
}

/// A VEX statement on whether `subject` is affected by `vulnerability`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyVexStatement {
    pub id: NodeId,
    pub subject: PackageOrArtifact,
    pub vulnerability: Vulnerability,
    pub status: VexStatus,
    pub vex_justification: VexJustification,
    pub statement: String,
    pub status_notes: String,
    pub known_since: DateTime<Utc>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyVexStatement, EdgeKind::CertifyVexStatement, |r| vec![
    r.subject.leaf_id().clone(),
    r.vulnerability.id.clone(),
]);

// =============================================================================
// TRUST
// =============================================================================

/// Something is known to be bad.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyBad {
    pub id: NodeId,
    pub subject: PackageSourceOrArtifact,
    pub justification: String,
    pub known_since: DateTime<Utc>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyBad, EdgeKind::CertifyBad, justification, |r| vec![r
    .subject
    .leaf_id()
    .clone()]);

/// Something is known to be good.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyGood {
    pub id: NodeId,
    pub subject: PackageSourceOrArtifact,
    pub justification: String,
    pub known_since: DateTime<Utc>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyGood, EdgeKind::CertifyGood, justification, |r| vec![r
    .subject
    .leaf_id()
    .clone()]);

// =============================================================================
// SCORECARD
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardCheck {
    pub check: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub checks: Vec<ScorecardCheck>,
    pub aggregate_score: f64,
    pub time_scanned: DateTime<Utc>,
    pub scorecard_version: String,
    pub scorecard_commit: String,
}

/// OpenSSF scorecard results for a source repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyScorecard {
    pub id: NodeId,
    pub source: Source,
    pub scorecard: Scorecard,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyScorecard, EdgeKind::CertifyScorecard, |r| vec![r
    .source
    .leaf_id()
    .clone()]);

// =============================================================================
// LEGAL
// =============================================================================

/// Declared and discovered licensing of a package or source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertifyLegal {
    pub id: NodeId,
    pub subject: PackageOrSource,
    pub declared_license: String,
    pub declared_licenses: Vec<License>,
    pub discovered_license: String,
    pub discovered_licenses: Vec<License>,
    pub attribution: String,
    pub justification: String,
    pub time_scanned: DateTime<Utc>,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(CertifyLegal, EdgeKind::CertifyLegal, justification, |r| {
    let mut ids = vec![r.subject.leaf_id().clone()];
    for license in r.declared_licenses.iter().chain(&r.discovered_licenses) {
        if !ids.contains(&license.id) {
            ids.push(license.id.clone());
        }
    }
    ids
});
