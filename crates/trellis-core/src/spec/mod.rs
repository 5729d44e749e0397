//! Filter specs and the optional-field matcher.
//!
//! Every spec field is optional; an absent field is a wildcard. A present
//! `id` short-circuits the other fields.

mod edges;
mod nodes;

pub use edges::{EvidenceSpec, IsDependencySpec};
pub use nodes::{
    ArtifactSpec, BuilderSpec, LicenseSpec, PkgNameSpec, PkgSpec, QualifierSpec, SourceSpec,
    VulnerabilitySpec,
};

use serde::{Deserialize, Serialize};

use crate::ontology::{EntityKind, NodeId};

/// A filter spec that can be tested against a record of type `R`.
pub trait Matches<R: ?Sized> {
    fn matches(&self, record: &R) -> bool;
}

/// Spec addressing a single evidence subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subject_type", rename_all = "snake_case")]
pub enum SubjectSpec {
    Package(PkgSpec),
    Source(SourceSpec),
    Artifact(ArtifactSpec),
}

impl SubjectSpec {
    pub fn id(&self) -> Option<&NodeId> {
        match self {
            SubjectSpec::Package(s) => s.id.as_ref(),
            SubjectSpec::Source(s) => s.id.as_ref(),
            SubjectSpec::Artifact(s) => s.id.as_ref(),
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            SubjectSpec::Package(_) => EntityKind::Package,
            SubjectSpec::Source(_) => EntityKind::Source,
            SubjectSpec::Artifact(_) => EntityKind::Artifact,
        }
    }
}

impl std::fmt::Display for SubjectSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<(&str, Option<&str>)> = match self {
            SubjectSpec::Package(s) => vec![
                ("id", s.id.as_ref().map(|id| id.as_str())),
                ("type", s.pkg_type.as_deref()),
                ("namespace", s.namespace.as_deref()),
                ("name", s.name.as_deref()),
                ("version", s.version.as_deref()),
                ("subpath", s.subpath.as_deref()),
            ],
            SubjectSpec::Source(s) => vec![
                ("id", s.id.as_ref().map(|id| id.as_str())),
                ("type", s.src_type.as_deref()),
                ("namespace", s.namespace.as_deref()),
                ("name", s.name.as_deref()),
                ("tag", s.tag.as_deref()),
                ("commit", s.commit.as_deref()),
            ],
            SubjectSpec::Artifact(s) => vec![
                ("id", s.id.as_ref().map(|id| id.as_str())),
                ("algorithm", s.algorithm.as_deref()),
                ("digest", s.digest.as_deref()),
            ],
        };
        write!(f, "{}", self.entity_kind().as_str())?;
        for (key, value) in fields {
            if let Some(value) = value {
                write!(f, " {}={:?}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Absent spec field matches anything; present field requires equality.
pub(crate) fn field_eq(spec: &Option<String>, value: Option<&str>) -> bool {
    match spec {
        None => true,
        Some(want) => value == Some(want.as_str()),
    }
}

/// Like [`field_eq`] for case-normalized fields.
pub(crate) fn field_eq_ignore_case(spec: &Option<String>, value: Option<&str>) -> bool {
    match spec {
        None => true,
        Some(want) => value.is_some_and(|v| v.eq_ignore_ascii_case(want)),
    }
}
