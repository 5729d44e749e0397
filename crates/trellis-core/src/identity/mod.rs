//! Identity strings and their decomposition.
//!
//! Pure parsing: each form decomposes into a coordinate that can be
//! re-encoded canonically or turned into a lookup spec.

mod artifact;
mod purl;
mod vcs;

pub use artifact::ArtifactCoordinate;
pub use purl::PackageCoordinate;
pub use vcs::SourceCoordinate;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, IdentityKind, Result};
use crate::spec::SubjectSpec;

/// Which identity form a subject string is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Package,
    Source,
    Artifact,
}

impl std::str::FromStr for SubjectType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "package" => Ok(Self::Package),
            "source" => Ok(Self::Source),
            "artifact" => Ok(Self::Artifact),
            _ => Err(GraphError::malformed(
                IdentityKind::SubjectType,
                s,
                "expected package, source or artifact",
            )),
        }
    }
}

/// A parsed subject identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subject_type", rename_all = "lowercase")]
pub enum Subject {
    Package(PackageCoordinate),
    Source(SourceCoordinate),
    Artifact(ArtifactCoordinate),
}

impl Subject {
    pub fn parse(subject_type: SubjectType, input: &str) -> Result<Self> {
        Ok(match subject_type {
            SubjectType::Package => Subject::Package(PackageCoordinate::parse(input)?),
            SubjectType::Source => Subject::Source(SourceCoordinate::parse(input)?),
            SubjectType::Artifact => Subject::Artifact(ArtifactCoordinate::parse(input)?),
        })
    }

    pub fn subject_type(&self) -> SubjectType {
        match self {
            Subject::Package(_) => SubjectType::Package,
            Subject::Source(_) => SubjectType::Source,
            Subject::Artifact(_) => SubjectType::Artifact,
        }
    }

    pub fn to_spec(&self) -> SubjectSpec {
        match self {
            Subject::Package(p) => SubjectSpec::Package(p.to_spec()),
            Subject::Source(s) => SubjectSpec::Source(s.to_spec()),
            Subject::Artifact(a) => SubjectSpec::Artifact(a.to_spec()),
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Package(p) => p.fmt(f),
            Subject::Source(s) => s.fmt(f),
            Subject::Artifact(a) => a.fmt(f),
        }
    }
}
