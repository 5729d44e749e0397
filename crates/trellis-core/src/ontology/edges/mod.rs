//! Evidence types (relationships) for the supply-chain graph.
//!
//! Every evidence record is itself a node: it has its own id and is attached
//! to one or more subject nodes. Records are grouped by what they assert:
//!
//! - **Dependency**: IsDependency
//! - **Equality**: HashEqual, PkgEqual
//! - **Attestation**: IsOccurrence, HasSourceAt, HasSBOM, HasSLSA
//! - **Certification**: CertifyVuln, CertifyVEXStatement, CertifyBad,
//!   CertifyGood, CertifyScorecard, CertifyLegal

mod attestation;
mod certification;
mod dependency;
mod equality;

pub use attestation::*;
pub use certification::*;
pub use dependency::*;
pub use equality::*;

use serde::{Deserialize, Serialize};

use super::{EdgeKind, EntityKind, NodeId};
use crate::ontology::nodes::{Artifact, Package, Source};

/// Common surface of every evidence record.
pub trait Evidence: Send + Sync {
    /// Which of the closed set of evidence kinds this record is.
    fn kind(&self) -> EdgeKind;

    /// Id of the record itself.
    fn id(&self) -> &NodeId;

    /// Ids of the nodes this record is attached to, in attachment order.
    fn subject_ids(&self) -> Vec<NodeId>;

    fn origin(&self) -> &str;

    fn collector(&self) -> &str;

    fn justification(&self) -> Option<&str> {
        None
    }
}

/// Implements [`Evidence`] for a record with `id`, `origin` and `collector`
/// fields. The optional `justification` arm forwards that field too.
macro_rules! impl_evidence {
    ($ty:ty, $kind:expr, |$rec:ident| $subjects:expr) => {
        impl $crate::ontology::Evidence for $ty {
            fn kind(&self) -> $crate::ontology::EdgeKind {
                $kind
            }
            fn id(&self) -> &$crate::ontology::NodeId {
                &self.id
            }
            fn subject_ids(&self) -> Vec<$crate::ontology::NodeId> {
                let $rec = self;
                $subjects
            }
            fn origin(&self) -> &str {
                &self.origin
            }
            fn collector(&self) -> &str {
                &self.collector
            }
        }
    };
    ($ty:ty, $kind:expr, justification, |$rec:ident| $subjects:expr) => {
        impl $crate::ontology::Evidence for $ty {
            fn kind(&self) -> $crate::ontology::EdgeKind {
                $kind
            }
            fn id(&self) -> &$crate::ontology::NodeId {
                &self.id
            }
            fn subject_ids(&self) -> Vec<$crate::ontology::NodeId> {
                let $rec = self;
                $subjects
            }
            fn origin(&self) -> &str {
                &self.origin
            }
            fn collector(&self) -> &str {
                &self.collector
            }
            fn justification(&self) -> Option<&str> {
                Some(&self.justification)
            }
        }
    };
}

pub(crate) use impl_evidence;

// =============================================================================
// SUBJECT UNIONS
// =============================================================================

/// Subject of an occurrence or legal certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject_type", rename_all = "snake_case")]
pub enum PackageOrSource {
    Package(Package),
    Source(Source),
}

impl Default for PackageOrSource {
    fn default() -> Self {
        Self::Package(Package::default())
    }
}

impl PackageOrSource {
    pub fn leaf_id(&self) -> &NodeId {
        match self {
            Self::Package(p) => p.leaf_id(),
            Self::Source(s) => s.leaf_id(),
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Package(_) => EntityKind::Package,
            Self::Source(_) => EntityKind::Source,
        }
    }
}

/// Subject of an SBOM or VEX statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject_type", rename_all = "snake_case")]
pub enum PackageOrArtifact {
    Package(Package),
    Artifact(Artifact),
}

impl Default for PackageOrArtifact {
    fn default() -> Self {
        Self::Package(Package::default())
    }
}

impl PackageOrArtifact {
    pub fn leaf_id(&self) -> &NodeId {
        match self {
            Self::Package(p) => p.leaf_id(),
            Self::Artifact(a) => &a.id,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Package(_) => EntityKind::Package,
            Self::Artifact(_) => EntityKind::Artifact,
        }
    }
}

/// Subject of a good/bad certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject_type", rename_all = "snake_case")]
pub enum PackageSourceOrArtifact {
    Package(Package),
    Source(Source),
    Artifact(Artifact),
}

impl Default for PackageSourceOrArtifact {
    fn default() -> Self {
        Self::Package(Package::default())
    }
}

impl PackageSourceOrArtifact {
    pub fn leaf_id(&self) -> &NodeId {
        match self {
            Self::Package(p) => p.leaf_id(),
            Self::Source(s) => s.leaf_id(),
            Self::Artifact(a) => &a.id,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Package(_) => EntityKind::Package,
            Self::Source(_) => EntityKind::Source,
            Self::Artifact(_) => EntityKind::Artifact,
        }
    }
}
