//! Entity node types.

mod artifact;
mod package;
mod source;
mod vulnerability;

pub use artifact::{Artifact, Builder};
pub use package::{
    Package, PackageLeaf, PackageLevel, PackageName, PackageNamespace, PackageQualifier,
    PackageVersion,
};
pub use source::{Source, SourceLeaf, SourceLevel, SourceName, SourceNamespace};
pub use vulnerability::{License, Vulnerability, VulnerabilityType};
