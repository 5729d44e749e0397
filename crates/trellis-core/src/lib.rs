//! Trellis: a supply-chain knowledge graph.
//!
//! Packages, sources, artifacts, builders, vulnerabilities and licenses are
//! entity nodes. Everything said about them (dependencies, occurrences,
//! attestations, certifications) is an evidence node linking entities.
//!
//! # Components
//!
//! - [`identity`] - purl, VCS and digest parsing
//! - [`spec`] - partial-match filters over nodes and evidence
//! - [`store`] - the [`GraphBackend`] contract plus memory and SurrealDB backends
//! - [`query`] - neighbor resolution, known reports, route search, equality
//! - [`TrellisGraph`] - one handle over all of the above
//!
//! # Example
//!
//! ```ignore
//! use trellis_core::{Config, Subject, SubjectType, TrellisGraph};
//!
//! let graph = TrellisGraph::open(&Config::load()?, None).await?;
//! let subject = Subject::parse(SubjectType::Package, "pkg:npm/lodash@4.17.21")?;
//! let report = graph.known(&graph.context(), &subject).await?;
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod ontology;
pub mod query;
pub mod spec;
pub mod store;

pub use config::{BackendConfig, Config, ConfigError, QueryConfig, VisualizerConfig};
pub use error::{GraphError, IdentityKind, Result};
pub use graph::TrellisGraph;
pub use identity::{ArtifactCoordinate, PackageCoordinate, SourceCoordinate, Subject, SubjectType};
pub use ontology::{EdgeFilter, EdgeKind, EntityKind, GraphNode, NodeCategory, NodeId};
pub use query::{
    EqualityKind, KnownReport, KnownSection, NeighborResolver, Neighbors, QueryContext,
    SectionKind, VulnerabilitySummary,
};
pub use store::{GraphBackend, GraphSnapshot, MemoryBackend, SurrealBackend};
