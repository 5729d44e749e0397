//! The query facade.
//!
//! [`TrellisGraph`] ties a backend to the `[query]` config section and
//! exposes every query the crate offers behind one handle. Each method takes
//! a [`QueryContext`] so callers decide cancellation and deadlines per
//! request; [`TrellisGraph::context`] builds one from config.

use std::sync::Arc;

use crate::config::{Config, QueryConfig};
use crate::error::{GraphError, Result};
use crate::identity::Subject;
use crate::ontology::{EdgeFilter, GraphNode, IsDependency, NodeId};
use crate::query::{
    self, EqualityKind, KnownQuery, KnownReport, NeighborResolver, Neighbors, QueryContext,
};
use crate::spec::{EvidenceSpec, IsDependencySpec, SubjectSpec};
use crate::store::{GraphBackend, GraphSnapshot, MemoryBackend, ResolvedSubject, SurrealBackend};

#[derive(Clone)]
pub struct TrellisGraph {
    backend: Arc<dyn GraphBackend>,
    resolver: NeighborResolver,
    config: QueryConfig,
}

impl TrellisGraph {
    pub fn new(backend: Arc<dyn GraphBackend>, config: QueryConfig) -> Self {
        let resolver = NeighborResolver::new(backend.clone()).with_secondary_hop(config.secondary_hop);
        Self {
            backend,
            resolver,
            config,
        }
    }

    /// Open the backend named in `config`.
    ///
    /// A `snapshot` file, when given, always loads into the memory backend.
    pub async fn open(config: &Config, snapshot: Option<&std::path::Path>) -> Result<Self> {
        let backend: Arc<dyn GraphBackend> = match (snapshot, config.backend.kind.as_str()) {
            (Some(path), _) => {
                Arc::new(MemoryBackend::from_snapshot(GraphSnapshot::from_file(path)?)?)
            }
            (None, "memory") => Arc::new(MemoryBackend::new()),
            (None, "surreal") => Arc::new(SurrealBackend::from_config(&config.backend).await?),
            (None, other) => {
                return Err(GraphError::BackendUnavailable(format!(
                    "unknown backend '{}'",
                    other
                )))
            }
        };
        tracing::info!(backend = backend.name(), "graph opened");
        Ok(Self::new(backend, config.query.clone()))
    }

    /// A fresh request context using the configured limits.
    pub fn context(&self) -> QueryContext {
        QueryContext::from_config(&self.config)
    }

    pub fn backend(&self) -> &dyn GraphBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub async fn resolve_identity(
        &self,
        ctx: &QueryContext,
        spec: &SubjectSpec,
    ) -> Result<ResolvedSubject> {
        ctx.call(self.backend.resolve_identity(spec)).await
    }

    pub async fn neighbors(
        &self,
        ctx: &QueryContext,
        id: &NodeId,
        filter: &EdgeFilter,
    ) -> Result<Neighbors> {
        self.resolver.neighbors(ctx, id, filter).await
    }

    pub async fn known(&self, ctx: &QueryContext, subject: &Subject) -> Result<KnownReport> {
        KnownQuery::new(self.backend.as_ref(), &self.resolver)
            .known(ctx, subject)
            .await
    }

    /// Shortest route between two ids; `max_len` defaults to
    /// `query.max_path_length`.
    pub async fn find_route(
        &self,
        ctx: &QueryContext,
        from: &NodeId,
        to: &NodeId,
        max_len: Option<usize>,
        using_only: &EdgeFilter,
    ) -> Result<Vec<GraphNode>> {
        let max_len = max_len.unwrap_or(self.config.max_path_length);
        query::find_route(self.backend.as_ref(), ctx, from, to, max_len, using_only).await
    }

    pub async fn node(&self, ctx: &QueryContext, id: &NodeId) -> Result<GraphNode> {
        ctx.call(self.backend.node(id)).await
    }

    /// Several nodes by id, in input order. Any missing id fails the batch.
    pub async fn nodes(&self, ctx: &QueryContext, ids: &[NodeId]) -> Result<Vec<GraphNode>> {
        let backend = self.backend.as_ref();
        query::fan_out(ctx, ids.iter().map(|id| ctx.call(backend.node(id)))).await
    }

    pub async fn search(&self, ctx: &QueryContext, spec: &EvidenceSpec) -> Result<Vec<GraphNode>> {
        ctx.call(self.backend.evidence(spec)).await
    }

    pub async fn dependencies(
        &self,
        ctx: &QueryContext,
        spec: &IsDependencySpec,
    ) -> Result<Vec<IsDependency>> {
        ctx.call(self.backend.dependencies(spec)).await
    }

    pub async fn direct_equivalents(
        &self,
        ctx: &QueryContext,
        id: &NodeId,
        kind: EqualityKind,
    ) -> Result<Vec<NodeId>> {
        query::direct_equivalents(self.backend.as_ref(), ctx, id, kind).await
    }

    pub async fn equivalence_class(
        &self,
        ctx: &QueryContext,
        id: &NodeId,
        kind: EqualityKind,
    ) -> Result<Vec<NodeId>> {
        query::equivalence_class(self.backend.as_ref(), ctx, id, kind).await
    }
}
