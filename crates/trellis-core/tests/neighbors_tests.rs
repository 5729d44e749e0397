mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use trellis_core::ontology::{
    Artifact, Builder, CertifyBad, CertifyGood, CertifyLegal, CertifyScorecard,
    CertifyVexStatement, CertifyVuln, HasSbom, HasSlsa, HasSourceAt, HashEqual, IsDependency,
    IsOccurrence, License, Package, PkgEqual, Source, Vulnerability,
};
use trellis_core::spec::{
    ArtifactSpec, BuilderSpec, EvidenceSpec, IsDependencySpec, LicenseSpec, PkgSpec, SourceSpec,
    VulnerabilitySpec,
};
use trellis_core::store::AdjacencyMode;
use trellis_core::{
    EdgeFilter, EdgeKind, GraphBackend, GraphError, GraphNode, MemoryBackend, NeighborResolver,
    NodeId, QueryContext, Result,
};

use common::fixture;

/// Wraps the memory backend to count adjacency calls, inject extra records
/// and fail artifact lookups on demand.
struct Instrumented {
    inner: Arc<MemoryBackend>,
    mode: AdjacencyMode,
    adjacent_calls: AtomicUsize,
    extra: Vec<GraphNode>,
    fail_artifacts: bool,
}

impl Instrumented {
    fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            mode: AdjacencyMode::SingleCall,
            adjacent_calls: AtomicUsize::new(0),
            extra: Vec::new(),
            fail_artifacts: false,
        }
    }
}

#[async_trait]
impl GraphBackend for Instrumented {
    fn name(&self) -> &'static str {
        "instrumented"
    }

    fn adjacency_mode(&self) -> AdjacencyMode {
        self.mode
    }

    async fn packages(&self, spec: &PkgSpec) -> Result<Vec<Package>> {
        self.inner.packages(spec).await
    }

    async fn sources(&self, spec: &SourceSpec) -> Result<Vec<Source>> {
        self.inner.sources(spec).await
    }

    async fn artifacts(&self, spec: &ArtifactSpec) -> Result<Vec<Artifact>> {
        if self.fail_artifacts {
            return Err(GraphError::BackendUnavailable("artifact index offline".to_string()));
        }
        self.inner.artifacts(spec).await
    }

    async fn builders(&self, spec: &BuilderSpec) -> Result<Vec<Builder>> {
        self.inner.builders(spec).await
    }

    async fn vulnerabilities(&self, spec: &VulnerabilitySpec) -> Result<Vec<Vulnerability>> {
        self.inner.vulnerabilities(spec).await
    }

    async fn licenses(&self, spec: &LicenseSpec) -> Result<Vec<License>> {
        self.inner.licenses(spec).await
    }

    async fn evidence(&self, spec: &EvidenceSpec) -> Result<Vec<GraphNode>> {
        self.inner.evidence(spec).await
    }

    async fn dependencies(&self, spec: &IsDependencySpec) -> Result<Vec<IsDependency>> {
        self.inner.dependencies(spec).await
    }

    async fn node(&self, id: &NodeId) -> Result<GraphNode> {
        self.inner.node(id).await
    }

    async fn adjacent(&self, id: &NodeId, filter: &EdgeFilter) -> Result<Vec<GraphNode>> {
        self.adjacent_calls.fetch_add(1, Ordering::SeqCst);
        if self.mode == AdjacencyMode::PerKind {
            assert_eq!(filter.kinds().len(), 1, "per-kind backend got a multi-kind filter");
        }
        let mut items = self.inner.adjacent(id, filter).await?;
        items.extend(self.extra.iter().cloned());
        Ok(items)
    }
}

#[tokio::test]
async fn test_neighbors_buckets_every_kind() {
    let fx = fixture().await;
    let resolver = NeighborResolver::new(fx.backend.clone());
    let ctx = QueryContext::new();

    let n = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();

    assert_eq!(n.occurrences.len(), 1);
    assert_eq!(n.certify_vuln.len(), 2);
    assert_eq!(n.dependencies.len(), 1);
    assert_eq!(n.has_source_at.len(), 1);
    // Reached through the occurrence's artifact.
    assert_eq!(n.has_sbom.len(), 1);
    assert_eq!(n.has_slsa.len(), 1);
    assert!(n.certify_good.is_empty());
    assert_eq!(n.len(), 7);
    assert_eq!(n.records().len(), 7);

    // Only records attached directly appear in the path, in backend order.
    let expected: Vec<NodeId> = vec![
        n.occurrences[0].id.clone(),
        n.certify_vuln[0].id.clone(),
        n.certify_vuln[1].id.clone(),
        n.dependencies[0].id.clone(),
        n.has_source_at[0].id.clone(),
    ];
    assert_eq!(n.path, expected);
}

#[tokio::test]
async fn test_neighbors_respects_filter() {
    let fx = fixture().await;
    let resolver = NeighborResolver::new(fx.backend.clone());
    let ctx = QueryContext::new();

    let n = resolver
        .neighbors(
            &ctx,
            fx.lodash.leaf_id(),
            &EdgeFilter::single(EdgeKind::CertifyVuln),
        )
        .await
        .unwrap();
    assert_eq!(n.certify_vuln.len(), 2);
    assert_eq!(n.len(), 2);
    assert_eq!(n.path.len(), 2);
}

#[tokio::test]
async fn test_secondary_hop_only_fills_allowed_kinds() {
    let fx = fixture().await;
    let resolver = NeighborResolver::new(fx.backend.clone());
    let ctx = QueryContext::new();

    let filter = EdgeFilter::only([EdgeKind::IsOccurrence, EdgeKind::HasSbom]);
    let n = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &filter)
        .await
        .unwrap();
    assert_eq!(n.occurrences.len(), 1);
    assert_eq!(n.has_sbom.len(), 1);
    assert!(n.has_slsa.is_empty());
    assert_eq!(n.path, vec![n.occurrences[0].id.clone()]);
}

#[tokio::test]
async fn test_secondary_hop_can_be_disabled() {
    let fx = fixture().await;
    let resolver = NeighborResolver::new(fx.backend.clone()).with_secondary_hop(false);
    let ctx = QueryContext::new();

    let n = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();
    assert!(n.has_sbom.is_empty());
    assert!(n.has_slsa.is_empty());
}

#[tokio::test]
async fn test_secondary_hop_failures_are_skipped() {
    let fx = fixture().await;
    let backend = Instrumented {
        fail_artifacts: true,
        ..Instrumented::new(fx.backend.clone())
    };
    let resolver = NeighborResolver::new(Arc::new(backend));
    let ctx = QueryContext::new();

    let n = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();
    assert_eq!(n.occurrences.len(), 1);
    assert!(n.has_sbom.is_empty());
    assert_eq!(n.certify_vuln.len(), 2);
}

#[tokio::test]
async fn test_unrecognized_records_are_ignored() {
    let fx = fixture().await;
    let backend = Instrumented {
        extra: vec![GraphNode::Unrecognized],
        ..Instrumented::new(fx.backend.clone())
    };
    let resolver = NeighborResolver::new(Arc::new(backend)).with_secondary_hop(false);
    let ctx = QueryContext::new();

    let n = resolver
        .neighbors(&ctx, &fx.source.namespaces[0].names[0].id, &EdgeFilter::all())
        .await
        .unwrap();
    assert_eq!(n.scorecards.len(), 1);
    assert_eq!(n.has_source_at.len(), 1);
    assert_eq!(n.len(), 2);
    assert_eq!(n.path.len(), 2);
}

#[tokio::test]
async fn test_per_kind_backend_gets_one_call_per_kind() {
    let fx = fixture().await;
    let backend = Arc::new(Instrumented {
        mode: AdjacencyMode::PerKind,
        ..Instrumented::new(fx.backend.clone())
    });
    let resolver = NeighborResolver::new(backend.clone()).with_secondary_hop(false);
    let ctx = QueryContext::new();

    let filter = EdgeFilter::only([EdgeKind::CertifyVuln, EdgeKind::IsDependency]);
    let n = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &filter)
        .await
        .unwrap();
    assert_eq!(backend.adjacent_calls.load(Ordering::SeqCst), 2);
    assert_eq!(n.certify_vuln.len(), 2);
    assert_eq!(n.dependencies.len(), 1);
}

#[tokio::test]
async fn test_neighbors_of_unknown_node() {
    let fx = fixture().await;
    let resolver = NeighborResolver::new(fx.backend.clone());
    let err = resolver
        .neighbors(&QueryContext::new(), &NodeId::from("missing"), &EdgeFilter::all())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_one_record_of_each_kind_lands_in_its_bucket() {
    let fx = fixture().await;
    let id = |n: &str| NodeId::from(n);
    let backend = Instrumented {
        extra: vec![
            GraphNode::from(IsDependency { id: id("e1"), ..Default::default() }),
            GraphNode::from(IsOccurrence { id: id("e2"), ..Default::default() }),
            GraphNode::from(HashEqual { id: id("e3"), ..Default::default() }),
            GraphNode::from(PkgEqual { id: id("e4"), ..Default::default() }),
            GraphNode::from(HasSourceAt { id: id("e5"), ..Default::default() }),
            GraphNode::from(HasSbom { id: id("e6"), ..Default::default() }),
            GraphNode::from(HasSlsa { id: id("e7"), ..Default::default() }),
            GraphNode::from(CertifyVuln { id: id("e8"), ..Default::default() }),
            GraphNode::from(CertifyVexStatement { id: id("e9"), ..Default::default() }),
            GraphNode::from(CertifyBad { id: id("e10"), ..Default::default() }),
            GraphNode::from(CertifyGood { id: id("e11"), ..Default::default() }),
            GraphNode::from(CertifyScorecard { id: id("e12"), ..Default::default() }),
            GraphNode::from(CertifyLegal { id: id("e13"), ..Default::default() }),
        ],
        ..Instrumented::new(fx.backend.clone())
    };
    let resolver = NeighborResolver::new(Arc::new(backend));

    // lodash 4.17.20 carries no evidence of its own.
    let n = resolver
        .neighbors(&QueryContext::new(), fx.lodash_old.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();
    for kind in EdgeKind::ALL {
        assert_eq!(n.count(kind), 1, "bucket {}", kind);
    }
    let expected: Vec<NodeId> = (1..=13).map(|i| NodeId::new(format!("e{}", i))).collect();
    assert_eq!(n.path, expected);
}

#[tokio::test]
async fn test_neighbors_after_cancel() {
    let fx = fixture().await;
    let backend = Arc::new(Instrumented::new(fx.backend.clone()));
    let resolver = NeighborResolver::new(backend.clone());
    let ctx = QueryContext::new();
    ctx.cancel();

    let err = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Cancelled));
    assert_eq!(backend.adjacent_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_per_kind_fan_out_after_cancel_issues_no_calls() {
    let fx = fixture().await;
    let backend = Arc::new(Instrumented {
        mode: AdjacencyMode::PerKind,
        ..Instrumented::new(fx.backend.clone())
    });
    let resolver = NeighborResolver::new(backend.clone());
    let ctx = QueryContext::new();
    ctx.cancel();

    let err = resolver
        .neighbors(&ctx, fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap_err();
    assert!(err.is_cancellation());
    assert_eq!(backend.adjacent_calls.load(Ordering::SeqCst), 0);
}
