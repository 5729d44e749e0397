mod common;

use std::sync::Arc;

use trellis_core::config::QueryConfig;
use trellis_core::spec::{EvidenceSpec, SubjectSpec};
use trellis_core::{
    EdgeFilter, EdgeKind, GraphBackend, SectionKind, Subject, SubjectType, SurrealBackend,
    TrellisGraph,
};

use common::fixture;

async fn imported() -> (common::Fixture, Arc<SurrealBackend>) {
    let fx = fixture().await;
    let surreal = SurrealBackend::in_memory().await.unwrap();
    surreal.import(&fx.backend.snapshot().await).await.unwrap();
    (fx, Arc::new(surreal))
}

#[tokio::test]
async fn test_import_is_idempotent() {
    let fx = fixture().await;
    let snapshot = fx.backend.snapshot().await;
    let surreal = SurrealBackend::in_memory().await.unwrap();

    let first = surreal.import(&snapshot).await.unwrap();
    assert_eq!(first.entities, snapshot.rows.len());
    assert_eq!(first.evidence, snapshot.evidence.len());
    assert_eq!(first.skipped, 0);

    let second = surreal.import(&snapshot).await.unwrap();
    assert_eq!(second.entities, 0);
    assert_eq!(second.skipped, snapshot.rows.len() + snapshot.evidence.len());

    let exported = surreal.export().await.unwrap();
    assert_eq!(exported, snapshot);
}

#[tokio::test]
async fn test_surreal_adjacency_matches_memory() {
    let (fx, surreal) = imported().await;
    for id in [fx.lodash.leaf_id(), &fx.artifact.id, &fx.cve.id] {
        let expected = fx.backend.adjacent(id, &EdgeFilter::all()).await.unwrap();
        let actual = surreal.adjacent(id, &EdgeFilter::all()).await.unwrap();
        assert_eq!(actual, expected, "adjacency of {}", id);
    }

    let filter = EdgeFilter::single(EdgeKind::CertifyVuln);
    let vulns = surreal.adjacent(fx.lodash.leaf_id(), &filter).await.unwrap();
    assert_eq!(vulns.len(), 2);
}

#[tokio::test]
async fn test_surreal_resolves_and_reports() {
    let (_fx, surreal) = imported().await;
    let graph = TrellisGraph::new(surreal, QueryConfig::default());
    let subject = Subject::parse(SubjectType::Package, "pkg:npm/lodash@4.17.21").unwrap();

    let report = graph.known(&graph.context(), &subject).await.unwrap();
    let version = report.section(SectionKind::PackageVersion).unwrap();
    assert_eq!(version.neighbors.occurrences.len(), 1);
    assert_eq!(version.neighbors.has_sbom.len(), 1);
    assert_eq!(report.vulnerability_summary().vulnerable, 1);
}

#[tokio::test]
async fn test_surreal_search_and_missing_node() {
    let (fx, surreal) = imported().await;
    let spec = EvidenceSpec {
        subject: Some(SubjectSpec::Source(Default::default())),
        ..Default::default()
    };
    let found = surreal.evidence(&spec).await.unwrap();
    let kinds: Vec<EdgeKind> = found.iter().filter_map(|n| n.edge_kind()).collect();
    assert_eq!(kinds, vec![EdgeKind::HasSourceAt, EdgeKind::CertifyScorecard]);

    let err = surreal.node(&"missing".into()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(surreal.node(&fx.twin.id).await.is_ok());
}

#[tokio::test]
async fn test_failed_import_writes_nothing() {
    let fx = fixture().await;
    let mut snapshot = fx.backend.snapshot().await;
    snapshot.evidence.push(trellis_core::GraphNode::from(trellis_core::ontology::HashEqual {
        id: "9001".into(),
        artifacts: vec![
            trellis_core::ontology::Artifact::new("9998", "sha256", "dead"),
            trellis_core::ontology::Artifact::new("9999", "sha256", "beef"),
        ],
        justification: "dangling".to_string(),
        ..Default::default()
    }));

    let surreal = SurrealBackend::in_memory().await.unwrap();
    assert!(surreal.import(&snapshot).await.is_err());

    let exported = surreal.export().await.unwrap();
    assert!(exported.rows.is_empty());
    assert!(exported.evidence.is_empty());
}

#[tokio::test]
async fn test_import_adds_only_new_records() {
    let fx = fixture().await;
    let surreal = SurrealBackend::in_memory().await.unwrap();
    surreal.import(&fx.backend.snapshot().await).await.unwrap();

    fx.backend.ingest_artifact("sha256", "ccc").await.unwrap();
    let snapshot = fx.backend.snapshot().await;
    let stats = surreal.import(&snapshot).await.unwrap();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.evidence, 0);
    assert_eq!(surreal.export().await.unwrap(), snapshot);
}
