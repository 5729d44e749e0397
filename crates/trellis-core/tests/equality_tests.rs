mod common;

use trellis_core::ontology::{HashEqual, PkgEqual};
use trellis_core::EqualityKind;

use common::{fixture, ingest_purl};

#[tokio::test]
async fn test_hash_equality_is_symmetric() {
    let fx = fixture().await;
    let graph = fx.graph();
    let ctx = graph.context();

    let from_a = graph
        .direct_equivalents(&ctx, &fx.artifact.id, EqualityKind::Hash)
        .await
        .unwrap();
    let from_b = graph
        .direct_equivalents(&ctx, &fx.twin.id, EqualityKind::Hash)
        .await
        .unwrap();
    assert_eq!(from_a, vec![fx.twin.id.clone()]);
    assert_eq!(from_b, vec![fx.artifact.id.clone()]);
}

#[tokio::test]
async fn test_equivalence_class_is_transitive() {
    let fx = fixture().await;
    let third = fx.backend.ingest_artifact("sha512", "ccc").await.unwrap();
    fx.backend
        .ingest_evidence(HashEqual {
            artifacts: vec![fx.twin.clone(), third.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    let graph = fx.graph();
    let ctx = graph.context();

    // Only direct links are stored.
    let direct = graph
        .direct_equivalents(&ctx, &fx.artifact.id, EqualityKind::Hash)
        .await
        .unwrap();
    assert_eq!(direct, vec![fx.twin.id.clone()]);

    let class = graph
        .equivalence_class(&ctx, &fx.artifact.id, EqualityKind::Hash)
        .await
        .unwrap();
    assert_eq!(class, vec![fx.twin.id.clone(), third.id.clone()]);

    let class = graph
        .equivalence_class(&ctx, &third.id, EqualityKind::Hash)
        .await
        .unwrap();
    assert_eq!(class, vec![fx.twin.id.clone(), fx.artifact.id.clone()]);
}

#[tokio::test]
async fn test_package_equality() {
    let fx = fixture().await;
    let fork = ingest_purl(&fx.backend, "pkg:npm/lodash-es@4.17.21").await;
    fx.backend
        .ingest_evidence(PkgEqual {
            packages: vec![fx.lodash.clone(), fork.clone()],
            justification: "same sources".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let graph = fx.graph();
    let ctx = graph.context();

    let direct = graph
        .direct_equivalents(&ctx, fork.leaf_id(), EqualityKind::Package)
        .await
        .unwrap();
    assert_eq!(direct, vec![fx.lodash.leaf_id().clone()]);

    // Hash equality records are not followed for packages.
    let none = graph
        .direct_equivalents(&ctx, fx.lodash.leaf_id(), EqualityKind::Hash)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_equivalence_class_of_isolated_node() {
    let fx = fixture().await;
    let graph = fx.graph();
    let class = graph
        .equivalence_class(&graph.context(), fx.lodash_old.leaf_id(), EqualityKind::Package)
        .await
        .unwrap();
    assert!(class.is_empty());
}
