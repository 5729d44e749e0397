mod common;

use tempfile::TempDir;
use trellis_core::store::{EntityRow, GraphSnapshot};
use trellis_core::{EdgeFilter, GraphBackend, GraphNode, MemoryBackend, NodeId};

use common::fixture;

#[tokio::test]
async fn test_snapshot_file_round_trip() {
    let fx = fixture().await;
    let snapshot = fx.backend.snapshot().await;
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.json");
    snapshot.save(&path).unwrap();

    let loaded = GraphSnapshot::from_file(&path).unwrap();
    assert_eq!(loaded, snapshot);

    let restored = MemoryBackend::from_snapshot(loaded).unwrap();
    let before = fx
        .backend
        .adjacent(fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();
    let after = restored
        .adjacent(fx.lodash.leaf_id(), &EdgeFilter::all())
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_restored_backend_keeps_ingest_idempotent() {
    let fx = fixture().await;
    let restored = MemoryBackend::from_snapshot(fx.backend.snapshot().await).unwrap();

    // Re-ingesting existing content returns the stored record.
    let again = restored
        .ingest_evidence(trellis_core::ontology::HashEqual {
            artifacts: vec![fx.artifact.clone(), fx.twin.clone()],
            justification: "rebuilt".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let evidence = restored.snapshot().await.evidence;
    assert_eq!(evidence.len(), fx.backend.snapshot().await.evidence.len());
    assert!(evidence.iter().any(|n| n.id() == again.id()));

    // New ids never collide with loaded ones.
    let fresh = restored.ingest_artifact("sha256", "ddd").await.unwrap();
    assert!(fx.backend.node(&fresh.id).await.is_err());
}

#[test]
fn test_snapshot_skips_unknown_evidence_types() {
    let json = r#"{
        "rows": [
            {"row_type": "artifact", "id": "1", "algorithm": "sha256", "digest": "aaa"}
        ],
        "evidence": [
            {"node_type": "CertifyQuantumSafety", "id": "2"}
        ]
    }"#;
    let snapshot: GraphSnapshot = serde_json::from_str(json).unwrap();
    assert!(matches!(snapshot.evidence[0], GraphNode::Unrecognized));

    let index = snapshot.into_index().unwrap();
    assert_eq!(index.entity_count(), 1);
    assert_eq!(index.evidence_count(), 0);
}

#[test]
fn test_snapshot_rejects_orphan_rows() {
    let snapshot = GraphSnapshot {
        rows: vec![EntityRow::PackageName {
            id: NodeId::from("3"),
            parent: NodeId::from("2"),
            name: "lodash".to_string(),
        }],
        evidence: Vec::new(),
    };
    assert!(snapshot.into_index().unwrap_err().is_not_found());
}
