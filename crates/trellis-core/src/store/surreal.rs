//! SurrealDB embedded backend.
//!
//! Entities and evidence live in two tables. Each record keeps its graph id,
//! its kind, its links (`parent` for entities, `subjects` for evidence), an
//! insertion sequence number and the JSON payload of the full record.
//! Tree building and spec matching reuse [`GraphIndex`] over the rows a
//! query touched.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

use super::index::{row_kinds_of, EntityRow, GraphIndex};
use super::snapshot::GraphSnapshot;
use super::GraphBackend;
use crate::config::BackendConfig;
use crate::error::{GraphError, Result};
use crate::ontology::{
    Artifact, Builder, EdgeFilter, EdgeKind, EntityKind, GraphNode, IsDependency, License, NodeId,
    Package, Source, Vulnerability,
};
use crate::spec::{
    ArtifactSpec, BuilderSpec, EvidenceSpec, IsDependencySpec, LicenseSpec, Matches, PkgSpec,
    SourceSpec, VulnerabilitySpec,
};

#[derive(Debug, Serialize)]
struct EntityRecord {
    node_id: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    seq: i64,
    payload: String,
}

#[derive(Debug, Serialize)]
struct EvidenceRecord {
    node_id: String,
    kind: String,
    subjects: Vec<String>,
    seq: i64,
    payload: String,
}

#[derive(Debug, Deserialize)]
struct PayloadRow {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: i64,
}

/// Counts written by [`SurrealBackend::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub entities: usize,
    pub evidence: usize,
    pub skipped: usize,
}

/// Graph stored in an embedded SurrealDB database.
pub struct SurrealBackend {
    db: Surreal<Db>,
}

impl SurrealBackend {
    /// Open or create an on-disk database at the given path.
    pub async fn open(path: &Path, namespace: &str, database: &str) -> Result<Self> {
        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns(namespace).use_db(database).await?;
        tracing::info!(path = %path.display(), "opened surreal graph store");

        let backend = Self { db };
        backend.initialize_schema().await?;
        Ok(backend)
    }

    /// Open the database described by the `[backend]` config section.
    pub async fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::open(&config.db_path(), &config.namespace, &config.database).await
    }

    /// A throwaway in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns("trellis").use_db("scratch").await?;

        let backend = Self { db };
        backend.initialize_schema().await?;
        Ok(backend)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.db
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS entity SCHEMALESS;
                DEFINE FIELD IF NOT EXISTS node_id ON entity TYPE string;
                DEFINE FIELD IF NOT EXISTS kind ON entity TYPE string;
                DEFINE FIELD IF NOT EXISTS parent ON entity TYPE option<string>;
                DEFINE FIELD IF NOT EXISTS seq ON entity TYPE int;
                DEFINE FIELD IF NOT EXISTS payload ON entity TYPE string;
                DEFINE INDEX IF NOT EXISTS entity_node_id ON entity FIELDS node_id UNIQUE;
                DEFINE INDEX IF NOT EXISTS entity_parent ON entity FIELDS parent;
                DEFINE INDEX IF NOT EXISTS entity_kind ON entity FIELDS kind;
                "#,
            )
            .await?
            .check()?;

        self.db
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS evidence SCHEMALESS;
                DEFINE FIELD IF NOT EXISTS node_id ON evidence TYPE string;
                DEFINE FIELD IF NOT EXISTS kind ON evidence TYPE string;
                DEFINE FIELD IF NOT EXISTS subjects ON evidence TYPE array<string>;
                DEFINE FIELD IF NOT EXISTS seq ON evidence TYPE int;
                DEFINE FIELD IF NOT EXISTS payload ON evidence TYPE string;
                DEFINE INDEX IF NOT EXISTS evidence_node_id ON evidence FIELDS node_id UNIQUE;
                DEFINE INDEX IF NOT EXISTS evidence_kind ON evidence FIELDS kind;
                "#,
            )
            .await?
            .check()?;

        Ok(())
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Write a snapshot. Records whose id already exists are skipped, so
    /// importing the same snapshot twice is harmless.
    ///
    /// The snapshot is validated as a whole first and every write runs in a
    /// single transaction, so a failed import leaves the store unchanged.
    pub async fn import(&self, snapshot: &GraphSnapshot) -> Result<ImportStats> {
        let index = snapshot.clone().into_index()?;
        let mut stats = ImportStats::default();

        let mut entities = Vec::new();
        let mut seq = self.count("entity").await?;
        for row in index.rows() {
            if self.entity_row(row.id()).await?.is_some() {
                stats.skipped += 1;
                continue;
            }
            entities.push(EntityRecord {
                node_id: row.id().to_string(),
                kind: row.row_kind().to_string(),
                parent: row.parent().map(|p| p.to_string()),
                seq,
                payload: serde_json::to_string(row)?,
            });
            seq += 1;
        }

        let mut evidence = Vec::new();
        let mut seq = self.count("evidence").await?;
        for node in index.evidence_records() {
            let (Some(id), Some(kind)) = (node.id(), node.edge_kind()) else {
                continue;
            };
            if self.evidence_record(id).await?.is_some() {
                stats.skipped += 1;
                continue;
            }
            evidence.push(EvidenceRecord {
                node_id: id.to_string(),
                kind: kind.as_str().to_string(),
                subjects: node.subject_ids().iter().map(|s| s.to_string()).collect(),
                seq,
                payload: serde_json::to_string(node)?,
            });
            seq += 1;
        }

        stats.entities = entities.len();
        stats.evidence = evidence.len();
        if entities.is_empty() && evidence.is_empty() {
            tracing::info!(skipped = stats.skipped, "snapshot already imported");
            return Ok(stats);
        }

        let mut query = self.db.query("BEGIN TRANSACTION;");
        for (i, record) in entities.into_iter().enumerate() {
            let param = format!("entity_{}", i);
            query = query
                .query(format!("CREATE entity CONTENT ${};", param))
                .bind((param, record));
        }
        for (i, record) in evidence.into_iter().enumerate() {
            let param = format!("evidence_{}", i);
            query = query
                .query(format!("CREATE evidence CONTENT ${};", param))
                .bind((param, record));
        }
        query.query("COMMIT TRANSACTION;").await?.check()?;

        tracing::info!(
            entities = stats.entities,
            evidence = stats.evidence,
            skipped = stats.skipped,
            "imported graph snapshot"
        );
        Ok(stats)
    }

    /// Read the whole graph back as a snapshot.
    pub async fn export(&self) -> Result<GraphSnapshot> {
        let index = self.index_of(None).await?;
        let evidence = self.evidence_of(&[]).await?;
        Ok(GraphSnapshot {
            rows: index.rows().cloned().collect(),
            evidence,
        })
    }

    // =========================================================================
    // Row access
    // =========================================================================

    async fn count(&self, table: &str) -> Result<i64> {
        let result: Option<CountResult> = self
            .db
            .query(format!("SELECT count() FROM {} GROUP ALL", table))
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0))
    }

    async fn entity_row(&self, id: &NodeId) -> Result<Option<EntityRow>> {
        let row: Option<PayloadRow> = self
            .db
            .query("SELECT payload FROM entity WHERE node_id = $id")
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        Ok(match row {
            Some(r) => Some(serde_json::from_str(&r.payload)?),
            None => None,
        })
    }

    async fn child_rows(&self, id: &NodeId) -> Result<Vec<EntityRow>> {
        let rows: Vec<PayloadRow> = self
            .db
            .query("SELECT payload, seq FROM entity WHERE parent = $id ORDER BY seq")
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        decode_all(rows)
    }

    async fn evidence_record(&self, id: &NodeId) -> Result<Option<GraphNode>> {
        let row: Option<PayloadRow> = self
            .db
            .query("SELECT payload FROM evidence WHERE node_id = $id")
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        Ok(match row {
            Some(r) => Some(serde_json::from_str(&r.payload)?),
            None => None,
        })
    }

    /// Evidence of the given kinds (all when empty), in insertion order.
    async fn evidence_of(&self, kinds: &[EdgeKind]) -> Result<Vec<GraphNode>> {
        let rows: Vec<PayloadRow> = if kinds.is_empty() {
            self.db
                .query("SELECT payload, seq FROM evidence ORDER BY seq")
                .await?
                .take(0)?
        } else {
            self.db
                .query("SELECT payload, seq FROM evidence WHERE kind IN $kinds ORDER BY seq")
                .bind(("kinds", kind_names(kinds)))
                .await?
                .take(0)?
        };
        decode_all(rows)
    }

    /// Evidence attached to `id` of the given kinds, in insertion order.
    async fn attached_to(&self, id: &NodeId, kinds: &[EdgeKind]) -> Result<Vec<GraphNode>> {
        let rows: Vec<PayloadRow> = self
            .db
            .query(
                "SELECT payload, seq FROM evidence \
                 WHERE subjects CONTAINS $id AND kind IN $kinds ORDER BY seq",
            )
            .bind(("id", id.to_string()))
            .bind(("kinds", kind_names(kinds)))
            .await?
            .take(0)?;
        decode_all(rows)
    }

    /// Index over every row of one entity kind, or of all kinds.
    async fn index_of(&self, kind: Option<EntityKind>) -> Result<GraphIndex> {
        let rows: Vec<PayloadRow> = match kind {
            Some(kind) => {
                let kinds: Vec<String> = row_kinds_of(kind).iter().map(|k| k.to_string()).collect();
                self.db
                    .query("SELECT payload, seq FROM entity WHERE kind IN $kinds ORDER BY seq")
                    .bind(("kinds", kinds))
                    .await?
                    .take(0)?
            }
            None => {
                self.db
                    .query("SELECT payload, seq FROM entity ORDER BY seq")
                    .await?
                    .take(0)?
            }
        };
        let mut index = GraphIndex::new();
        for row in decode_all::<EntityRow>(rows)? {
            index.insert_row(row)?;
        }
        Ok(index)
    }

    /// Index holding the ancestry chains of the given ids.
    async fn hydrate(&self, ids: &[NodeId]) -> Result<GraphIndex> {
        let mut index = GraphIndex::new();
        for id in ids {
            let mut chain = Vec::new();
            let mut current = Some(id.clone());
            while let Some(cursor) = current {
                if index.row(&cursor).is_some() {
                    break;
                }
                let Some(row) = self.entity_row(&cursor).await? else {
                    break;
                };
                current = row.parent().cloned();
                chain.push(row);
            }
            for row in chain.into_iter().rev() {
                index.insert_row(row)?;
            }
        }
        Ok(index)
    }

    async fn nodes_of(&self, ids: &[NodeId]) -> Result<Vec<GraphNode>> {
        let index = self.hydrate(ids).await?;
        Ok(ids.iter().filter_map(|id| index.node(id)).collect())
    }
}

fn kind_names(kinds: &[EdgeKind]) -> Vec<String> {
    kinds.iter().map(|k| k.as_str().to_string()).collect()
}

fn decode_all<T: serde::de::DeserializeOwned>(rows: Vec<PayloadRow>) -> Result<Vec<T>> {
    rows.iter()
        .map(|r| serde_json::from_str(&r.payload).map_err(GraphError::from))
        .collect()
}

#[async_trait]
impl GraphBackend for SurrealBackend {
    fn name(&self) -> &'static str {
        "surreal"
    }

    async fn packages(&self, spec: &PkgSpec) -> Result<Vec<Package>> {
        Ok(self.index_of(Some(EntityKind::Package)).await?.packages(spec))
    }

    async fn sources(&self, spec: &SourceSpec) -> Result<Vec<Source>> {
        Ok(self.index_of(Some(EntityKind::Source)).await?.sources(spec))
    }

    async fn artifacts(&self, spec: &ArtifactSpec) -> Result<Vec<Artifact>> {
        Ok(self.index_of(Some(EntityKind::Artifact)).await?.artifacts(spec))
    }

    async fn builders(&self, spec: &BuilderSpec) -> Result<Vec<Builder>> {
        Ok(self.index_of(Some(EntityKind::Builder)).await?.builders(spec))
    }

    async fn vulnerabilities(&self, spec: &VulnerabilitySpec) -> Result<Vec<Vulnerability>> {
        Ok(self
            .index_of(Some(EntityKind::Vulnerability))
            .await?
            .vulnerabilities(spec))
    }

    async fn licenses(&self, spec: &LicenseSpec) -> Result<Vec<License>> {
        Ok(self.index_of(Some(EntityKind::License)).await?.licenses(spec))
    }

    async fn evidence(&self, spec: &EvidenceSpec) -> Result<Vec<GraphNode>> {
        if let Some(id) = &spec.id {
            return Ok(self.evidence_record(id).await?.into_iter().collect());
        }
        Ok(self
            .evidence_of(&spec.kinds)
            .await?
            .into_iter()
            .filter(|node| spec.matches(node))
            .collect())
    }

    async fn dependencies(&self, spec: &IsDependencySpec) -> Result<Vec<IsDependency>> {
        Ok(self
            .evidence_of(&[EdgeKind::IsDependency])
            .await?
            .into_iter()
            .filter_map(|node| match node {
                GraphNode::IsDependency(dep) if spec.matches(&dep) => Some(dep),
                _ => None,
            })
            .collect())
    }

    async fn node(&self, id: &NodeId) -> Result<GraphNode> {
        if let Some(record) = self.evidence_record(id).await? {
            return Ok(record);
        }
        self.nodes_of(std::slice::from_ref(id))
            .await?
            .pop()
            .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))
    }

    async fn adjacent(&self, id: &NodeId, filter: &EdgeFilter) -> Result<Vec<GraphNode>> {
        tracing::trace!(%id, "surreal adjacent");
        if let Some(record) = self.evidence_record(id).await? {
            return self.nodes_of(&record.subject_ids()).await;
        }
        let row = self
            .entity_row(id)
            .await?
            .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))?;

        let mut out = Vec::new();
        if filter.is_all() {
            let mut ids: Vec<NodeId> = row.parent().cloned().into_iter().collect();
            ids.extend(self.child_rows(id).await?.iter().map(|r| r.id().clone()));
            out.extend(self.nodes_of(&ids).await?);
        }
        out.extend(self.attached_to(id, &filter.kinds()).await?);
        Ok(out)
    }
}
