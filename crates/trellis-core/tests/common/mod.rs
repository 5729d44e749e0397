#![allow(dead_code)]

use std::sync::Arc;

use trellis_core::config::QueryConfig;
use trellis_core::ontology::{
    Artifact, CertifyGood, CertifyScorecard, CertifyVuln, DependencyType, HasSbom, HasSlsa,
    HasSourceAt, HashEqual, IsDependency, IsOccurrence, Package, PackageOrArtifact,
    PackageOrSource, PackageSourceOrArtifact, Scorecard, Source, Vulnerability, VulnerabilityType,
};
use trellis_core::{MemoryBackend, PackageCoordinate, SourceCoordinate, TrellisGraph};

/// A small graph around lodash 4.17.21:
///
/// - occurs as artifact `sha256:aaa`, which has an SBOM and a SLSA attestation
/// - `sha256:aaa` and `sha256:bbb` are hash-equal
/// - certified vulnerable to CVE-2021-23337 and clean against OSV
/// - depends on the minimist name
/// - built from github.com/lodash/lodash@v4.17.21, which has a scorecard
/// - the lodash name is certified good
pub struct Fixture {
    pub backend: Arc<MemoryBackend>,
    pub lodash: Package,
    pub lodash_old: Package,
    pub lodash_name: Package,
    pub minimist: Package,
    pub artifact: Artifact,
    pub twin: Artifact,
    pub source: Source,
    pub cve: Vulnerability,
}

impl Fixture {
    pub fn graph(&self) -> TrellisGraph {
        TrellisGraph::new(self.backend.clone(), QueryConfig::default())
    }
}

pub fn name_level(package: &Package) -> Package {
    let mut trimmed = package.clone();
    for ns in &mut trimmed.namespaces {
        for name in &mut ns.names {
            name.versions.clear();
        }
    }
    trimmed
}

pub async fn fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());

    let lodash = ingest_purl(&backend, "pkg:npm/lodash@4.17.21").await;
    let lodash_old = ingest_purl(&backend, "pkg:npm/lodash@4.17.20").await;
    let minimist = ingest_purl(&backend, "pkg:npm/minimist@1.2.8").await;
    let lodash_name = name_level(&lodash);

    let artifact = backend.ingest_artifact("sha256", "aaa").await.unwrap();
    let twin = backend.ingest_artifact("sha256", "bbb").await.unwrap();
    let builder = backend
        .ingest_builder("https://github.com/actions/runner")
        .await
        .unwrap();
    let source = backend
        .ingest_source(&SourceCoordinate::parse("git+https://github.com/lodash/lodash@v4.17.21").unwrap())
        .await
        .unwrap();
    let cve = backend
        .ingest_vulnerability(VulnerabilityType::Cve, "CVE-2021-23337")
        .await
        .unwrap();
    let no_vuln = backend
        .ingest_vulnerability(VulnerabilityType::NoVuln, "")
        .await
        .unwrap();

    backend
        .ingest_evidence(IsOccurrence {
            subject: PackageOrSource::Package(lodash.clone()),
            artifact: artifact.clone(),
            justification: "npm tarball".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(CertifyVuln {
            package: lodash.clone(),
            vulnerability: cve.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(CertifyVuln {
            package: lodash.clone(),
            vulnerability: no_vuln,
            origin: "osv".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(IsDependency {
            package: lodash.clone(),
            dependency_package: name_level(&minimist),
            version_range: "^1.2.0".to_string(),
            dependency_type: DependencyType::Direct,
            justification: "package.json".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(HasSourceAt {
            package: lodash.clone(),
            source: source.clone(),
            justification: "repository field".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(HasSbom {
            subject: PackageOrArtifact::Artifact(artifact.clone()),
            uri: "https://example.com/lodash.spdx.json".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(HasSlsa {
            subject: artifact.clone(),
            built_by: builder,
            built_from: vec![twin.clone()],
            build_type: "https://slsa.dev/container-based-build/v0.1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(HashEqual {
            artifacts: vec![artifact.clone(), twin.clone()],
            justification: "rebuilt".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(CertifyScorecard {
            source: source.clone(),
            scorecard: Scorecard {
                aggregate_score: 7.5,
                ..Default::default()
            },
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .ingest_evidence(CertifyGood {
            subject: PackageSourceOrArtifact::Package(lodash_name.clone()),
            justification: "maintained".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    Fixture {
        backend,
        lodash,
        lodash_old,
        lodash_name,
        minimist,
        artifact,
        twin,
        source,
        cve,
    }
}

pub async fn ingest_purl(backend: &MemoryBackend, purl: &str) -> Package {
    backend
        .ingest_package(&PackageCoordinate::parse(purl).unwrap())
        .await
        .unwrap()
}

/// Id of the name node of a single-branch package tree.
pub fn name_id(package: &Package) -> trellis_core::NodeId {
    package.namespaces[0].names[0].id.clone()
}
