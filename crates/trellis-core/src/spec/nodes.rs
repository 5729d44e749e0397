//! Specs over entity nodes.

use serde::{Deserialize, Serialize};

use super::{field_eq, field_eq_ignore_case, Matches};
use crate::ontology::{
    Artifact, Builder, License, NodeId, Package, PackageLeaf, PackageLevel, Source, SourceLeaf,
    Vulnerability, VulnerabilityType,
};

// =============================================================================
// PACKAGES
// =============================================================================

/// Qualifier requirement. A `None` value only requires the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierSpec {
    pub key: String,
    pub value: Option<String>,
}

impl QualifierSpec {
    pub fn new(key: &str, value: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkgSpec {
    pub id: Option<NodeId>,
    pub pkg_type: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub subpath: Option<String>,
    /// Subset match: each entry must be present on the version.
    pub qualifiers: Vec<QualifierSpec>,
    /// `Some(true)` only matches versions without qualifiers.
    pub match_only_empty_qualifiers: Option<bool>,
}

impl PkgSpec {
    /// Whether the spec constrains the version level at all.
    pub fn targets_version(&self) -> bool {
        self.version.is_some()
            || self.subpath.is_some()
            || !self.qualifiers.is_empty()
            || self.match_only_empty_qualifiers == Some(true)
    }
}

impl Matches<PackageLeaf> for PkgSpec {
    fn matches(&self, leaf: &PackageLeaf) -> bool {
        if let Some(id) = &self.id {
            return leaf.contains(id);
        }
        if self.targets_version() && leaf.level != PackageLevel::Version {
            return false;
        }
        if !(field_eq(&self.pkg_type, Some(leaf.pkg_type.as_str()))
            && field_eq(&self.namespace, leaf.namespace.as_deref())
            && field_eq(&self.name, leaf.name.as_deref())
            && field_eq(&self.version, leaf.version.as_deref())
            && field_eq(&self.subpath, leaf.subpath.as_deref()))
        {
            return false;
        }
        if self.match_only_empty_qualifiers == Some(true) && !leaf.qualifiers.is_empty() {
            return false;
        }
        self.qualifiers.iter().all(|want| {
            leaf.qualifiers.iter().any(|q| {
                q.key == want.key && want.value.as_ref().map_or(true, |v| &q.value == v)
            })
        })
    }
}

impl Matches<Package> for PkgSpec {
    fn matches(&self, package: &Package) -> bool {
        package.leaves().iter().any(|leaf| self.matches(leaf))
    }
}

/// Spec over the name level only, used for dependency targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkgNameSpec {
    pub id: Option<NodeId>,
    pub pkg_type: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl Matches<PackageLeaf> for PkgNameSpec {
    fn matches(&self, leaf: &PackageLeaf) -> bool {
        if let Some(id) = &self.id {
            return leaf.contains(id);
        }
        field_eq(&self.pkg_type, Some(leaf.pkg_type.as_str()))
            && field_eq(&self.namespace, leaf.namespace.as_deref())
            && field_eq(&self.name, leaf.name.as_deref())
    }
}

impl Matches<Package> for PkgNameSpec {
    fn matches(&self, package: &Package) -> bool {
        package.leaves().iter().any(|leaf| self.matches(leaf))
    }
}

// =============================================================================
// SOURCES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    pub id: Option<NodeId>,
    pub src_type: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

impl Matches<SourceLeaf> for SourceSpec {
    fn matches(&self, leaf: &SourceLeaf) -> bool {
        if let Some(id) = &self.id {
            return leaf.contains(id);
        }
        field_eq(&self.src_type, Some(leaf.src_type.as_str()))
            && field_eq(&self.namespace, leaf.namespace.as_deref())
            && field_eq(&self.name, leaf.name.as_deref())
            && field_eq(&self.tag, leaf.tag.as_deref())
            && field_eq_ignore_case(&self.commit, leaf.commit.as_deref())
    }
}

impl Matches<Source> for SourceSpec {
    fn matches(&self, source: &Source) -> bool {
        source.leaves().iter().any(|leaf| self.matches(leaf))
    }
}

// =============================================================================
// FLAT NODES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSpec {
    pub id: Option<NodeId>,
    pub algorithm: Option<String>,
    pub digest: Option<String>,
}

impl Matches<Artifact> for ArtifactSpec {
    fn matches(&self, artifact: &Artifact) -> bool {
        if let Some(id) = &self.id {
            return &artifact.id == id;
        }
        field_eq_ignore_case(&self.algorithm, Some(artifact.algorithm.as_str()))
            && field_eq_ignore_case(&self.digest, Some(artifact.digest.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSpec {
    pub id: Option<NodeId>,
    pub uri: Option<String>,
}

impl Matches<Builder> for BuilderSpec {
    fn matches(&self, builder: &Builder) -> bool {
        if let Some(id) = &self.id {
            return &builder.id == id;
        }
        field_eq(&self.uri, Some(builder.uri.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilitySpec {
    pub id: Option<NodeId>,
    pub vuln_type: Option<VulnerabilityType>,
    pub vulnerability_id: Option<String>,
    /// `Some(true)` matches only the NoVuln sentinel, `Some(false)` only
    /// real vulnerabilities.
    pub no_vuln: Option<bool>,
}

impl Matches<Vulnerability> for VulnerabilitySpec {
    fn matches(&self, vuln: &Vulnerability) -> bool {
        if let Some(id) = &self.id {
            return &vuln.id == id;
        }
        if let Some(no_vuln) = self.no_vuln {
            if vuln.is_no_vuln() != no_vuln {
                return false;
            }
        }
        self.vuln_type.map_or(true, |t| t == vuln.vuln_type)
            && field_eq_ignore_case(&self.vulnerability_id, Some(vuln.vulnerability_id.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseSpec {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub inline: Option<String>,
    pub list_version: Option<String>,
}

impl Matches<License> for LicenseSpec {
    fn matches(&self, license: &License) -> bool {
        if let Some(id) = &self.id {
            return &license.id == id;
        }
        field_eq(&self.name, Some(license.name.as_str()))
            && field_eq(&self.inline, license.inline.as_deref())
            && field_eq(&self.list_version, license.list_version.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::PackageQualifier;

    fn leaf(qualifiers: Vec<PackageQualifier>) -> PackageLeaf {
        PackageLeaf {
            id: NodeId::from("v1"),
            level: PackageLevel::Version,
            chain: vec![
                NodeId::from("v1"),
                NodeId::from("n1"),
                NodeId::from("ns1"),
                NodeId::from("t1"),
            ],
            pkg_type: "deb".to_string(),
            namespace: Some("debian".to_string()),
            name: Some("curl".to_string()),
            version: Some("7.0".to_string()),
            subpath: Some(String::new()),
            qualifiers,
        }
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        assert!(PkgSpec::default().matches(&leaf(vec![])));
    }

    #[test]
    fn test_id_short_circuits_other_fields() {
        let spec = PkgSpec {
            id: Some(NodeId::from("n1")),
            name: Some("not-curl".to_string()),
            ..Default::default()
        };
        assert!(spec.matches(&leaf(vec![])));
    }

    #[test]
    fn test_qualifier_subset_match() {
        let record = leaf(vec![
            PackageQualifier::new("arch", "amd64"),
            PackageQualifier::new("distro", "jessie"),
        ]);
        let by_value = PkgSpec {
            qualifiers: vec![QualifierSpec::new("arch", Some("amd64"))],
            ..Default::default()
        };
        let key_only = PkgSpec {
            qualifiers: vec![QualifierSpec::new("distro", None)],
            ..Default::default()
        };
        let wrong = PkgSpec {
            qualifiers: vec![QualifierSpec::new("arch", Some("arm64"))],
            ..Default::default()
        };
        assert!(by_value.matches(&record));
        assert!(key_only.matches(&record));
        assert!(!wrong.matches(&record));
    }

    #[test]
    fn test_qualifier_missing_key_does_not_match() {
        let record = leaf(vec![
            PackageQualifier::new("a", "1"),
            PackageQualifier::new("b", "2"),
        ]);
        let extra_key = PkgSpec {
            qualifiers: vec![
                QualifierSpec::new("a", Some("1")),
                QualifierSpec::new("c", Some("3")),
            ],
            ..Default::default()
        };
        let extra_key_only = PkgSpec {
            qualifiers: vec![QualifierSpec::new("a", None), QualifierSpec::new("c", None)],
            ..Default::default()
        };
        let present_key_only = PkgSpec {
            qualifiers: vec![QualifierSpec::new("a", Some("1")), QualifierSpec::new("b", None)],
            ..Default::default()
        };
        assert!(!extra_key.matches(&record));
        assert!(!extra_key_only.matches(&record));
        assert!(present_key_only.matches(&record));
    }

    #[test]
    fn test_match_only_empty_qualifiers() {
        let spec = PkgSpec {
            match_only_empty_qualifiers: Some(true),
            ..Default::default()
        };
        assert!(spec.matches(&leaf(vec![])));
        assert!(!spec.matches(&leaf(vec![PackageQualifier::new("arch", "amd64")])));
    }

    #[test]
    fn test_artifact_digest_is_case_insensitive() {
        let spec = ArtifactSpec {
            digest: Some("ABC".to_string()),
            ..Default::default()
        };
        assert!(spec.matches(&Artifact::new("a1", "sha256", "abc")));
    }

    #[test]
    fn test_vulnerability_no_vuln_filter() {
        let clean = Vulnerability::new("v1", VulnerabilityType::NoVuln, "");
        let real = Vulnerability::new("v2", VulnerabilityType::Cve, "cve-2024-1");
        let only_real = VulnerabilitySpec {
            no_vuln: Some(false),
            ..Default::default()
        };
        assert!(!only_real.matches(&clean));
        assert!(only_real.matches(&real));
    }
}
