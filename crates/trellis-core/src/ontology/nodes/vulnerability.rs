//! Vulnerability and license nodes.

use serde::{Deserialize, Serialize};

use crate::ontology::NodeId;

/// Vulnerability identifier namespace.
///
/// `NoVuln` is the sentinel attached by a clean scan; it is never counted
/// together with real identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilityType {
    #[default]
    Osv,
    Cve,
    Ghsa,
    NoVuln,
}

impl VulnerabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Osv => "osv",
            Self::Cve => "cve",
            Self::Ghsa => "ghsa",
            Self::NoVuln => "novuln",
        }
    }
}

impl std::fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VulnerabilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "osv" => Ok(Self::Osv),
            "cve" => Ok(Self::Cve),
            "ghsa" => Ok(Self::Ghsa),
            "novuln" => Ok(Self::NoVuln),
            other => Err(format!("unknown vulnerability type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: NodeId,
    pub vuln_type: VulnerabilityType,
    /// Lower-cased; empty for `novuln`.
    pub vulnerability_id: String,
}

impl Vulnerability {
    pub fn new(id: impl Into<NodeId>, vuln_type: VulnerabilityType, vulnerability_id: &str) -> Self {
        let vulnerability_id = match vuln_type {
            VulnerabilityType::NoVuln => String::new(),
            _ => vulnerability_id.to_lowercase(),
        };
        Self {
            id: id.into(),
            vuln_type,
            vulnerability_id,
        }
    }

    pub fn is_no_vuln(&self) -> bool {
        self.vuln_type == VulnerabilityType::NoVuln
    }
}

impl std::fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_no_vuln() {
            f.write_str("novuln")
        } else {
            write!(f, "{}:{}", self.vuln_type, self.vulnerability_id)
        }
    }
}

/// A license, either an SPDX identifier or a `LicenseRef` with inline text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_version: Option<String>,
}
