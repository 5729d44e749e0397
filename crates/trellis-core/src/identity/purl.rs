//! Package URL parsing and canonical re-encoding.
//!
//! `pkg:<type>/<namespace...>/<name>@<version>?<qualifiers>#<subpath>`

use std::collections::BTreeSet;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, IdentityKind, Result};
use crate::ontology::PackageQualifier;
use crate::spec::{PkgSpec, QualifierSpec};

/// Characters escaped inside a single purl component.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Qualifier values additionally escape `=` and `+`.
const QUALIFIER_VALUE: &AsciiSet = &COMPONENT.add(b'=').add(b'+');

/// A decomposed package identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCoordinate {
    pub pkg_type: String,
    pub namespace: String,
    pub name: String,
    pub version: Option<String>,
    pub subpath: Option<String>,
    /// Sorted by key, no empty values.
    pub qualifiers: Vec<PackageQualifier>,
}

impl PackageCoordinate {
    /// Parse a purl.
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| GraphError::malformed(IdentityKind::Package, input, reason);

        let trimmed = input.trim();
        let rest = match trimmed.split_once(':') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("pkg") => rest,
            _ => return Err(malformed("missing 'pkg:' scheme")),
        };
        let rest = rest.trim_start_matches('/');

        let (rest, subpath) = match rest.split_once('#') {
            Some((rest, subpath)) => (rest, parse_subpath(input, subpath)?),
            None => (rest, None),
        };

        let (rest, qualifiers) = match rest.split_once('?') {
            Some((rest, query)) => (rest, parse_qualifiers(input, query)?),
            None => (rest, Vec::new()),
        };

        let rest = rest.trim_end_matches('/');
        let (pkg_type, path) = rest
            .split_once('/')
            .ok_or_else(|| malformed("expected '<type>/<name>'"))?;
        let pkg_type = pkg_type.to_lowercase();
        if pkg_type.is_empty() {
            return Err(malformed("empty package type"));
        }

        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.pop().ok_or_else(|| malformed("missing package name"))?;

        let (raw_name, raw_version) = match last.rsplit_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (last, None),
        };
        let mut name = decode(input, raw_name)?;
        if name.is_empty() {
            return Err(malformed("missing package name"));
        }
        let version = match raw_version {
            Some(v) => Some(decode(input, v)?).filter(|v| !v.is_empty()),
            None => None,
        };

        let mut namespace = segments
            .iter()
            .map(|s| decode(input, s))
            .collect::<Result<Vec<_>>>()?
            .join("/");

        match pkg_type.as_str() {
            "github" | "bitbucket" => {
                namespace = namespace.to_lowercase();
                name = name.to_lowercase();
            }
            "pypi" => {
                name = name.to_lowercase().replace('_', "-");
            }
            _ => {}
        }

        Ok(Self {
            pkg_type,
            namespace,
            name,
            version,
            subpath,
            qualifiers,
        })
    }

    /// Canonical purl form.
    pub fn to_purl(&self) -> String {
        let mut out = format!("pkg:{}/", self.pkg_type);
        for segment in self.namespace.split('/').filter(|s| !s.is_empty()) {
            out.push_str(&utf8_percent_encode(segment, COMPONENT).to_string());
            out.push('/');
        }
        out.push_str(&utf8_percent_encode(&self.name, COMPONENT).to_string());

        if let Some(version) = &self.version {
            out.push('@');
            out.push_str(&utf8_percent_encode(version, COMPONENT).to_string());
        }

        if !self.qualifiers.is_empty() {
            let pairs: Vec<String> = self
                .qualifiers
                .iter()
                .map(|q| format!("{}={}", q.key, utf8_percent_encode(&q.value, QUALIFIER_VALUE)))
                .collect();
            out.push('?');
            out.push_str(&pairs.join("&"));
        }

        if let Some(subpath) = &self.subpath {
            let segments: Vec<String> = subpath
                .split('/')
                .map(|s| utf8_percent_encode(s, COMPONENT).to_string())
                .collect();
            out.push('#');
            out.push_str(&segments.join("/"));
        }
        out
    }

    /// Spec addressing this coordinate.
    ///
    /// Without a version the spec addresses the name level. With one it
    /// addresses exactly one version node, so qualifiers and subpath are
    /// pinned as well.
    pub fn to_spec(&self) -> PkgSpec {
        let mut spec = PkgSpec {
            pkg_type: Some(self.pkg_type.clone()),
            namespace: Some(self.namespace.clone()),
            name: Some(self.name.clone()),
            ..Default::default()
        };
        if let Some(version) = &self.version {
            spec.version = Some(version.clone());
            spec.subpath = Some(self.subpath.clone().unwrap_or_default());
            spec.qualifiers = self
                .qualifiers
                .iter()
                .map(|q| QualifierSpec::new(&q.key, Some(q.value.as_str())))
                .collect();
            spec.match_only_empty_qualifiers = Some(self.qualifiers.is_empty());
        }
        spec
    }
}

impl std::fmt::Display for PackageCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_purl())
    }
}

fn decode(input: &str, raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| GraphError::malformed(IdentityKind::Package, input, "invalid percent-encoding"))
}

fn parse_qualifiers(input: &str, query: &str) -> Result<Vec<PackageQualifier>> {
    let mut qualifiers = Vec::new();
    let mut seen = BTreeSet::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            GraphError::malformed(IdentityKind::Package, input, format!("qualifier '{}' has no '='", pair))
        })?;
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(GraphError::malformed(IdentityKind::Package, input, "empty qualifier key"));
        }
        if !seen.insert(key.clone()) {
            return Err(GraphError::malformed(IdentityKind::Package, input, "duplicate qualifier key"));
        }
        let value = decode(input, value)?;
        if value.is_empty() {
            continue;
        }
        qualifiers.push(PackageQualifier::new(key, value));
    }
    qualifiers.sort();
    Ok(qualifiers)
}

fn parse_subpath(input: &str, raw: &str) -> Result<Option<String>> {
    let segments = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| decode(input, s))
        .collect::<Result<Vec<String>>>()?;
    Ok((!segments.is_empty()).then(|| segments.join("/")))
}
