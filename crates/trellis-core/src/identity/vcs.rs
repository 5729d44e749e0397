//! VCS source URL parsing: `<tool>+<transport>://<host>/<path...>/<name>[@ref]`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GraphError, IdentityKind, Result};
use crate::spec::SourceSpec;

/// A decomposed source identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoordinate {
    /// VCS tool, e.g. `git`.
    pub src_type: String,
    /// Host plus intermediate path, e.g. `github.com/guacsec`.
    pub namespace: String,
    pub name: String,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

impl SourceCoordinate {
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| GraphError::malformed(IdentityKind::Source, input, reason);

        let (tool, location) = input
            .trim()
            .split_once('+')
            .ok_or_else(|| malformed("missing '+' between tool and transport"))?;
        if tool.is_empty() {
            return Err(malformed("empty VCS tool"));
        }

        let url = Url::parse(location).map_err(|e| malformed(&e.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| malformed("missing host"))?;

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let last = segments.pop().ok_or_else(|| malformed("missing repository name"))?;

        let (name, reference) = match last.split_once('@') {
            Some((name, reference)) => (name, Some(reference).filter(|r| !r.is_empty())),
            None => (last, None),
        };
        if name.is_empty() {
            return Err(malformed("missing repository name"));
        }

        let mut namespace = host.to_string();
        for segment in segments {
            namespace.push('/');
            namespace.push_str(segment);
        }

        let (tag, commit) = match reference {
            Some(r) if is_commit_hash(r) => (None, Some(r.to_lowercase())),
            Some(r) => (Some(r.to_string()), None),
            None => (None, None),
        };

        Ok(Self {
            src_type: tool.to_lowercase(),
            namespace,
            name: name.to_string(),
            tag,
            commit,
        })
    }

    /// Re-encode with an https transport.
    pub fn to_vcs(&self) -> String {
        let mut out = format!("{}+https://{}/{}", self.src_type, self.namespace, self.name);
        if let Some(commit) = &self.commit {
            out.push('@');
            out.push_str(commit);
        } else if let Some(tag) = &self.tag {
            out.push('@');
            out.push_str(tag);
        }
        out
    }

    pub fn to_spec(&self) -> SourceSpec {
        SourceSpec {
            src_type: Some(self.src_type.clone()),
            namespace: Some(self.namespace.clone()),
            name: Some(self.name.clone()),
            tag: self.tag.clone(),
            commit: self.commit.clone(),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for SourceCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_vcs())
    }
}

/// SHA-1 or SHA-256 hex digest.
fn is_commit_hash(r: &str) -> bool {
    (r.len() == 40 || r.len() == 64) && r.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_source() {
        let coord = SourceCoordinate::parse("git+https://github.com/guacsec/guac@v0.1.0").unwrap();
        assert_eq!(coord.src_type, "git");
        assert_eq!(coord.namespace, "github.com/guacsec");
        assert_eq!(coord.name, "guac");
        assert_eq!(coord.tag.as_deref(), Some("v0.1.0"));
        assert!(coord.commit.is_none());
    }

    #[test]
    fn test_forty_hex_ref_is_commit() {
        let coord = SourceCoordinate::parse(
            "git+https://github.com/kubernetes/kubernetes@5835544ca568b757a8ecae5c153f317e5736700e",
        )
        .unwrap();
        assert!(coord.tag.is_none());
        assert_eq!(
            coord.commit.as_deref(),
            Some("5835544ca568b757a8ecae5c153f317e5736700e")
        );
    }

    #[test]
    fn test_nested_namespace() {
        let coord = SourceCoordinate::parse("git+ssh://gitlab.com/group/sub/project").unwrap();
        assert_eq!(coord.namespace, "gitlab.com/group/sub");
        assert_eq!(coord.name, "project");
    }

    #[test]
    fn test_rejects_missing_separator_or_name() {
        assert!(SourceCoordinate::parse("https://github.com/guacsec/guac").is_err());
        assert!(SourceCoordinate::parse("git+https://github.com/").is_err());
    }

    #[test]
    fn test_to_vcs_round_trip() {
        let input = "git+https://github.com/guacsec/guac@v0.1.0";
        assert_eq!(SourceCoordinate::parse(input).unwrap().to_vcs(), input);
    }
}
