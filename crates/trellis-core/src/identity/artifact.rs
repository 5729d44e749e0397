//! Artifact identities: `<algorithm>:<digest>`.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, IdentityKind, Result};
use crate::spec::ArtifactSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub algorithm: String,
    pub digest: String,
}

impl ArtifactCoordinate {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut parts = trimmed.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(algorithm), Some(digest), None) if !algorithm.is_empty() && !digest.is_empty() => {
                Ok(Self {
                    algorithm: algorithm.to_lowercase(),
                    digest: digest.to_lowercase(),
                })
            }
            _ => Err(GraphError::malformed(
                IdentityKind::Artifact,
                input,
                "expected '<algorithm>:<digest>'",
            )),
        }
    }

    pub fn to_spec(&self) -> ArtifactSpec {
        ArtifactSpec {
            id: None,
            algorithm: Some(self.algorithm.clone()),
            digest: Some(self.digest.clone()),
        }
    }
}

impl std::fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        let coord = ArtifactCoordinate::parse("SHA256:ABCDEF").unwrap();
        assert_eq!(coord.algorithm, "sha256");
        assert_eq!(coord.digest, "abcdef");
    }

    #[test]
    fn test_rejects_wrong_colon_count() {
        for input in ["sha256", "sha256:", ":abc", "sha256:ab:cd"] {
            assert!(ArtifactCoordinate::parse(input).is_err(), "{}", input);
        }
    }
}
