//! Graph query error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Which identity form failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Package,
    Source,
    Artifact,
    SubjectType,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Source => write!(f, "source"),
            Self::Artifact => write!(f, "artifact"),
            Self::SubjectType => write!(f, "subject type"),
        }
    }
}

/// Errors that can occur while resolving or traversing the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An identity string could not be decomposed.
    #[error("Malformed {kind} identity {input:?}: {reason}")]
    MalformedIdentity {
        kind: IdentityKind,
        input: String,
        reason: String,
    },

    /// A spec or id resolved to zero records.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A spec resolved to more than one record where uniqueness was required.
    #[error("Ambiguous subject: {what} matched {count} nodes")]
    AmbiguousSubject { what: String, count: usize },

    /// The storage backend failed or could not be reached.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The caller cancelled the request.
    #[error("Query cancelled")]
    Cancelled,

    /// The caller-supplied deadline elapsed.
    #[error("Query deadline exceeded")]
    DeadlineExceeded,

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GraphError {
    pub fn malformed(kind: IdentityKind, input: &str, reason: impl Into<String>) -> Self {
        GraphError::MalformedIdentity {
            kind,
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the errors raised when the caller gave up on the request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GraphError::Cancelled | GraphError::DeadlineExceeded)
    }

    /// True for `NotFound`, which callers treat as an ordinary empty result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}

impl From<surrealdb::Error> for GraphError {
    fn from(err: surrealdb::Error) -> Self {
        GraphError::BackendUnavailable(err.to_string())
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
