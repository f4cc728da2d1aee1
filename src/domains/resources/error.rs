//! Resource-specific error types.

use thiserror::Error;

/// Errors raised while building, looking up or populating resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A resource of one kind was handed to a container of another kind.
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The spec of a resource could not be (de)serialized.
    #[error("Invalid {kind} spec: {source}")]
    InvalidSpec {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ResourceError {
    /// Create a new "kind mismatch" error.
    pub fn kind_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::KindMismatch { expected, actual }
    }

    /// Create a new "invalid spec" error.
    pub fn invalid_spec(kind: &'static str, source: serde_json::Error) -> Self {
        Self::InvalidSpec { kind, source }
    }
}

/// Errors raised by the resource definition registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A definition with the same path segment or display name already exists.
    #[error("Duplicate resource kind: {field} '{value}' is already registered")]
    DuplicateKind { field: &'static str, value: String },

    /// No resource kind is registered under the path segment.
    #[error("Unknown resource kind: {0}")]
    NotFound(String),

    /// The definition itself is malformed.
    #[error("Invalid resource definition: {0}")]
    InvalidDefinition(String),

    /// The registry no longer accepts registrations.
    #[error("Registry is sealed, cannot register '{0}'")]
    Sealed(String),
}

impl RegistryError {
    /// Create a new "duplicate kind" error.
    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        Self::DuplicateKind {
            field,
            value: value.into(),
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a new "invalid definition" error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }
}
