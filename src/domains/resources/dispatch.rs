//! Dispatch policy.
//!
//! Decides, before any storage access, whether a request against a resource
//! kind is allowed and which empty target the storage layer should work on.
//!
//! Decisions are taken in a fixed order:
//! 1. resolve the kind from the path segment (unknown kind wins over anything else)
//! 2. reject writes when the server is read-only (before existence or body checks)
//! 3. build the empty target with the kind's factory

use std::fmt;

use http::{Method, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::definitions::ResourceWsDefinition;
use super::model::{Resource, ResourceList};
use super::registry::ResourceRegistry;
use crate::core::config::ApiServerConfig;

/// Operation requested against a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Verb {
    /// Map an HTTP method to a verb.
    ///
    /// `targets_item` tells whether the request path names a single resource
    /// (`/{kind}/{name}`) or the collection (`/{kind}`).
    pub fn from_method(method: &Method, targets_item: bool) -> Option<Self> {
        match (method, targets_item) {
            (&Method::GET, false) => Some(Self::List),
            (&Method::GET, true) => Some(Self::Get),
            (&Method::POST, false) => Some(Self::Create),
            (&Method::PUT, true) => Some(Self::Update),
            (&Method::DELETE, true) => Some(Self::Delete),
            _ => None,
        }
    }

    /// Whether the verb changes state.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was refused before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchRejection {
    /// No kind is registered under the path segment.
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    /// A write was attempted while the server is read-only.
    #[error("Server is in read-only mode, cannot {verb} {kind}")]
    ReadOnly { verb: Verb, kind: String },
}

impl DispatchRejection {
    /// HTTP status reported for the rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownKind(_) => StatusCode::NOT_FOUND,
            Self::ReadOnly { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// The empty value the storage layer populates or persists.
#[derive(Debug)]
pub enum Target {
    Instance(Box<dyn Resource>),
    Collection(Box<dyn ResourceList>),
}

/// An accepted request.
#[derive(Debug)]
pub struct Dispatch<'a> {
    pub definition: &'a ResourceWsDefinition,
    pub verb: Verb,
    pub target: Target,
}

/// Read-only-aware dispatch over a resource registry.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy<'a> {
    registry: &'a ResourceRegistry,
    config: &'a ApiServerConfig,
}

impl<'a> DispatchPolicy<'a> {
    pub fn new(registry: &'a ResourceRegistry, config: &'a ApiServerConfig) -> Self {
        Self { registry, config }
    }

    /// Decide what to do with `verb` against the kind served under `path`.
    pub fn decide(&self, verb: Verb, path: &str) -> Result<Dispatch<'a>, DispatchRejection> {
        let definition = self.registry.lookup(path).map_err(|_| {
            debug!(kind = path, %verb, "Rejected request for unknown resource kind");
            DispatchRejection::UnknownKind(path.to_string())
        })?;

        if verb.is_write() && self.config.read_only {
            debug!(kind = path, %verb, "Rejected write in read-only mode");
            return Err(DispatchRejection::ReadOnly {
                verb,
                kind: definition.path.clone(),
            });
        }

        let target = match verb {
            Verb::List => Target::Collection(definition.new_resource_list()),
            _ => Target::Instance(definition.new_resource()),
        };

        Ok(Dispatch {
            definition,
            verb,
            target,
        })
    }
}
