//! Error types for the sync engine.

use crate::decode::DecodeOutput;
use graphsync_resource::{Identifiers, ResourceError, ResourceType};
use graphsync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while decoding or encoding a resource graph.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Store failure, propagated verbatim.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resource model failure, including unresolved references.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Nodes reference each other in a cycle.
    #[error("cyclic reference between {resource_type} nodes with identifiers {identifiers}")]
    CyclicReference {
        /// Kind of the nodes in the cycle.
        resource_type: ResourceType,
        /// Identifiers of a node in the cycle.
        identifiers: Identifiers,
    },

    /// A node was encoded before it was prepared.
    #[error("cannot {op} {resource_type} node in phase {phase}")]
    InvalidPhase {
        /// Kind of the node.
        resource_type: ResourceType,
        /// Attempted operation.
        op: &'static str,
        /// Current phase.
        phase: &'static str,
    },

    /// A record carries a value for a field its module does not declare.
    #[error("module {module} has no field {field}")]
    UnknownField {
        /// Module handle.
        module: String,
        /// Field name.
        field: String,
    },

    /// The skip predicate could not be parsed.
    #[error("invalid skip expression {expr:?}: {reason}")]
    SkipExpression {
        /// The expression.
        expr: String,
        /// What was wrong.
        reason: String,
    },

    /// Decoding stopped early; the nodes decoded so far are kept.
    #[error("decode aborted after {} resources: {source}", .partial.resources.len())]
    PartialDecode {
        /// Nodes decoded before the failure.
        partial: Box<DecodeOutput>,
        /// The failure.
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Returns true for unresolved references, also when wrapped in a
    /// partial decode.
    pub fn is_unresolved(&self) -> bool {
        match self {
            EngineError::Resource(e) => e.is_unresolved(),
            EngineError::PartialDecode { source, .. } => source.is_unresolved(),
            _ => false,
        }
    }

    /// Returns the underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            EngineError::Store(e) => Some(e),
            EngineError::Resource(ResourceError::Store(e)) => Some(e),
            EngineError::PartialDecode { source, .. } => source.store_error(),
            _ => None,
        }
    }
}
