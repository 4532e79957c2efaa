//! Error types for the resource model.

use crate::identifier::Identifiers;
use crate::types::ResourceType;
use graphsync_store::StoreError;
use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors raised while building or resolving resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A required reference matched no node and no store row.
    #[error("unresolved reference of kind {resource_type} with identifiers {identifiers}")]
    Unresolved {
        /// Kind of the referenced resource.
        resource_type: ResourceType,
        /// The identifier query that failed to match.
        identifiers: Identifiers,
    },

    /// A reference was resolved before the reference that scopes it.
    #[error(
        "reference of kind {resource_type} with identifiers {identifiers} \
         resolved before its {constraint} constraint"
    )]
    ConstraintOutOfOrder {
        /// Kind of the constrained reference.
        resource_type: ResourceType,
        /// Identifiers of the constrained reference.
        identifiers: Identifiers,
        /// Kind of the constraining reference.
        constraint: ResourceType,
    },

    /// Embedded block options do not have the expected shape.
    #[error("malformed {block} block options: {reason}")]
    MalformedOptions {
        /// Block kind.
        block: String,
        /// What was wrong.
        reason: String,
    },

    /// Store failure while streaming resource rows.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResourceError {
    /// Creates an unresolved reference error.
    pub fn unresolved(resource_type: ResourceType, identifiers: &Identifiers) -> Self {
        Self::Unresolved {
            resource_type,
            identifiers: identifiers.clone(),
        }
    }

    /// Creates a malformed options error.
    pub fn malformed(block: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOptions {
            block: block.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for unresolved references.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResourceError::Unresolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_names_kind_and_identifiers() {
        let err = ResourceError::unresolved(
            ResourceType::ComposeModule,
            &Identifiers::from_values(["contacts", "Contacts"]),
        );
        assert_eq!(
            err.to_string(),
            "unresolved reference of kind compose:module with identifiers {contacts, Contacts}"
        );
        assert!(err.is_unresolved());
    }

    #[test]
    fn malformed_display() {
        let err = ResourceError::malformed("Calendar", "feeds is not a list");
        assert_eq!(
            err.to_string(),
            "malformed Calendar block options: feeds is not a list"
        );
        assert!(!err.is_unresolved());
    }
}
