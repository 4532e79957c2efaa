//! Symbolic references between resources.

use crate::error::ResourceError;
use crate::identifier::Identifiers;
use crate::types::ResourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbolic pointer from one resource to another.
///
/// A reference may be constrained by other references; it then only
/// resolves within the scope of the resources its constraints resolved to.
/// A module reference constrained by a namespace reference only matches
/// modules of that namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Kind of the referenced resource.
    pub resource_type: ResourceType,
    /// Names the referenced resource is known by.
    pub identifiers: Identifiers,
    /// References scoping this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Ref>,
}

impl Ref {
    /// Creates an unconstrained reference.
    pub fn new(resource_type: ResourceType, identifiers: Identifiers) -> Self {
        Self {
            resource_type,
            identifiers,
            constraints: Vec::new(),
        }
    }

    /// Scopes this reference by another one.
    #[must_use]
    pub fn constraint(mut self, other: &Ref) -> Self {
        self.constraints.push(Ref::new(other.resource_type, other.identifiers.clone()));
        self
    }

    /// Returns the constraint of the given kind.
    pub fn constraint_of(&self, resource_type: ResourceType) -> Option<&Ref> {
        self.constraints
            .iter()
            .find(|c| c.resource_type == resource_type)
    }

    /// Returns true when the reference points at `resource_type` and shares
    /// an identifier with `identifiers`.
    pub fn matches(&self, resource_type: ResourceType, identifiers: &Identifiers) -> bool {
        self.resource_type == resource_type && self.identifiers.has_any(identifiers)
    }

    /// Returns the unresolved error for this reference.
    pub fn unresolved(&self) -> ResourceError {
        ResourceError::unresolved(self.resource_type, &self.identifiers)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource_type, self.identifiers)
    }
}

/// A list of references.
pub type RefSet = Vec<Ref>;
