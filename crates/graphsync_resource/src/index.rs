//! Identifier lookups over a resource graph.
//!
//! Every lookup walks the graph in order and returns the first node whose
//! identifiers intersect the query. Scoped lookups additionally require the
//! node to belong to the given namespace; a zero namespace ID matches any.

use crate::compose::ComposeRecord;
use crate::identifier::Identifiers;
use crate::resource::Resource;
use crate::types::ResourceType;
use graphsync_store::{Chart, Module, Namespace, Page};
use std::ops::{Deref, DerefMut};

/// Returns the first node of the kind matching the query.
pub fn find_first<'a>(
    rr: &'a [Resource],
    resource_type: ResourceType,
    ii: &Identifiers,
) -> Option<&'a Resource> {
    rr.iter()
        .find(|r| r.resource_type() == resource_type && r.identifiers().has_any(ii))
}

/// Returns the first namespace row matching the query.
pub fn find_namespace<'a>(rr: &'a [Resource], ii: &Identifiers) -> Option<&'a Namespace> {
    rr.iter().find_map(|r| match r {
        Resource::Namespace(n) if n.identifiers().has_any(ii) => Some(&n.res),
        _ => None,
    })
}

/// Returns the first module row of the namespace matching the query.
pub fn find_module<'a>(
    rr: &'a [Resource],
    namespace_id: u64,
    ii: &Identifiers,
) -> Option<&'a Module> {
    rr.iter().find_map(|r| match r {
        Resource::Module(n)
            if in_scope(namespace_id, n.res.namespace_id) && n.identifiers().has_any(ii) =>
        {
            Some(&n.res)
        }
        _ => None,
    })
}

/// Returns the first chart row of the namespace matching the query.
pub fn find_chart<'a>(
    rr: &'a [Resource],
    namespace_id: u64,
    ii: &Identifiers,
) -> Option<&'a Chart> {
    rr.iter().find_map(|r| match r {
        Resource::Chart(n)
            if in_scope(namespace_id, n.res.namespace_id) && n.identifiers().has_any(ii) =>
        {
            Some(&n.res)
        }
        _ => None,
    })
}

/// Returns the first page row of the namespace matching the query.
pub fn find_page<'a>(rr: &'a [Resource], namespace_id: u64, ii: &Identifiers) -> Option<&'a Page> {
    rr.iter().find_map(|r| match r {
        Resource::Page(n)
            if in_scope(namespace_id, n.res.namespace_id) && n.identifiers().has_any(ii) =>
        {
            Some(&n.res)
        }
        _ => None,
    })
}

fn in_scope(want: u64, have: u64) -> bool {
    want == 0 || want == have
}

/// An ordered collection of resource nodes.
#[derive(Debug, Default)]
pub struct ResourceSet(Vec<Resource>);

impl ResourceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn push(&mut self, r: impl Into<Resource>) {
        self.0.push(r.into());
    }

    /// Calls `f` for every node, in order, stopping at the first error.
    pub fn walk<E>(&self, mut f: impl FnMut(&Resource) -> Result<(), E>) -> Result<(), E> {
        self.0.iter().try_for_each(|r| f(r))
    }

    /// Iterates over the nodes of one kind.
    pub fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &Resource> {
        self.0
            .iter()
            .filter(move |r| r.resource_type() == resource_type)
    }

    /// Iterates over the record sets, mutably, so they can be walked.
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut ComposeRecord> {
        self.0.iter_mut().filter_map(|r| match r {
            Resource::Record(rr) => Some(rr),
            _ => None,
        })
    }

    /// Returns the first node of the kind matching the query.
    pub fn find_first(&self, resource_type: ResourceType, ii: &Identifiers) -> Option<&Resource> {
        find_first(&self.0, resource_type, ii)
    }

    /// Moves the nodes of `other` to the end of this set.
    pub fn append(&mut self, other: ResourceSet) {
        self.0.extend(other.0);
    }

    /// Returns the nodes.
    pub fn into_inner(self) -> Vec<Resource> {
        self.0
    }
}

impl Deref for ResourceSet {
    type Target = [Resource];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ResourceSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Resource>> for ResourceSet {
    fn from(rr: Vec<Resource>) -> Self {
        Self(rr)
    }
}

impl FromIterator<Resource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResourceSet {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
