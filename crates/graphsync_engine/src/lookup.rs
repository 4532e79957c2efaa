//! Reference resolution against the graph context and the store.
//!
//! Lookups first search the nodes already encoded in the current run and
//! fall back to the store, scoped by the namespace the reference is
//! constrained to. A numeric identifier is tried as an ID first; other
//! identifiers are tried as handle, then as name.

use graphsync_resource::{
    index, Identifiers, Ref, Resource, ResourceError, ResourceResult, ResourceType,
};
use graphsync_store::{
    Chart, ComposeStore, Module, ModuleFieldFilter, Namespace, Page, StoreResult, User,
    UserFilter,
};

/// IDs resolved so far for one node, used to scope constrained references.
#[derive(Debug, Default)]
pub(crate) struct Resolved(Vec<(Ref, u64)>);

impl Resolved {
    pub(crate) fn insert(&mut self, r: &Ref, id: u64) {
        self.0.push((r.clone(), id));
    }

    /// Returns the namespace ID a reference is scoped to, zero when it has
    /// no namespace constraint.
    ///
    /// Fails when a constraint has not been resolved yet.
    pub(crate) fn scope(&self, r: &Ref) -> ResourceResult<u64> {
        let mut namespace_id = 0;
        for c in &r.constraints {
            let id = self
                .0
                .iter()
                .find(|(done, _)| done.matches(c.resource_type, &c.identifiers))
                .map(|(_, id)| *id)
                .ok_or_else(|| ResourceError::ConstraintOutOfOrder {
                    resource_type: r.resource_type,
                    identifiers: r.identifiers.clone(),
                    constraint: c.resource_type,
                })?;
            if c.resource_type == ResourceType::ComposeNamespace {
                namespace_id = id;
            }
        }
        Ok(namespace_id)
    }
}

fn persisted<'a, T>(row: Option<&'a T>, id: impl Fn(&T) -> u64) -> Option<&'a T> {
    row.filter(|r| id(r) > 0)
}

/// Resolves a namespace reference through the context, then the store.
pub(crate) fn find_namespace<S: ComposeStore>(
    store: &S,
    ctx: &[Resource],
    ii: &Identifiers,
) -> StoreResult<Option<Namespace>> {
    if let Some(ns) = persisted(index::find_namespace(ctx, ii), |n| n.id) {
        return Ok(Some(ns.clone()));
    }
    find_namespace_s(store, ii)
}

/// Looks a namespace up in the store.
pub(crate) fn find_namespace_s<S: ComposeStore>(
    store: &S,
    ii: &Identifiers,
) -> StoreResult<Option<Namespace>> {
    for id in ii.numeric() {
        if let Some(ns) = store.lookup_namespace_by_id(id)? {
            return Ok(Some(ns));
        }
    }
    for slug in ii.iter() {
        if let Some(ns) = store.lookup_namespace_by_slug(slug)? {
            return Ok(Some(ns));
        }
    }
    Ok(None)
}

/// Resolves a module reference, with fields, through the context, then
/// the store.
pub(crate) fn find_module<S: ComposeStore>(
    store: &S,
    ctx: &[Resource],
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Module>> {
    if let Some(m) = persisted(index::find_module(ctx, namespace_id, ii), |m| m.id) {
        return Ok(Some(m.clone()));
    }
    find_module_s(store, namespace_id, ii)
}

/// Looks a module up in the store and attaches its fields.
pub(crate) fn find_module_s<S: ComposeStore>(
    store: &S,
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Module>> {
    let Some(mut module) = lookup_module(store, namespace_id, ii)? else {
        return Ok(None);
    };
    module.fields = store.search_module_fields(&ModuleFieldFilter {
        module_id: vec![module.id],
    })?;
    Ok(Some(module))
}

fn lookup_module<S: ComposeStore>(
    store: &S,
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Module>> {
    for id in ii.numeric() {
        if let Some(m) = store.lookup_module_by_id(id)? {
            if namespace_id == 0 || m.namespace_id == namespace_id {
                return Ok(Some(m));
            }
        }
    }
    for v in ii.iter() {
        if let Some(m) = store.lookup_module_by_namespace_handle(namespace_id, v)? {
            return Ok(Some(m));
        }
    }
    for v in ii.iter() {
        if let Some(m) = store.lookup_module_by_namespace_name(namespace_id, v)? {
            return Ok(Some(m));
        }
    }
    Ok(None)
}

/// Resolves a chart reference through the context, then the store.
pub(crate) fn find_chart<S: ComposeStore>(
    store: &S,
    ctx: &[Resource],
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Chart>> {
    if let Some(c) = persisted(index::find_chart(ctx, namespace_id, ii), |c| c.id) {
        return Ok(Some(c.clone()));
    }
    find_chart_s(store, namespace_id, ii)
}

/// Looks a chart up in the store.
pub(crate) fn find_chart_s<S: ComposeStore>(
    store: &S,
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Chart>> {
    for id in ii.numeric() {
        if let Some(c) = store.lookup_chart_by_id(id)? {
            if namespace_id == 0 || c.namespace_id == namespace_id {
                return Ok(Some(c));
            }
        }
    }
    for v in ii.iter() {
        if let Some(c) = store.lookup_chart_by_namespace_handle(namespace_id, v)? {
            return Ok(Some(c));
        }
    }
    Ok(None)
}

/// Resolves a page reference through the context, then the store.
pub(crate) fn find_page<S: ComposeStore>(
    store: &S,
    ctx: &[Resource],
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Page>> {
    if let Some(p) = persisted(index::find_page(ctx, namespace_id, ii), |p| p.id) {
        return Ok(Some(p.clone()));
    }
    find_page_s(store, namespace_id, ii)
}

/// Looks a page up in the store.
pub(crate) fn find_page_s<S: ComposeStore>(
    store: &S,
    namespace_id: u64,
    ii: &Identifiers,
) -> StoreResult<Option<Page>> {
    for id in ii.numeric() {
        if let Some(p) = store.lookup_page_by_id(id)? {
            if namespace_id == 0 || p.namespace_id == namespace_id {
                return Ok(Some(p));
            }
        }
    }
    for v in ii.iter() {
        if let Some(p) = store.lookup_page_by_namespace_handle(namespace_id, v)? {
            return Ok(Some(p));
        }
    }
    Ok(None)
}

/// Loads every user, following pagination.
pub(crate) fn all_users<S: ComposeStore>(store: &S) -> StoreResult<Vec<User>> {
    let mut filter = UserFilter::default();
    let mut out = Vec::new();
    loop {
        let page = store.search_users(&filter)?;
        out.extend(page.rows);
        match page.next_cursor {
            Some(c) => filter.paging.page_cursor = Some(c),
            None => return Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_resource::ComposeModule;
    use graphsync_store::{InMemoryStore, ModuleField, ModuleStore, NamespaceStore};

    fn store() -> InMemoryStore {
        let s = InMemoryStore::new();
        for (id, slug) in [(1, "crm"), (2, "hr")] {
            s.create_namespace(&Namespace {
                id,
                slug: slug.into(),
                ..Default::default()
            })
            .unwrap();
        }
        for (id, ns) in [(10, 1), (20, 2)] {
            s.create_module(&Module {
                id,
                namespace_id: ns,
                handle: "contacts".into(),
                name: "Contacts".into(),
                fields: vec![ModuleField {
                    id: id + 1,
                    name: "email".into(),
                    ..Default::default()
                }],
                ..Default::default()
            })
            .unwrap();
        }
        s
    }

    #[test]
    fn store_lookups_are_scoped() {
        let s = store();
        let ii = Identifiers::from_values(["contacts"]);
        let m = find_module_s(&s, 2, &ii).unwrap().unwrap();
        assert_eq!(m.id, 20);
        assert_eq!(m.fields.len(), 1);

        // ID lookups still honour the scope
        let by_id = Identifiers::from_values(["10"]);
        assert!(find_module_s(&s, 2, &by_id).unwrap().is_none());
        assert_eq!(find_module_s(&s, 1, &by_id).unwrap().map(|m| m.id), Some(10));

        let by_name = Identifiers::from_values(["Contacts"]);
        assert_eq!(find_module_s(&s, 1, &by_name).unwrap().map(|m| m.id), Some(10));
    }

    #[test]
    fn context_is_searched_before_the_store() {
        let s = store();
        let ctx = vec![Resource::from(ComposeModule::from_store(Module {
            id: 77,
            namespace_id: 1,
            handle: "contacts".into(),
            ..Default::default()
        }))];
        let ii = Identifiers::from_values(["contacts"]);
        assert_eq!(find_module(&s, &ctx, 1, &ii).unwrap().map(|m| m.id), Some(77));
        assert_eq!(find_module(&s, &ctx, 2, &ii).unwrap().map(|m| m.id), Some(20));
    }

    #[test]
    fn unpersisted_context_nodes_are_ignored() {
        let s = store();
        let ctx = vec![Resource::from(ComposeModule::from_store(Module {
            namespace_id: 1,
            handle: "contacts".into(),
            ..Default::default()
        }))];
        let ii = Identifiers::from_values(["contacts"]);
        assert_eq!(find_module(&s, &ctx, 1, &ii).unwrap().map(|m| m.id), Some(10));
    }

    #[test]
    fn namespace_by_id_or_slug() {
        let s = store();
        assert_eq!(
            find_namespace_s(&s, &Identifiers::from_values(["2"])).unwrap().map(|n| n.slug),
            Some("hr".to_string())
        );
        assert_eq!(
            find_namespace(&s, &[], &Identifiers::from_values(["crm"]))
                .unwrap()
                .map(|n| n.id),
            Some(1)
        );
        assert!(find_namespace_s(&s, &Identifiers::new()).unwrap().is_none());
    }

    #[test]
    fn constraints_must_be_resolved_first() {
        let ns = Ref::new(
            ResourceType::ComposeNamespace,
            Identifiers::from_values(["crm"]),
        );
        let module = Ref::new(
            ResourceType::ComposeModule,
            Identifiers::from_values(["contacts"]),
        )
        .constraint(&ns);

        let mut resolved = Resolved::default();
        assert!(matches!(
            resolved.scope(&module),
            Err(ResourceError::ConstraintOutOfOrder { .. })
        ));

        resolved.insert(&ns, 1);
        assert_eq!(resolved.scope(&module).unwrap(), 1);
        assert_eq!(resolved.scope(&ns).unwrap(), 0);
    }
}
