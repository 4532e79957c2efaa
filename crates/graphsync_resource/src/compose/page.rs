use crate::embedded;
use crate::error::ResourceResult;
use crate::identifier::Identifiers;
use crate::reference::Ref;
use crate::resource::{node_base, ResourceBase};
use crate::stamps::Timestamps;
use crate::types::ResourceType;
use graphsync_store::Page;

/// A page node.
///
/// Besides its first-class references, a page collects the module and
/// chart references embedded in its block options so they can be resolved
/// together with the rest of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposePage {
    pub(crate) base: ResourceBase,
    /// The page row.
    pub res: Page,
    /// Owning namespace.
    pub ref_ns: Ref,
    /// Module of a record page.
    pub ref_mod: Option<Ref>,
    /// Parent page.
    pub ref_parent: Option<Ref>,
    /// Modules referenced from block options.
    pub mod_refs: Vec<Ref>,
    /// Charts referenced from block options.
    pub chart_refs: Vec<Ref>,
}

impl ComposePage {
    /// Wraps a page row declared under the given namespace.
    ///
    /// Fails when a block's options do not have the shape its kind
    /// requires.
    pub fn new(
        res: Page,
        namespace: Identifiers,
        module: Option<Identifiers>,
        parent: Option<Identifiers>,
    ) -> ResourceResult<Self> {
        let mut base = ResourceBase::new(Identifiers::for_row(&res.handle, &res.title, res.id));
        base.timestamps = Timestamps::from_row(&res.timestamps);

        let ref_ns = Ref::new(ResourceType::ComposeNamespace, namespace);
        let scoped = |rt, ii| Ref::new(rt, ii).constraint(&ref_ns);

        let ref_mod = module
            .filter(|ii| !ii.is_empty())
            .map(|ii| scoped(ResourceType::ComposeModule, ii));
        let ref_parent = parent
            .filter(|ii| !ii.is_empty())
            .map(|ii| scoped(ResourceType::ComposePage, ii));

        let mut mod_refs: Vec<Ref> = Vec::new();
        let mut chart_refs: Vec<Ref> = Vec::new();
        for block in &res.blocks {
            for er in embedded::collect(block)? {
                let target = match er.resource_type {
                    ResourceType::ComposeChart => &mut chart_refs,
                    _ => &mut mod_refs,
                };
                if target.iter().any(|r| r.identifiers.contains(&er.identifier)) {
                    continue;
                }
                target.push(scoped(
                    er.resource_type,
                    Identifiers::from_values([er.identifier]),
                ));
            }
        }

        Ok(Self {
            base,
            res,
            ref_ns,
            ref_mod,
            ref_parent,
            mod_refs,
            chart_refs,
        })
    }

    /// Wraps a stored page row, referencing related rows by ID.
    pub fn from_store(res: Page) -> ResourceResult<Self> {
        let ns = Identifiers::for_row("", "", res.namespace_id);
        let module = (res.module_id > 0).then(|| Identifiers::for_row("", "", res.module_id));
        let parent = (res.self_id > 0).then(|| Identifiers::for_row("", "", res.self_id));
        Self::new(res, ns, module, parent)
    }
}

node_base!(ComposePage);

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_store::PageBlock;
    use serde_json::json;

    fn block(kind: &str, options: serde_json::Value) -> PageBlock {
        PageBlock {
            kind: kind.into(),
            options: options.as_object().cloned().unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn collects_embedded_refs_once() {
        let page = ComposePage::new(
            Page {
                handle: "home".into(),
                blocks: vec![
                    block("RecordList", json!({"module": "contacts"})),
                    block("RecordOrganizer", json!({"module": "contacts"})),
                    block("Chart", json!({"chart": "pipeline"})),
                ],
                ..Default::default()
            },
            Identifiers::from_values(["crm"]),
            None,
            Some(Identifiers::new()),
        )
        .unwrap();

        assert_eq!(page.mod_refs.len(), 1);
        assert_eq!(page.chart_refs.len(), 1);
        assert!(page.ref_parent.is_none());
        assert!(page.mod_refs[0]
            .constraint_of(ResourceType::ComposeNamespace)
            .is_some());
    }

    #[test]
    fn stored_page_refs_follow_ids() {
        let page = ComposePage::from_store(Page {
            id: 30,
            namespace_id: 3,
            module_id: 9,
            self_id: 29,
            handle: "contact".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(page.ref_mod.unwrap().identifiers.to_string(), "{9}");
        assert_eq!(page.ref_parent.unwrap().identifiers.to_string(), "{29}");
    }

    #[test]
    fn malformed_block_fails_construction() {
        let res = ComposePage::new(
            Page {
                blocks: vec![block("Metric", json!({"metrics": 5}))],
                ..Default::default()
            },
            Identifiers::from_values(["crm"]),
            None,
            None,
        );
        assert!(res.is_err());
    }
}
