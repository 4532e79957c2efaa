use super::{choose_id, skip_env, stamp_row, Outcome, Payload, Phase, Write};
use crate::error::{EngineError, EngineResult};
use crate::lookup::{self, Resolved};
use crate::merge::merge_page;
use graphsync_resource::{embedded, ComposePage, Identifiers, Ref, ResourceError, ResourceType};
use graphsync_store::{ComposeStore, Page};
use std::collections::HashMap;
use tracing::debug;

/// Encode state of a page node.
#[derive(Debug)]
pub(crate) struct PageState {
    phase: Phase,
    resolved: Resolved,
    namespace_id: u64,
    module_id: Option<u64>,
    parent_id: Option<u64>,
    /// Embedded module identifiers to IDs.
    modules: HashMap<String, u64>,
    /// Embedded chart identifiers to IDs.
    charts: HashMap<String, u64>,
    existing: Option<Page>,
}

impl PageState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(ResourceType::ComposePage),
            resolved: Resolved::default(),
            namespace_id: 0,
            module_id: None,
            parent_id: None,
            modules: HashMap::new(),
            charts: HashMap::new(),
            existing: None,
        }
    }

    pub(crate) fn prepare<S: ComposeStore>(
        &mut self,
        node: &ComposePage,
        pl: &Payload<'_, S>,
    ) -> EngineResult<()> {
        self.phase.begin_prepare()?;

        let ns = lookup::find_namespace(pl.store, pl.ctx, &node.ref_ns.identifiers)?
            .ok_or_else(|| node.ref_ns.unresolved())?;
        self.resolved.insert(&node.ref_ns, ns.id);
        self.namespace_id = ns.id;

        if let Some(r) = &node.ref_mod {
            self.module_id = Some(self.module(pl, r)?);
        }
        if let Some(r) = &node.ref_parent {
            let scope = self.resolved.scope(r)?;
            let parent = lookup::find_page(pl.store, pl.ctx, scope, &r.identifiers)?
                .ok_or_else(|| r.unresolved())?;
            self.parent_id = Some(parent.id);
        }

        for r in &node.mod_refs {
            let id = self.module(pl, r)?;
            for ident in r.identifiers.iter() {
                self.modules.insert(ident.to_string(), id);
            }
        }
        for r in &node.chart_refs {
            let scope = self.resolved.scope(r)?;
            let chart = lookup::find_chart(pl.store, pl.ctx, scope, &r.identifiers)?
                .ok_or_else(|| r.unresolved())?;
            for ident in r.identifiers.iter() {
                self.charts.insert(ident.to_string(), chart.id);
            }
        }

        self.existing = lookup::find_page_s(pl.store, ns.id, node.identifiers())?;
        debug!(
            identifiers = %node.identifiers(),
            embedded = self.modules.len() + self.charts.len(),
            exists = self.existing.is_some(),
            "page prepared"
        );

        self.phase.advance();
        Ok(())
    }

    fn module<S: ComposeStore>(&self, pl: &Payload<'_, S>, r: &Ref) -> EngineResult<u64> {
        let scope = self.resolved.scope(r)?;
        let m = lookup::find_module(pl.store, pl.ctx, scope, &r.identifiers)?
            .ok_or_else(|| r.unresolved())?;
        Ok(m.id)
    }

    /// Resolves an embedded identifier: prepared references first, then
    /// the graph context and the store.
    fn embedded_id<S: ComposeStore>(
        &self,
        pl: &Payload<'_, S>,
        resource_type: ResourceType,
        ident: &str,
    ) -> EngineResult<u64> {
        let known = match resource_type {
            ResourceType::ComposeChart => &self.charts,
            _ => &self.modules,
        };
        if let Some(id) = known.get(ident) {
            return Ok(*id);
        }

        let ii = Identifiers::from_values([ident]);
        let found = match resource_type {
            ResourceType::ComposeChart => {
                lookup::find_chart(pl.store, pl.ctx, self.namespace_id, &ii)?.map(|c| c.id)
            }
            _ => lookup::find_module(pl.store, pl.ctx, self.namespace_id, &ii)?.map(|m| m.id),
        };
        found.ok_or_else(|| EngineError::from(ResourceError::unresolved(resource_type, &ii)))
    }

    pub(crate) fn encode<S: ComposeStore>(
        &mut self,
        node: &mut ComposePage,
        pl: &Payload<'_, S>,
    ) -> EngineResult<Outcome> {
        self.phase.begin_encode()?;

        let existing = self.existing.as_ref();
        let mut res = node.res.clone();
        res.id = choose_id(pl.store, res.id, existing.map(|p| p.id));
        res.namespace_id = self.namespace_id;
        if let Some(id) = self.module_id {
            res.module_id = id;
        }
        if let Some(id) = self.parent_id {
            res.self_id = id;
        }
        stamp_row(
            node.base().timestamps(),
            &mut res.timestamps,
            existing.map(|p| &p.timestamps),
            pl.now,
        );

        let mut rewrites = 0;
        for block in &mut res.blocks {
            rewrites += embedded::rewrite(block, |rt, ident| self.embedded_id(pl, rt, ident))?;
        }
        debug!(identifiers = %node.identifiers(), rewrites, "page blocks rewritten");

        let env = skip_env(
            ResourceType::ComposePage,
            existing.is_some(),
            &res.handle,
            &res.title,
        );
        let write = Write {
            resource_type: ResourceType::ComposePage,
            identifiers: node.identifiers(),
            env,
            existing,
            incoming: res,
            merge: merge_page,
        };
        let (outcome, row) = write.persist(
            pl.config,
            |r| pl.store.create_page(r),
            |r| pl.store.update_page(r),
        )?;
        if let Some(row) = row {
            node.res = row;
        }

        self.phase.advance();
        Ok(outcome)
    }
}
