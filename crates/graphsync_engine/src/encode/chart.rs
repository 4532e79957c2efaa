use super::{choose_id, skip_env, stamp_row, Outcome, Payload, Phase, Write};
use crate::error::EngineResult;
use crate::lookup::{self, Resolved};
use crate::merge::merge_chart;
use graphsync_resource::{ComposeChart, ResourceType};
use graphsync_store::{Chart, ComposeStore};
use tracing::debug;

/// Encode state of a chart node.
#[derive(Debug)]
pub(crate) struct ChartState {
    phase: Phase,
    resolved: Resolved,
    namespace_id: u64,
    /// Module ID of each report, by position.
    module_ids: Vec<u64>,
    existing: Option<Chart>,
}

impl ChartState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(ResourceType::ComposeChart),
            resolved: Resolved::default(),
            namespace_id: 0,
            module_ids: Vec::new(),
            existing: None,
        }
    }

    pub(crate) fn prepare<S: ComposeStore>(
        &mut self,
        node: &ComposeChart,
        pl: &Payload<'_, S>,
    ) -> EngineResult<()> {
        self.phase.begin_prepare()?;

        let ns = lookup::find_namespace(pl.store, pl.ctx, &node.ref_ns.identifiers)?
            .ok_or_else(|| node.ref_ns.unresolved())?;
        self.resolved.insert(&node.ref_ns, ns.id);
        self.namespace_id = ns.id;

        for r in &node.ref_mods {
            // Reports without a module keep a zero module ID
            if r.identifiers.is_empty() {
                self.module_ids.push(0);
                continue;
            }
            let scope = self.resolved.scope(r)?;
            let m = lookup::find_module(pl.store, pl.ctx, scope, &r.identifiers)?
                .ok_or_else(|| r.unresolved())?;
            self.module_ids.push(m.id);
        }

        self.existing = lookup::find_chart_s(pl.store, ns.id, node.identifiers())?;
        debug!(
            identifiers = %node.identifiers(),
            reports = self.module_ids.len(),
            exists = self.existing.is_some(),
            "chart prepared"
        );

        self.phase.advance();
        Ok(())
    }

    pub(crate) fn encode<S: ComposeStore>(
        &mut self,
        node: &mut ComposeChart,
        pl: &Payload<'_, S>,
    ) -> EngineResult<Outcome> {
        self.phase.begin_encode()?;

        let existing = self.existing.as_ref();
        let mut res = node.res.clone();
        res.id = choose_id(pl.store, res.id, existing.map(|c| c.id));
        res.namespace_id = self.namespace_id;
        stamp_row(
            node.base().timestamps(),
            &mut res.timestamps,
            existing.map(|c| &c.timestamps),
            pl.now,
        );
        for (report, id) in res.config.reports.iter_mut().zip(&self.module_ids) {
            report.module_id = *id;
        }

        let env = skip_env(
            ResourceType::ComposeChart,
            existing.is_some(),
            &res.handle,
            &res.name,
        );
        let write = Write {
            resource_type: ResourceType::ComposeChart,
            identifiers: node.identifiers(),
            env,
            existing,
            incoming: res,
            merge: merge_chart,
        };
        let (outcome, row) = write.persist(
            pl.config,
            |r| pl.store.create_chart(r),
            |r| pl.store.update_chart(r),
        )?;
        if let Some(row) = row {
            node.res = row;
        }

        self.phase.advance();
        Ok(outcome)
    }
}
