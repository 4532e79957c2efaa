use super::{choose_id, skip_env, stamp_row, Outcome, Payload, Phase, Write};
use crate::error::EngineResult;
use crate::lookup;
use crate::merge::merge_namespace;
use graphsync_resource::{ComposeNamespace, ResourceType};
use graphsync_store::{ComposeStore, Namespace};
use tracing::debug;

/// Encode state of a namespace node.
#[derive(Debug)]
pub(crate) struct NamespaceState {
    phase: Phase,
    existing: Option<Namespace>,
}

impl NamespaceState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(ResourceType::ComposeNamespace),
            existing: None,
        }
    }

    pub(crate) fn prepare<S: ComposeStore>(
        &mut self,
        node: &ComposeNamespace,
        pl: &Payload<'_, S>,
    ) -> EngineResult<()> {
        self.phase.begin_prepare()?;
        self.existing = lookup::find_namespace_s(pl.store, node.identifiers())?;
        debug!(
            identifiers = %node.identifiers(),
            exists = self.existing.is_some(),
            "namespace prepared"
        );
        self.phase.advance();
        Ok(())
    }

    pub(crate) fn encode<S: ComposeStore>(
        &mut self,
        node: &mut ComposeNamespace,
        pl: &Payload<'_, S>,
    ) -> EngineResult<Outcome> {
        self.phase.begin_encode()?;

        let mut res = node.res.clone();
        res.id = choose_id(pl.store, res.id, self.existing.as_ref().map(|n| n.id));
        stamp_row(
            node.base().timestamps(),
            &mut res.timestamps,
            self.existing.as_ref().map(|n| &n.timestamps),
            pl.now,
        );

        let env = skip_env(
            ResourceType::ComposeNamespace,
            self.existing.is_some(),
            &res.slug,
            &res.name,
        );
        let write = Write {
            resource_type: ResourceType::ComposeNamespace,
            identifiers: node.identifiers(),
            env,
            existing: self.existing.as_ref(),
            incoming: res,
            merge: merge_namespace,
        };
        let (outcome, row) = write.persist(
            pl.config,
            |r| pl.store.create_namespace(r),
            |r| pl.store.update_namespace(r),
        )?;
        if let Some(row) = row {
            node.res = row;
        }

        self.phase.advance();
        Ok(outcome)
    }
}
