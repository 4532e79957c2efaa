use super::{choose_id, skip_env, stamp_row, Outcome, Payload, Phase, Write};
use crate::error::EngineResult;
use crate::lookup::{self, Resolved};
use crate::merge::merge_module;
use graphsync_resource::{ComposeModule, ResourceType};
use graphsync_store::{ComposeStore, IdAllocator, Module};
use tracing::debug;

/// Encode state of a module node.
#[derive(Debug)]
pub(crate) struct ModuleState {
    phase: Phase,
    resolved: Resolved,
    namespace_id: u64,
    existing: Option<Module>,
}

impl ModuleState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(ResourceType::ComposeModule),
            resolved: Resolved::default(),
            namespace_id: 0,
            existing: None,
        }
    }

    pub(crate) fn prepare<S: ComposeStore>(
        &mut self,
        node: &ComposeModule,
        pl: &Payload<'_, S>,
    ) -> EngineResult<()> {
        self.phase.begin_prepare()?;

        let ns = lookup::find_namespace(pl.store, pl.ctx, &node.ref_ns.identifiers)?
            .ok_or_else(|| node.ref_ns.unresolved())?;
        self.resolved.insert(&node.ref_ns, ns.id);
        self.namespace_id = ns.id;

        self.existing = lookup::find_module_s(pl.store, ns.id, node.identifiers())?;
        debug!(
            identifiers = %node.identifiers(),
            namespace_id = ns.id,
            exists = self.existing.is_some(),
            "module prepared"
        );

        self.phase.advance();
        Ok(())
    }

    pub(crate) fn encode<S: ComposeStore>(
        &mut self,
        node: &mut ComposeModule,
        pl: &Payload<'_, S>,
    ) -> EngineResult<Outcome> {
        self.phase.begin_encode()?;

        let existing = self.existing.as_ref();
        let mut res = node.res.clone();
        res.id = choose_id(pl.store, res.id, existing.map(|m| m.id));
        res.namespace_id = self.namespace_id;
        stamp_row(
            node.base().timestamps(),
            &mut res.timestamps,
            existing.map(|m| &m.timestamps),
            pl.now,
        );
        assign_field_ids(pl.store, &mut res, existing);

        let env = skip_env(
            ResourceType::ComposeModule,
            existing.is_some(),
            &res.handle,
            &res.name,
        );
        let write = Write {
            resource_type: ResourceType::ComposeModule,
            identifiers: node.identifiers(),
            env,
            existing,
            incoming: res,
            merge: merge_module,
        };
        let (outcome, row) = write.persist(
            pl.config,
            |r| pl.store.create_module(r),
            |r| pl.store.update_module(r),
        )?;
        if let Some(row) = row {
            node.res = row;
        }

        self.phase.advance();
        Ok(outcome)
    }
}

/// Gives every field an ID and points it at its module.
///
/// Explicit IDs stay; otherwise the ID of the existing field with the same
/// name is reused before a fresh one is allocated.
fn assign_field_ids<S: IdAllocator>(store: &S, module: &mut Module, existing: Option<&Module>) {
    for f in &mut module.fields {
        f.module_id = module.id;
        if f.id > 0 {
            continue;
        }
        f.id = existing
            .and_then(|m| m.field(&f.name))
            .map(|ef| ef.id)
            .filter(|id| *id > 0)
            .unwrap_or_else(|| store.next_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_store::{IdGenerator, ModuleField};

    fn field(id: u64, name: &str) -> ModuleField {
        ModuleField {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn field_ids_prefer_explicit_then_existing() {
        let ids = IdGenerator::with_seed(900);
        let existing = Module {
            id: 5,
            fields: vec![field(51, "email")],
            ..Default::default()
        };
        let mut m = Module {
            id: 5,
            fields: vec![field(0, "email"), field(77, "phone"), field(0, "notes")],
            ..Default::default()
        };

        assign_field_ids(&ids, &mut m, Some(&existing));
        let got: Vec<(u64, u64)> = m.fields.iter().map(|f| (f.id, f.module_id)).collect();
        assert_eq!(got, vec![(51, 5), (77, 5), (900, 5)]);
    }
}
