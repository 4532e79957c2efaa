use super::{choose_id, skip_env, stamp_row, EncodeReport, Outcome, Payload, Phase, Write};
use crate::error::{EngineError, EngineResult};
use crate::lookup::{self, Resolved};
use crate::merge::merge_record;
use graphsync_resource::{
    ComposeRecord, ComposeRecordRaw, Identifiers, ResourceError, ResourceType, Timestamps,
    Userstamp, UserstampIndex, Userstamps,
};
use graphsync_store::{ComposeStore, Module, Record, RecordValue};
use tracing::{debug, info};

/// Encode state of a record set.
#[derive(Debug)]
pub(crate) struct RecordState {
    phase: Phase,
    resolved: Resolved,
    namespace_id: u64,
    module: Module,
    users: UserstampIndex,
}

impl RecordState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(ResourceType::ComposeRecord),
            resolved: Resolved::default(),
            namespace_id: 0,
            module: Module::default(),
            users: UserstampIndex::new(),
        }
    }

    pub(crate) fn prepare<S: ComposeStore>(
        &mut self,
        node: &ComposeRecord,
        pl: &Payload<'_, S>,
    ) -> EngineResult<()> {
        self.phase.begin_prepare()?;

        let ns = lookup::find_namespace(pl.store, pl.ctx, &node.ref_ns.identifiers)?
            .ok_or_else(|| node.ref_ns.unresolved())?;
        self.resolved.insert(&node.ref_ns, ns.id);
        self.namespace_id = ns.id;

        let scope = self.resolved.scope(&node.ref_mod)?;
        self.module = lookup::find_module(pl.store, pl.ctx, scope, &node.ref_mod.identifiers)?
            .ok_or_else(|| node.ref_mod.unresolved())?;

        self.users = match &node.user_index {
            Some(idx) => idx.clone(),
            None => UserstampIndex::from_users(&lookup::all_users(pl.store)?),
        };
        debug!(
            module = %self.module.handle,
            fields = self.module.fields.len(),
            users = self.users.len(),
            "records prepared"
        );

        self.phase.advance();
        Ok(())
    }

    /// Streams every record of the set into the store.
    pub(crate) fn encode<S: ComposeStore>(
        &mut self,
        node: &mut ComposeRecord,
        pl: &Payload<'_, S>,
    ) -> EngineResult<EncodeReport> {
        self.phase.begin_encode()?;

        let ts = node.base().timestamps().cloned();
        let us = node.base().userstamps().cloned();
        let mut report = EncodeReport::default();
        let this = &*self;
        node.walk(|raw| -> EngineResult<()> {
            report += this.encode_row(pl, raw, ts.as_ref(), us.as_ref())?;
            Ok(())
        })?;

        info!(
            module = %self.module.handle,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "records encoded"
        );
        self.phase.advance();
        Ok(report)
    }

    fn encode_row<S: ComposeStore>(
        &self,
        pl: &Payload<'_, S>,
        raw: ComposeRecordRaw,
        ts: Option<&Timestamps>,
        us: Option<&Userstamps>,
    ) -> EngineResult<Outcome> {
        let module = &self.module;
        if let Some(name) = raw.values.keys().find(|k| module.field(k).is_none()) {
            return Err(EngineError::UnknownField {
                module: module.handle.clone(),
                field: name.clone(),
            });
        }

        let explicit = raw.id.trim().parse::<u64>().unwrap_or_default();
        let existing = if explicit > 0 {
            pl.store.lookup_record_by_id(module, explicit)?
        } else {
            None
        };

        // Values follow the field order of the module, then their place
        let values = module
            .fields
            .iter()
            .filter_map(|f| raw.values.get(&f.name).map(|vv| (f, vv)))
            .flat_map(|(f, vv)| {
                vv.iter().zip(0u32..).map(|(v, place)| RecordValue {
                    name: f.name.clone(),
                    value: v.clone(),
                    place,
                })
            })
            .collect();

        let mut rec = Record {
            id: choose_id(pl.store, explicit, existing.as_ref().map(|r| r.id)),
            module_id: module.id,
            namespace_id: self.namespace_id,
            values,
            ..Default::default()
        };
        stamp_row(
            raw.ts.as_ref().or(ts),
            &mut rec.timestamps,
            existing.as_ref().map(|r| &r.timestamps),
            pl.now,
        );
        if let Some(us) = raw.us.as_ref().or(us) {
            rec.created_by = self.user(us.created_by.as_ref())?;
            rec.updated_by = self.user(us.updated_by.as_ref())?;
            rec.deleted_by = self.user(us.deleted_by.as_ref())?;
            rec.owned_by = self.user(us.owned_by.as_ref())?;
        }

        let identifiers = Identifiers::from_values([raw.id.as_str()]);
        let env = skip_env(
            ResourceType::ComposeRecord,
            existing.is_some(),
            &module.handle,
            &module.name,
        );
        let write = Write {
            resource_type: ResourceType::ComposeRecord,
            identifiers: &identifiers,
            env,
            existing: existing.as_ref(),
            incoming: rec,
            merge: merge_record,
        };
        let (outcome, _) = write.persist(
            pl.config,
            |r| pl.store.create_record(module, r),
            |r| pl.store.update_record(module, r),
        )?;
        Ok(outcome)
    }

    /// Resolves a userstamp; an unset stamp is zero.
    fn user(&self, stamp: Option<&Userstamp>) -> EngineResult<u64> {
        let Some(stamp) = stamp else {
            return Ok(0);
        };
        if stamp.user_id == 0 && stamp.identifier.trim().is_empty() {
            return Ok(0);
        }
        self.users.resolve(stamp).ok_or_else(|| {
            ResourceError::unresolved(
                ResourceType::User,
                &Identifiers::from_values([stamp.identifier.as_str()]),
            )
            .into()
        })
    }
}
