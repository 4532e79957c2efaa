//! Decode pipeline: store rows to resource nodes.
//!
//! Every filter is scanned page by page until the store stops returning a
//! cursor. Records are not materialized; each record filter yields one
//! record set node whose source re-runs the paged search when walked.

use crate::config::DecoderConfig;
use crate::error::{EngineError, EngineResult};
use crate::lookup;
use graphsync_resource::{
    ComposeChart, ComposeModule, ComposeNamespace, ComposePage, ComposeRecord, ComposeRecordRaw,
    Identifiers, RecordSource, ResourceError, ResourceResult, ResourceSet, ResourceType,
    Timestamps, UserstampIndex, Userstamps,
};
use graphsync_store::{
    ChartFilter, ComposeStore, Module, ModuleFieldFilter, ModuleFilter, NamespaceFilter,
    PageFilter, Paging, Record, RecordFilter, SearchPage, StoreResult,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Filters accumulated before a decode, per resource kind.
#[derive(Debug, Clone, Default)]
pub struct DecodeFilter {
    namespaces: Vec<NamespaceFilter>,
    modules: Vec<ModuleFilter>,
    records: Vec<RecordFilter>,
    pages: Vec<PageFilter>,
    charts: Vec<ChartFilter>,
}

impl DecodeFilter {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespace filter.
    pub fn namespace(&mut self, f: NamespaceFilter) -> &mut Self {
        self.namespaces.push(f);
        self
    }

    /// Adds a module filter.
    pub fn module(&mut self, f: ModuleFilter) -> &mut Self {
        self.modules.push(f);
        self
    }

    /// Adds a record filter; `module_id` selects the module.
    pub fn record(&mut self, f: RecordFilter) -> &mut Self {
        self.records.push(f);
        self
    }

    /// Adds a page filter.
    pub fn page(&mut self, f: PageFilter) -> &mut Self {
        self.pages.push(f);
        self
    }

    /// Adds a chart filter.
    pub fn chart(&mut self, f: ChartFilter) -> &mut Self {
        self.charts.push(f);
        self
    }

    /// Returns true when no filter was added.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.modules.is_empty()
            && self.records.is_empty()
            && self.pages.is_empty()
            && self.charts.is_empty()
    }
}

/// Result of a decode.
#[derive(Debug, Default)]
pub struct DecodeOutput {
    /// Decoded nodes, in decode order.
    pub resources: ResourceSet,
    /// Store IDs of every decoded row.
    pub resource_ids: Vec<u64>,
}

impl DecodeOutput {
    fn push(&mut self, id: u64, node: impl Into<graphsync_resource::Resource>) {
        self.resource_ids.push(id);
        self.resources.push(node);
    }
}

/// Decodes store rows into resource nodes.
pub struct Decoder<S> {
    store: Arc<S>,
    config: DecoderConfig,
}

impl<S: ComposeStore + 'static> Decoder<S> {
    /// Creates a decoder over the store.
    pub fn new(store: Arc<S>, config: DecoderConfig) -> Self {
        Self { store, config }
    }

    /// Decodes every filter.
    ///
    /// Kinds are decoded in dependency order. On failure the nodes decoded
    /// so far are returned inside [`EngineError::PartialDecode`].
    pub fn decode(&self, filter: &DecodeFilter) -> EngineResult<DecodeOutput> {
        let mut out = DecodeOutput::default();
        match self.decode_into(filter, &mut out) {
            Ok(()) => Ok(out),
            Err(e) => Err(EngineError::PartialDecode {
                partial: Box::new(out),
                source: Box::new(e),
            }),
        }
    }

    fn decode_into(&self, filter: &DecodeFilter, out: &mut DecodeOutput) -> EngineResult<()> {
        self.decode_namespaces(&filter.namespaces, out)?;
        self.decode_modules(&filter.modules, out)?;
        self.decode_charts(&filter.charts, out)?;
        self.decode_pages(&filter.pages, out)?;
        self.decode_records(&filter.records, out)?;
        Ok(())
    }

    fn paging(&self, p: Paging) -> Paging {
        Paging {
            limit: if p.limit == 0 {
                self.config.default_page_size
            } else {
                p.limit
            },
            ..p
        }
    }

    fn decode_namespaces(
        &self,
        ff: &[NamespaceFilter],
        out: &mut DecodeOutput,
    ) -> EngineResult<()> {
        for f in ff {
            let mut f = f.clone();
            f.paging = self.paging(f.paging);
            scan(
                ResourceType::ComposeNamespace,
                f.paging,
                |paging| {
                    f.paging = paging;
                    self.store.search_namespaces(&f)
                },
                |ns| {
                    out.push(ns.id, ComposeNamespace::new(ns));
                    Ok(())
                },
            )?;
        }
        Ok(())
    }

    fn decode_modules(&self, ff: &[ModuleFilter], out: &mut DecodeOutput) -> EngineResult<()> {
        for f in ff {
            let mut f = f.clone();
            f.paging = self.paging(f.paging);
            scan(
                ResourceType::ComposeModule,
                f.paging,
                |paging| {
                    f.paging = paging;
                    self.store.search_modules(&f)
                },
                |mut m| {
                    m.fields = self.store.search_module_fields(&ModuleFieldFilter {
                        module_id: vec![m.id],
                    })?;
                    out.push(m.id, ComposeModule::from_store(m));
                    Ok(())
                },
            )?;
        }
        Ok(())
    }

    fn decode_charts(&self, ff: &[ChartFilter], out: &mut DecodeOutput) -> EngineResult<()> {
        for f in ff {
            let mut f = f.clone();
            f.paging = self.paging(f.paging);
            scan(
                ResourceType::ComposeChart,
                f.paging,
                |paging| {
                    f.paging = paging;
                    self.store.search_charts(&f)
                },
                |c| {
                    out.push(c.id, ComposeChart::from_store(c));
                    Ok(())
                },
            )?;
        }
        Ok(())
    }

    fn decode_pages(&self, ff: &[PageFilter], out: &mut DecodeOutput) -> EngineResult<()> {
        for f in ff {
            let mut f = f.clone();
            f.paging = self.paging(f.paging);
            scan(
                ResourceType::ComposePage,
                f.paging,
                |paging| {
                    f.paging = paging;
                    self.store.search_pages(&f)
                },
                |p| {
                    let id = p.id;
                    out.push(id, ComposePage::from_store(p)?);
                    Ok(())
                },
            )?;
        }
        Ok(())
    }

    fn decode_records(&self, ff: &[RecordFilter], out: &mut DecodeOutput) -> EngineResult<()> {
        if ff.is_empty() {
            return Ok(());
        }

        // One user index serves every record filter of this decode.
        let users = UserstampIndex::from_users(&lookup::all_users(self.store.as_ref())?);
        debug!(users = users.len(), "loaded user index");

        for f in ff {
            let Some(mut module) = self.store.lookup_module_by_id(f.module_id)? else {
                return Err(ResourceError::unresolved(
                    ResourceType::ComposeModule,
                    &Identifiers::for_row("", "", f.module_id),
                )
                .into());
            };
            module.fields = self.store.search_module_fields(&ModuleFieldFilter {
                module_id: vec![module.id],
            })?;

            let namespace_id = if f.namespace_id > 0 {
                f.namespace_id
            } else {
                module.namespace_id
            };
            let mut f = f.clone();
            f.paging = self.paging(f.paging);

            let ns = Identifiers::for_row("", "", namespace_id);
            let mm = Identifiers::for_row(&module.handle, &module.name, module.id);
            let source = StoreRecordSource::new(Arc::clone(&self.store), module, f);
            let node = ComposeRecord::new(ns, mm, Box::new(source)).with_user_index(users.clone());
            out.resources.push(node);
        }
        Ok(())
    }
}

/// Follows cursors until the store returns none.
fn scan<T, Q, E>(
    resource_type: ResourceType,
    mut paging: Paging,
    mut search: Q,
    mut emit: E,
) -> EngineResult<()>
where
    Q: FnMut(Paging) -> StoreResult<SearchPage<T>>,
    E: FnMut(T) -> EngineResult<()>,
{
    loop {
        let page = search(paging)?;
        debug!(
            resource_type = %resource_type,
            rows = page.rows.len(),
            more = page.next_cursor.is_some(),
            "decoded page"
        );
        for row in page.rows {
            emit(row)?;
        }
        match page.next_cursor {
            Some(cursor) => paging.page_cursor = Some(cursor),
            None => return Ok(()),
        }
    }
}

/// A record source re-running a paged store search.
pub struct StoreRecordSource<S> {
    store: Arc<S>,
    module: Module,
    filter: RecordFilter,
    next: Option<Paging>,
}

impl<S: ComposeStore> StoreRecordSource<S> {
    /// Creates a source over the records of `module` matching `filter`.
    pub fn new(store: Arc<S>, module: Module, filter: RecordFilter) -> Self {
        let next = Some(filter.paging);
        Self {
            store,
            module,
            filter,
            next,
        }
    }
}

impl<S: ComposeStore> RecordSource for StoreRecordSource<S> {
    fn restart(&mut self) -> ResourceResult<()> {
        self.next = Some(self.filter.paging);
        Ok(())
    }

    fn next_batch(&mut self) -> ResourceResult<Option<Vec<ComposeRecordRaw>>> {
        let Some(paging) = self.next.take() else {
            return Ok(None);
        };

        let mut f = self.filter.clone();
        f.paging = paging;
        let page = self.store.search_records(&self.module, &f)?;
        debug!(
            module = %self.module.handle,
            rows = page.rows.len(),
            more = page.next_cursor.is_some(),
            "decoded record page"
        );

        self.next = page.next_cursor.map(|c| Paging {
            page_cursor: Some(c),
            ..paging
        });
        Ok(Some(page.rows.iter().map(raw_record).collect()))
    }
}

fn raw_record(r: &Record) -> ComposeRecordRaw {
    let mut ordered: Vec<_> = r.values.iter().collect();
    ordered.sort_by_key(|v| v.place);
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for v in ordered {
        values.entry(v.name.clone()).or_default().push(v.value.clone());
    }

    ComposeRecordRaw {
        id: r.id.to_string(),
        values,
        ts: Timestamps::from_row(&r.timestamps),
        us: Userstamps::from_ids(r.created_by, r.updated_by, r.deleted_by, r.owned_by),
    }
}
