//! In-memory store for tests, tooling and snapshots.

use crate::backend::{
    ChartStore, IdAllocator, ModuleStore, NamespaceStore, PageStore, RecordStore, UserStore,
};
use crate::error::{StoreError, StoreResult};
use crate::filter::{
    query_matches, ChartFilter, ModuleFieldFilter, ModuleFilter, NamespaceFilter, PageCursor,
    PageFilter, Paging, RecordFilter, SearchPage, UserFilter,
};
use crate::id::IdGenerator;
use crate::types::{Chart, Module, ModuleField, Namespace, Page, Record, User};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Store operations, used for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Paged namespace search.
    SearchNamespaces,
    /// Paged module search.
    SearchModules,
    /// Nested module field lookup.
    SearchModuleFields,
    /// Paged record search.
    SearchRecords,
    /// Paged page search.
    SearchPages,
    /// Paged chart search.
    SearchCharts,
    /// Paged user search.
    SearchUsers,
    /// Any point lookup.
    Lookup,
    /// Any create mutation.
    Create,
    /// Any update mutation.
    Update,
}

impl StoreOp {
    /// Returns true for create and update.
    pub fn is_mutation(&self) -> bool {
        matches!(self, StoreOp::Create | StoreOp::Update)
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::SearchNamespaces => "search_namespaces",
            StoreOp::SearchModules => "search_modules",
            StoreOp::SearchModuleFields => "search_module_fields",
            StoreOp::SearchRecords => "search_records",
            StoreOp::SearchPages => "search_pages",
            StoreOp::SearchCharts => "search_charts",
            StoreOp::SearchUsers => "search_users",
            StoreOp::Lookup => "lookup",
            StoreOp::Create => "create",
            StoreOp::Update => "update",
        };
        f.write_str(name)
    }
}

/// The tables held by an [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    /// Namespaces by ID.
    pub namespaces: BTreeMap<u64, Namespace>,
    /// Modules by ID, stored without fields.
    pub modules: BTreeMap<u64, Module>,
    /// Module fields by ID.
    pub module_fields: BTreeMap<u64, ModuleField>,
    /// Records by ID.
    pub records: BTreeMap<u64, Record>,
    /// Pages by ID.
    pub pages: BTreeMap<u64, Page>,
    /// Charts by ID.
    pub charts: BTreeMap<u64, Chart>,
    /// Users by ID.
    pub users: BTreeMap<u64, User>,
}

impl Tables {
    fn max_id(&self) -> u64 {
        [
            self.namespaces.keys().next_back(),
            self.modules.keys().next_back(),
            self.module_fields.keys().next_back(),
            self.records.keys().next_back(),
            self.pages.keys().next_back(),
            self.charts.keys().next_back(),
            self.users.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0)
    }

    fn fields_of(&self, module_id: u64) -> Vec<ModuleField> {
        let mut ff: Vec<ModuleField> = self
            .module_fields
            .values()
            .filter(|f| f.module_id == module_id)
            .cloned()
            .collect();
        ff.sort_by_key(|f| (f.place, f.id));
        ff
    }
}

/// An in-memory implementation of every store trait.
///
/// Rows are kept ordered by ID and pages resume after the last returned ID.
/// Searches and lookups return modules without fields.
///
/// # Example
///
/// ```rust
/// use graphsync_store::{InMemoryStore, Namespace, NamespaceFilter, NamespaceStore};
///
/// let store = InMemoryStore::new();
/// store
///     .create_namespace(&Namespace { id: 1, slug: "crm".into(), ..Default::default() })
///     .unwrap();
/// let page = store.search_namespaces(&NamespaceFilter::default()).unwrap();
/// assert_eq!(page.rows.len(), 1);
/// assert!(page.next_cursor.is_none());
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    ids: IdGenerator,
    counters: Mutex<HashMap<StoreOp, usize>>,
    faults: Mutex<HashMap<StoreOp, usize>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(Tables::default())
    }

    /// Creates a store holding the given tables.
    #[must_use]
    pub fn with_tables(tables: Tables) -> Self {
        let ids = IdGenerator::with_seed(1);
        ids.observe(tables.max_id());
        Self {
            tables: RwLock::new(tables),
            ids,
            counters: Mutex::new(HashMap::new()),
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a copy of all tables.
    #[must_use]
    pub fn tables(&self) -> Tables {
        self.tables.read().clone()
    }

    /// Inserts a user; users are provisioned outside the sync engine.
    pub fn insert_user(&self, user: User) {
        self.ids.observe(user.id);
        self.tables.write().users.insert(user.id, user);
    }

    /// Returns how many times `op` was invoked, including failed calls.
    #[must_use]
    pub fn op_count(&self, op: StoreOp) -> usize {
        self.counters.lock().get(&op).copied().unwrap_or(0)
    }

    /// Returns the number of create and update calls.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.op_count(StoreOp::Create) + self.op_count(StoreOp::Update)
    }

    /// Resets all operation counters.
    pub fn reset_counters(&self) {
        self.counters.lock().clear();
    }

    /// Makes `op` fail once it succeeded `successes` more times.
    pub fn fail_after(&self, op: StoreOp, successes: usize) {
        self.faults.lock().insert(op, successes);
    }

    /// Removes every injected failure.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    fn enter(&self, op: StoreOp) -> StoreResult<()> {
        *self.counters.lock().entry(op).or_insert(0) += 1;

        let mut faults = self.faults.lock();
        match faults.get_mut(&op) {
            Some(0) => Err(StoreError::Injected { op: op.to_string() }),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate<'a, T, F>(rows: &'a BTreeMap<u64, T>, paging: &Paging, keep: F) -> SearchPage<T>
where
    T: Clone + 'a,
    F: Fn(&T) -> bool,
{
    let after = paging.page_cursor.map(|c| c.last_id()).unwrap_or(0);
    let mut matching = rows
        .range(after.saturating_add(1)..)
        .filter(|(_, row)| keep(*row));

    if paging.limit == 0 {
        return SearchPage::last(matching.map(|(_, row)| row.clone()).collect());
    }

    let limit = paging.limit as usize;
    let mut out = Vec::with_capacity(limit);
    let mut last_id = after;
    for (id, row) in matching.by_ref().take(limit) {
        last_id = *id;
        out.push(row.clone());
    }

    let next_cursor = if matching.next().is_some() {
        Some(PageCursor::after(last_id))
    } else {
        None
    };

    SearchPage {
        rows: out,
        next_cursor,
    }
}

fn insert_new<T>(
    table: &mut BTreeMap<u64, T>,
    name: &'static str,
    id: u64,
    row: T,
) -> StoreResult<()> {
    if id == 0 || table.contains_key(&id) {
        return Err(StoreError::Duplicate { table: name, id });
    }
    table.insert(id, row);
    Ok(())
}

fn replace<T>(
    table: &mut BTreeMap<u64, T>,
    name: &'static str,
    id: u64,
    row: T,
) -> StoreResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = row;
            Ok(())
        }
        None => Err(StoreError::NotFound { table: name, id }),
    }
}

impl NamespaceStore for InMemoryStore {
    fn search_namespaces(
        &self,
        filter: &NamespaceFilter,
    ) -> StoreResult<SearchPage<Namespace>> {
        self.enter(StoreOp::SearchNamespaces)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.namespaces, &filter.paging, |ns| {
            filter.slug.as_deref().is_none_or(|s| ns.slug == s)
                && query_matches(filter.query.as_deref(), &[&ns.slug, &ns.name])
        }))
    }

    fn lookup_namespace_by_id(&self, id: u64) -> StoreResult<Option<Namespace>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self.tables.read().namespaces.get(&id).cloned())
    }

    fn lookup_namespace_by_slug(&self, slug: &str) -> StoreResult<Option<Namespace>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .namespaces
            .values()
            .find(|ns| ns.slug == slug)
            .cloned())
    }

    fn create_namespace(&self, ns: &Namespace) -> StoreResult<()> {
        self.enter(StoreOp::Create)?;
        self.ids.observe(ns.id);
        insert_new(&mut self.tables.write().namespaces, "compose_namespace", ns.id, ns.clone())
    }

    fn update_namespace(&self, ns: &Namespace) -> StoreResult<()> {
        self.enter(StoreOp::Update)?;
        replace(&mut self.tables.write().namespaces, "compose_namespace", ns.id, ns.clone())
    }
}

impl InMemoryStore {
    fn upsert_fields(tables: &mut Tables, module: &Module) {
        for field in &module.fields {
            let mut field = field.clone();
            field.module_id = module.id;
            tables.module_fields.insert(field.id, field);
        }
    }

    fn without_fields(module: &Module) -> Module {
        Module {
            fields: Vec::new(),
            ..module.clone()
        }
    }
}

impl ModuleStore for InMemoryStore {
    fn search_modules(&self, filter: &ModuleFilter) -> StoreResult<SearchPage<Module>> {
        self.enter(StoreOp::SearchModules)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.modules, &filter.paging, |m| {
            (filter.namespace_id == 0 || m.namespace_id == filter.namespace_id)
                && filter.handle.as_deref().is_none_or(|h| m.handle == h)
                && query_matches(filter.query.as_deref(), &[&m.handle, &m.name])
        }))
    }

    fn search_module_fields(&self, filter: &ModuleFieldFilter) -> StoreResult<Vec<ModuleField>> {
        self.enter(StoreOp::SearchModuleFields)?;
        let tables = self.tables.read();
        Ok(filter
            .module_id
            .iter()
            .flat_map(|id| tables.fields_of(*id))
            .collect())
    }

    fn lookup_module_by_id(&self, id: u64) -> StoreResult<Option<Module>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self.tables.read().modules.get(&id).cloned())
    }

    fn lookup_module_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Module>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .modules
            .values()
            .find(|m| m.namespace_id == namespace_id && m.handle == handle)
            .cloned())
    }

    fn lookup_module_by_namespace_name(
        &self,
        namespace_id: u64,
        name: &str,
    ) -> StoreResult<Option<Module>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .modules
            .values()
            .find(|m| m.namespace_id == namespace_id && m.name == name)
            .cloned())
    }

    fn create_module(&self, module: &Module) -> StoreResult<()> {
        self.enter(StoreOp::Create)?;
        self.ids.observe(module.id);
        let mut tables = self.tables.write();
        insert_new(
            &mut tables.modules,
            "compose_module",
            module.id,
            Self::without_fields(module),
        )?;
        Self::upsert_fields(&mut tables, module);
        Ok(())
    }

    fn update_module(&self, module: &Module) -> StoreResult<()> {
        self.enter(StoreOp::Update)?;
        let mut tables = self.tables.write();
        replace(
            &mut tables.modules,
            "compose_module",
            module.id,
            Self::without_fields(module),
        )?;
        Self::upsert_fields(&mut tables, module);
        Ok(())
    }
}

impl RecordStore for InMemoryStore {
    fn search_records(
        &self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<SearchPage<Record>> {
        self.enter(StoreOp::SearchRecords)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.records, &filter.paging, |r| {
            r.module_id == module.id
                && (filter.namespace_id == 0 || r.namespace_id == filter.namespace_id)
        }))
    }

    fn lookup_record_by_id(&self, module: &Module, id: u64) -> StoreResult<Option<Record>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .records
            .get(&id)
            .filter(|r| r.module_id == module.id)
            .cloned())
    }

    fn create_record(&self, module: &Module, record: &Record) -> StoreResult<()> {
        self.enter(StoreOp::Create)?;
        self.ids.observe(record.id);
        let mut record = record.clone();
        record.module_id = module.id;
        insert_new(&mut self.tables.write().records, "compose_record", record.id, record)
    }

    fn update_record(&self, module: &Module, record: &Record) -> StoreResult<()> {
        self.enter(StoreOp::Update)?;
        let mut record = record.clone();
        record.module_id = module.id;
        replace(&mut self.tables.write().records, "compose_record", record.id, record)
    }
}

impl PageStore for InMemoryStore {
    fn search_pages(&self, filter: &PageFilter) -> StoreResult<SearchPage<Page>> {
        self.enter(StoreOp::SearchPages)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.pages, &filter.paging, |p| {
            (filter.namespace_id == 0 || p.namespace_id == filter.namespace_id)
                && filter.parent_id.is_none_or(|id| p.self_id == id)
                && filter.handle.as_deref().is_none_or(|h| p.handle == h)
        }))
    }

    fn lookup_page_by_id(&self, id: u64) -> StoreResult<Option<Page>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self.tables.read().pages.get(&id).cloned())
    }

    fn lookup_page_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Page>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .pages
            .values()
            .find(|p| p.namespace_id == namespace_id && p.handle == handle)
            .cloned())
    }

    fn create_page(&self, page: &Page) -> StoreResult<()> {
        self.enter(StoreOp::Create)?;
        self.ids.observe(page.id);
        insert_new(&mut self.tables.write().pages, "compose_page", page.id, page.clone())
    }

    fn update_page(&self, page: &Page) -> StoreResult<()> {
        self.enter(StoreOp::Update)?;
        replace(&mut self.tables.write().pages, "compose_page", page.id, page.clone())
    }
}

impl ChartStore for InMemoryStore {
    fn search_charts(&self, filter: &ChartFilter) -> StoreResult<SearchPage<Chart>> {
        self.enter(StoreOp::SearchCharts)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.charts, &filter.paging, |c| {
            (filter.namespace_id == 0 || c.namespace_id == filter.namespace_id)
                && filter.handle.as_deref().is_none_or(|h| c.handle == h)
        }))
    }

    fn lookup_chart_by_id(&self, id: u64) -> StoreResult<Option<Chart>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self.tables.read().charts.get(&id).cloned())
    }

    fn lookup_chart_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Chart>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self
            .tables
            .read()
            .charts
            .values()
            .find(|c| c.namespace_id == namespace_id && c.handle == handle)
            .cloned())
    }

    fn create_chart(&self, chart: &Chart) -> StoreResult<()> {
        self.enter(StoreOp::Create)?;
        self.ids.observe(chart.id);
        insert_new(&mut self.tables.write().charts, "compose_chart", chart.id, chart.clone())
    }

    fn update_chart(&self, chart: &Chart) -> StoreResult<()> {
        self.enter(StoreOp::Update)?;
        replace(&mut self.tables.write().charts, "compose_chart", chart.id, chart.clone())
    }
}

impl UserStore for InMemoryStore {
    fn search_users(&self, filter: &UserFilter) -> StoreResult<SearchPage<User>> {
        self.enter(StoreOp::SearchUsers)?;
        let tables = self.tables.read();
        Ok(paginate(&tables.users, &filter.paging, |u| {
            query_matches(filter.query.as_deref(), &[&u.handle, &u.email, &u.name])
        }))
    }

    fn lookup_user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        self.enter(StoreOp::Lookup)?;
        Ok(self.tables.read().users.get(&id).cloned())
    }
}

impl IdAllocator for InMemoryStore {
    fn next_id(&self) -> u64 {
        self.ids.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_namespaces(n: u64) -> InMemoryStore {
        let store = InMemoryStore::new();
        for id in 1..=n {
            store
                .create_namespace(&Namespace {
                    id,
                    slug: format!("ns{id}"),
                    ..Default::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn pagination_follows_cursor() {
        let store = store_with_namespaces(5);
        let mut filter = NamespaceFilter {
            paging: Paging::with_limit(2),
            ..Default::default()
        };

        let mut seen = Vec::new();
        loop {
            let page = store.search_namespaces(&filter).unwrap();
            seen.extend(page.rows.iter().map(|ns| ns.id));
            match page.next_cursor {
                Some(cursor) => filter.paging.page_cursor = Some(cursor),
                None => break,
            }
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.op_count(StoreOp::SearchNamespaces), 3);
    }

    #[test]
    fn exact_page_boundary_has_no_trailing_cursor() {
        let store = store_with_namespaces(4);
        let filter = NamespaceFilter {
            paging: Paging {
                limit: 2,
                page_cursor: Some(PageCursor::after(2)),
            },
            ..Default::default()
        };

        let page = store.search_namespaces(&filter).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn zero_limit_returns_everything() {
        let store = store_with_namespaces(7);
        let page = store.search_namespaces(&NamespaceFilter::default()).unwrap();
        assert_eq!(page.rows.len(), 7);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn modules_are_returned_without_fields() {
        let store = InMemoryStore::new();
        store
            .create_module(&Module {
                id: 10,
                namespace_id: 1,
                handle: "contacts".into(),
                fields: vec![
                    ModuleField {
                        id: 12,
                        name: "email".into(),
                        place: 1,
                        ..Default::default()
                    },
                    ModuleField {
                        id: 11,
                        name: "name".into(),
                        place: 0,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            })
            .unwrap();

        let module = store.lookup_module_by_id(10).unwrap().unwrap();
        assert!(module.fields.is_empty());

        let fields = store
            .search_module_fields(&ModuleFieldFilter {
                module_id: vec![10],
            })
            .unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "email"]);
        assert!(fields.iter().all(|f| f.module_id == 10));
    }

    #[test]
    fn scoped_lookups() {
        let store = InMemoryStore::new();
        for (id, ns) in [(10, 1), (20, 2)] {
            store
                .create_module(&Module {
                    id,
                    namespace_id: ns,
                    handle: "contacts".into(),
                    ..Default::default()
                })
                .unwrap();
        }

        let m = store
            .lookup_module_by_namespace_handle(2, "contacts")
            .unwrap()
            .unwrap();
        assert_eq!(m.id, 20);
        assert!(store
            .lookup_module_by_namespace_handle(3, "contacts")
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_and_missing_rows() {
        let store = store_with_namespaces(1);
        let ns = Namespace {
            id: 1,
            ..Default::default()
        };
        assert!(matches!(
            store.create_namespace(&ns),
            Err(StoreError::Duplicate { id: 1, .. })
        ));

        let missing = Namespace {
            id: 99,
            ..Default::default()
        };
        assert!(matches!(
            store.update_namespace(&missing),
            Err(StoreError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn injected_failure_after_successes() {
        let store = store_with_namespaces(3);
        store.fail_after(StoreOp::SearchNamespaces, 1);

        assert!(store.search_namespaces(&NamespaceFilter::default()).is_ok());
        let err = store
            .search_namespaces(&NamespaceFilter::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Injected { .. }));
        assert_eq!(store.op_count(StoreOp::SearchNamespaces), 2);

        store.clear_faults();
        assert!(store.search_namespaces(&NamespaceFilter::default()).is_ok());
    }

    #[test]
    fn mutation_counter() {
        let store = store_with_namespaces(2);
        assert_eq!(store.mutation_count(), 2);
        store.reset_counters();
        assert_eq!(store.mutation_count(), 0);
    }

    #[test]
    fn allocated_ids_skip_existing_rows() {
        let mut tables = Tables::default();
        tables.pages.insert(
            900,
            Page {
                id: 900,
                ..Default::default()
            },
        );
        let store = InMemoryStore::with_tables(tables);
        assert_eq!(store.next_id(), 901);

        store.insert_user(User {
            id: 5000,
            ..Default::default()
        });
        assert_eq!(store.next_id(), 5001);
    }
}
