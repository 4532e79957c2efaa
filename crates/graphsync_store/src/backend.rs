//! Store collaborator traits.
//!
//! The sync engine consumes the store through these narrow interfaces only:
//! paged searches, point lookups scoped by parent and create/update
//! mutations. Implementations are expected to be idempotent; retries, if
//! any, belong to the implementation.

use crate::error::StoreResult;
use crate::filter::{
    ChartFilter, ModuleFieldFilter, ModuleFilter, NamespaceFilter, PageFilter, RecordFilter,
    SearchPage, UserFilter,
};
use crate::types::{Chart, Module, ModuleField, Namespace, Page, Record, User};

/// Namespace table.
pub trait NamespaceStore {
    /// Searches namespaces, one page at a time.
    fn search_namespaces(
        &self,
        filter: &NamespaceFilter,
    ) -> StoreResult<SearchPage<Namespace>>;

    /// Looks up a namespace by ID.
    fn lookup_namespace_by_id(&self, id: u64) -> StoreResult<Option<Namespace>>;

    /// Looks up a namespace by slug.
    fn lookup_namespace_by_slug(&self, slug: &str) -> StoreResult<Option<Namespace>>;

    /// Creates a namespace.
    fn create_namespace(&self, ns: &Namespace) -> StoreResult<()>;

    /// Updates a namespace.
    fn update_namespace(&self, ns: &Namespace) -> StoreResult<()>;
}

/// Module and module field tables.
///
/// Searches and lookups return modules without their fields; fields are
/// fetched through [`ModuleStore::search_module_fields`]. Mutations persist
/// the fields carried by the module.
pub trait ModuleStore {
    /// Searches modules, one page at a time.
    fn search_modules(&self, filter: &ModuleFilter) -> StoreResult<SearchPage<Module>>;

    /// Returns the fields of the filtered modules ordered by place.
    fn search_module_fields(&self, filter: &ModuleFieldFilter) -> StoreResult<Vec<ModuleField>>;

    /// Looks up a module by ID.
    fn lookup_module_by_id(&self, id: u64) -> StoreResult<Option<Module>>;

    /// Looks up a module by handle within a namespace.
    fn lookup_module_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Module>>;

    /// Looks up a module by name within a namespace.
    fn lookup_module_by_namespace_name(
        &self,
        namespace_id: u64,
        name: &str,
    ) -> StoreResult<Option<Module>>;

    /// Creates a module together with its fields.
    fn create_module(&self, module: &Module) -> StoreResult<()>;

    /// Updates a module and upserts its fields.
    fn update_module(&self, module: &Module) -> StoreResult<()>;
}

/// Record table.
pub trait RecordStore {
    /// Searches records of a module, one page at a time.
    fn search_records(
        &self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<SearchPage<Record>>;

    /// Looks up a record of a module by ID.
    fn lookup_record_by_id(&self, module: &Module, id: u64) -> StoreResult<Option<Record>>;

    /// Creates a record.
    fn create_record(&self, module: &Module, record: &Record) -> StoreResult<()>;

    /// Updates a record.
    fn update_record(&self, module: &Module, record: &Record) -> StoreResult<()>;
}

/// Page table.
pub trait PageStore {
    /// Searches pages, one page at a time.
    fn search_pages(&self, filter: &PageFilter) -> StoreResult<SearchPage<Page>>;

    /// Looks up a page by ID.
    fn lookup_page_by_id(&self, id: u64) -> StoreResult<Option<Page>>;

    /// Looks up a page by handle within a namespace.
    fn lookup_page_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Page>>;

    /// Creates a page.
    fn create_page(&self, page: &Page) -> StoreResult<()>;

    /// Updates a page.
    fn update_page(&self, page: &Page) -> StoreResult<()>;
}

/// Chart table.
pub trait ChartStore {
    /// Searches charts, one page at a time.
    fn search_charts(&self, filter: &ChartFilter) -> StoreResult<SearchPage<Chart>>;

    /// Looks up a chart by ID.
    fn lookup_chart_by_id(&self, id: u64) -> StoreResult<Option<Chart>>;

    /// Looks up a chart by handle within a namespace.
    fn lookup_chart_by_namespace_handle(
        &self,
        namespace_id: u64,
        handle: &str,
    ) -> StoreResult<Option<Chart>>;

    /// Creates a chart.
    fn create_chart(&self, chart: &Chart) -> StoreResult<()>;

    /// Updates a chart.
    fn update_chart(&self, chart: &Chart) -> StoreResult<()>;
}

/// User table (read only for the sync engine).
pub trait UserStore {
    /// Searches users, one page at a time.
    fn search_users(&self, filter: &UserFilter) -> StoreResult<SearchPage<User>>;

    /// Looks up a user by ID.
    fn lookup_user_by_id(&self, id: u64) -> StoreResult<Option<User>>;
}

/// Allocator of globally unique row IDs.
///
/// IDs must be non-zero and never repeat within a run.
pub trait IdAllocator {
    /// Returns a fresh ID.
    fn next_id(&self) -> u64;
}

/// Every table the compose sync engine touches.
pub trait ComposeStore:
    NamespaceStore + ModuleStore + RecordStore + PageStore + ChartStore + UserStore + IdAllocator
{
}

impl<T> ComposeStore for T where
    T: NamespaceStore
        + ModuleStore
        + RecordStore
        + PageStore
        + ChartStore
        + UserStore
        + IdAllocator
{
}
