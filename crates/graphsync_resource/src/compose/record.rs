use crate::error::{ResourceError, ResourceResult};
use crate::identifier::Identifiers;
use crate::reference::Ref;
use crate::resource::{node_base, ResourceBase};
use crate::stamps::{Timestamps, Userstamps};
use crate::types::ResourceType;
use crate::userstamp::UserstampIndex;
use std::collections::BTreeMap;
use std::fmt;

/// One record as streamed by a [`RecordSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeRecordRaw {
    /// Record ID as text; blank or non-numeric for new records.
    pub id: String,
    /// Field name to values, in place order; single-value fields hold one.
    pub values: BTreeMap<String, Vec<String>>,
    /// Lifecycle times.
    pub ts: Option<Timestamps>,
    /// Responsible users.
    pub us: Option<Userstamps>,
}

/// A restartable producer of raw records.
///
/// Records are streamed in batches so a record set never has to be held in
/// memory at once.
pub trait RecordSource {
    /// Rewinds the source to its first record.
    fn restart(&mut self) -> ResourceResult<()>;

    /// Returns the next batch, or `None` when the source is exhausted.
    fn next_batch(&mut self) -> ResourceResult<Option<Vec<ComposeRecordRaw>>>;
}

/// A record source over an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct VecRecordSource {
    rows: Vec<ComposeRecordRaw>,
    done: bool,
}

impl VecRecordSource {
    /// Creates a source replaying the given rows.
    pub fn new(rows: Vec<ComposeRecordRaw>) -> Self {
        Self { rows, done: false }
    }
}

impl RecordSource for VecRecordSource {
    fn restart(&mut self) -> ResourceResult<()> {
        self.done = false;
        Ok(())
    }

    fn next_batch(&mut self) -> ResourceResult<Option<Vec<ComposeRecordRaw>>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        Ok(Some(self.rows.clone()))
    }
}

/// The records of one module.
pub struct ComposeRecord {
    pub(crate) base: ResourceBase,
    /// Owning namespace.
    pub ref_ns: Ref,
    /// Module the records belong to; scoped by the namespace.
    pub ref_mod: Ref,
    /// Users for userstamp resolution.
    pub user_index: Option<UserstampIndex>,
    source: Box<dyn RecordSource>,
}

impl ComposeRecord {
    /// Creates a record set of the given module; identifiers are the
    /// module's.
    pub fn new(
        namespace: Identifiers,
        module: Identifiers,
        source: Box<dyn RecordSource>,
    ) -> Self {
        let ref_ns = Ref::new(ResourceType::ComposeNamespace, namespace);
        let ref_mod = Ref::new(ResourceType::ComposeModule, module.clone()).constraint(&ref_ns);
        Self {
            base: ResourceBase::new(module),
            ref_ns,
            ref_mod,
            user_index: None,
            source,
        }
    }

    /// Attaches the users stamps are resolved against.
    #[must_use]
    pub fn with_user_index(mut self, index: UserstampIndex) -> Self {
        self.user_index = Some(index);
        self
    }

    /// Streams every record through `cb`, from the start of the source.
    ///
    /// Stops at the first error returned by the source or the callback.
    pub fn walk<E, F>(&mut self, mut cb: F) -> Result<(), E>
    where
        E: From<ResourceError>,
        F: FnMut(ComposeRecordRaw) -> Result<(), E>,
    {
        self.source.restart()?;
        while let Some(batch) = self.source.next_batch()? {
            for raw in batch {
                cb(raw)?;
            }
        }
        Ok(())
    }
}

node_base!(ComposeRecord);

impl fmt::Debug for ComposeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeRecord")
            .field("base", &self.base)
            .field("ref_ns", &self.ref_ns)
            .field("ref_mod", &self.ref_mod)
            .finish_non_exhaustive()
    }
}
