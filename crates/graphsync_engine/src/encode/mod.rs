//! Encode pipeline: resource nodes to store mutations.
//!
//! Nodes are encoded one at a time in dependency order. Each node goes
//! through two phases:
//!
//! 1. **Prepare** resolves every reference, first against the nodes
//!    already encoded in this run, then against the store, and looks up the
//!    existing row matching the node.
//! 2. **Encode** materializes IDs, stamps and foreign keys, rewrites
//!    embedded references, evaluates the skip predicate and issues the
//!    create or update.
//!
//! Nodes already written stay written when a later node fails.

mod chart;
mod module;
mod namespace;
mod order;
mod page;
mod record;

use crate::config::EncoderConfig;
use crate::error::{EngineError, EngineResult};
use crate::merge::{self, Resolution};
use crate::skip::{self, SkipEnv};
use chrono::{DateTime, Utc};
use graphsync_resource::{Identifiers, Resource, ResourceSet, ResourceType, Timestamps};
use graphsync_store::{ComposeStore, IdAllocator, RowTimestamps, StoreResult};
use std::ops::AddAssign;
use tracing::{debug, info, warn};

pub(crate) use chart::ChartState;
pub(crate) use module::ModuleState;
pub(crate) use namespace::NamespaceState;
pub(crate) use order::dependency_order;
pub(crate) use page::PageState;
pub(crate) use record::RecordState;

/// Encode phase of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeState {
    /// Nothing done yet.
    Pending,
    /// References resolved.
    Prepared,
    /// Written (or deliberately skipped).
    Encoded,
}

impl EncodeState {
    fn as_str(&self) -> &'static str {
        match self {
            EncodeState::Pending => "pending",
            EncodeState::Prepared => "prepared",
            EncodeState::Encoded => "encoded",
        }
    }
}

/// Phase guard of one node.
#[derive(Debug)]
pub(crate) struct Phase {
    resource_type: ResourceType,
    state: EncodeState,
}

impl Phase {
    pub(crate) fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            state: EncodeState::Pending,
        }
    }

    fn expect(&self, want: EncodeState, op: &'static str) -> EngineResult<()> {
        if self.state != want {
            return Err(EngineError::InvalidPhase {
                resource_type: self.resource_type,
                op,
                phase: self.state.as_str(),
            });
        }
        Ok(())
    }

    pub(crate) fn begin_prepare(&self) -> EngineResult<()> {
        self.expect(EncodeState::Pending, "prepare")
    }

    pub(crate) fn begin_encode(&self) -> EngineResult<()> {
        self.expect(EncodeState::Prepared, "encode")
    }

    pub(crate) fn advance(&mut self) {
        self.state = match self.state {
            EncodeState::Pending => EncodeState::Prepared,
            EncodeState::Prepared | EncodeState::Encoded => EncodeState::Encoded,
        };
    }
}

/// What encoding did with one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new row was created.
    Created,
    /// An existing row was updated.
    Updated,
    /// Nothing was written.
    Skipped,
}

/// Row counts of an encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeReport {
    /// Rows created.
    pub created: usize,
    /// Rows updated.
    pub updated: usize,
    /// Rows skipped by policy or predicate.
    pub skipped: usize,
}

impl EncodeReport {
    /// Returns the number of rows handled.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped
    }

    /// Returns the number of rows written.
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

impl AddAssign<Outcome> for EncodeReport {
    fn add_assign(&mut self, o: Outcome) {
        match o {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

impl AddAssign for EncodeReport {
    fn add_assign(&mut self, o: EncodeReport) {
        self.created += o.created;
        self.updated += o.updated;
        self.skipped += o.skipped;
    }
}

/// Everything a node needs while it is encoded.
pub(crate) struct Payload<'a, S> {
    pub(crate) store: &'a S,
    /// Nodes encoded earlier in this run.
    pub(crate) ctx: &'a [Resource],
    pub(crate) now: DateTime<Utc>,
    pub(crate) config: &'a EncoderConfig,
}

/// Encodes resource graphs into a store.
pub struct Encoder<'a, S> {
    store: &'a S,
    config: EncoderConfig,
    now: Option<DateTime<Utc>>,
}

impl<'a, S: ComposeStore> Encoder<'a, S> {
    /// Creates an encoder writing to the store.
    pub fn new(store: &'a S, config: EncoderConfig) -> Self {
        Self {
            store,
            config,
            now: None,
        }
    }

    /// Fixes the time used for defaulted creation stamps.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Encodes every node.
    ///
    /// The set is reordered into dependency order first; afterwards every
    /// written node holds the row as persisted.
    pub fn encode(&self, resources: &mut ResourceSet) -> EngineResult<EncodeReport> {
        let order = dependency_order(resources)?;
        let mut slots: Vec<Option<Resource>> =
            std::mem::take(resources).into_iter().map(Some).collect();
        *resources = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let now = self.now.unwrap_or_else(Utc::now);
        let mut report = EncodeReport::default();

        for i in 0..resources.len() {
            let (done, rest) = resources.split_at_mut(i);
            let node = &mut rest[0];
            let config = self.config.merged_with(node.base().config());
            let pl = Payload {
                store: self.store,
                ctx: &*done,
                now,
                config: &config,
            };
            report += encode_node(node, &pl)?;
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "encode finished"
        );
        Ok(report)
    }
}

fn encode_node<S: ComposeStore>(
    node: &mut Resource,
    pl: &Payload<'_, S>,
) -> EngineResult<EncodeReport> {
    let mut report = EncodeReport::default();
    match node {
        Resource::Namespace(n) => {
            let mut st = NamespaceState::new();
            st.prepare(n, pl)?;
            report += st.encode(n, pl)?;
        }
        Resource::Module(n) => {
            let mut st = ModuleState::new();
            st.prepare(n, pl)?;
            report += st.encode(n, pl)?;
        }
        Resource::Chart(n) => {
            let mut st = ChartState::new();
            st.prepare(n, pl)?;
            report += st.encode(n, pl)?;
        }
        Resource::Page(n) => {
            let mut st = PageState::new();
            st.prepare(n, pl)?;
            report += st.encode(n, pl)?;
        }
        Resource::Record(n) => {
            let mut st = RecordState::new();
            st.prepare(n, pl)?;
            report += st.encode(n, pl)?;
        }
    }
    Ok(report)
}

/// Picks the ID of the written row: explicit, then existing, then fresh.
pub(crate) fn choose_id<S: IdAllocator>(store: &S, explicit: u64, existing: Option<u64>) -> u64 {
    if explicit > 0 {
        return explicit;
    }
    match existing {
        Some(id) if id > 0 => id,
        _ => store.next_id(),
    }
}

/// Writes node stamps onto a row.
///
/// An unset creation time is taken from the existing row, even when that
/// is unset too; only a create defaults it to `now`.
pub(crate) fn stamp_row(
    ts: Option<&Timestamps>,
    row: &mut RowTimestamps,
    existing: Option<&RowTimestamps>,
    now: DateTime<Utc>,
) {
    if let Some(ts) = ts {
        *row = ts.to_row();
    }
    if row.created_at.is_none() {
        row.created_at = match existing {
            Some(e) => e.created_at,
            None => Some(now),
        };
    }
}

/// Builds the skip predicate environment of a node.
pub(crate) fn skip_env(
    resource_type: ResourceType,
    exists: bool,
    handle: &str,
    name: &str,
) -> SkipEnv {
    SkipEnv::new(exists)
        .with_param("resourceType", resource_type.as_str())
        .with_param("handle", handle)
        .with_param("name", name)
}

/// One row on its way to the store.
pub(crate) struct Write<'a, T> {
    pub(crate) resource_type: ResourceType,
    pub(crate) identifiers: &'a Identifiers,
    pub(crate) env: SkipEnv,
    pub(crate) existing: Option<&'a T>,
    pub(crate) incoming: T,
    pub(crate) merge: fn(&T, &T) -> T,
}

impl<T: Clone> Write<'_, T> {
    /// Evaluates the skip predicate and the conflict policy, then creates
    /// or updates the row.
    ///
    /// Returns the outcome and the row the node should now hold; `None`
    /// leaves the node as it was.
    pub(crate) fn persist(
        self,
        config: &EncoderConfig,
        create: impl FnOnce(&T) -> StoreResult<()>,
        update: impl FnOnce(&T) -> StoreResult<()>,
    ) -> EngineResult<(Outcome, Option<T>)> {
        let rt = self.resource_type;
        let ii = self.identifiers;

        if skip::should_skip(config.skip_if.as_deref(), &self.env)? {
            debug!(resource_type = %rt, identifiers = %ii, "skipped by predicate");
            return Ok((Outcome::Skipped, self.existing.cloned()));
        }

        let Some(existing) = self.existing else {
            create(&self.incoming)?;
            info!(resource_type = %rt, identifiers = %ii, "created");
            return Ok((Outcome::Created, Some(self.incoming)));
        };

        match merge::resolve(config.on_existing, existing, self.incoming, self.merge) {
            Resolution::Keep => {
                warn!(resource_type = %rt, identifiers = %ii, "exists, left untouched");
                Ok((Outcome::Skipped, Some(existing.clone())))
            }
            Resolution::Write(row) => {
                update(&row)?;
                info!(
                    resource_type = %rt,
                    identifiers = %ii,
                    policy = %config.on_existing,
                    "updated"
                );
                Ok((Outcome::Updated, Some(row)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use graphsync_store::IdGenerator;

    #[test]
    fn phases_advance_in_order() {
        let mut p = Phase::new(ResourceType::ComposeModule);
        assert!(p.begin_encode().is_err());
        p.begin_prepare().unwrap();
        p.advance();
        assert!(p.begin_prepare().is_err());
        p.begin_encode().unwrap();
        p.advance();
        let err = p.begin_encode().unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot encode compose:module node in phase encoded"
        );
    }

    #[test]
    fn id_precedence() {
        let ids = IdGenerator::with_seed(500);
        assert_eq!(choose_id(&ids, 7, Some(9)), 7);
        assert_eq!(choose_id(&ids, 0, Some(9)), 9);
        assert_eq!(choose_id(&ids, 0, Some(0)), 500);
        assert_eq!(choose_id(&ids, 0, None), 501);
    }

    #[test]
    fn creation_stamp_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let then = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

        let mut row = RowTimestamps::default();
        stamp_row(None, &mut row, None, now);
        assert_eq!(row.created_at, Some(now));

        let mut row = RowTimestamps {
            created_at: Some(then),
            ..Default::default()
        };
        stamp_row(None, &mut row, None, now);
        assert_eq!(row.created_at, Some(then));

        let ts = Timestamps::make(None, Some(then), None).unwrap();
        stamp_row(Some(&ts), &mut row, None, now);
        assert_eq!(row.created_at, Some(now));
        assert_eq!(row.updated_at, Some(then));
    }

    #[test]
    fn creation_stamp_is_kept_from_existing_row() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let then = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let existing = RowTimestamps {
            created_at: Some(then),
            ..Default::default()
        };

        let mut row = RowTimestamps::default();
        stamp_row(None, &mut row, Some(&existing), now);
        assert_eq!(row.created_at, Some(then));

        let ts = Timestamps::make(None, Some(now), None).unwrap();
        let mut row = RowTimestamps::default();
        stamp_row(Some(&ts), &mut row, Some(&existing), now);
        assert_eq!(row.created_at, Some(then));
        assert_eq!(row.updated_at, Some(now));
    }

    #[test]
    fn unset_creation_stamp_of_existing_row_stays_unset() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let existing = RowTimestamps::default();

        let mut row = RowTimestamps::default();
        stamp_row(None, &mut row, Some(&existing), now);
        assert_eq!(row, RowTimestamps::default());

        let mut row = RowTimestamps::default();
        stamp_row(None, &mut row, None, now);
        assert_eq!(row.created_at, Some(now));
    }

    #[test]
    fn report_counts() {
        let mut r = EncodeReport::default();
        r += Outcome::Created;
        r += Outcome::Skipped;
        r += EncodeReport {
            created: 0,
            updated: 2,
            skipped: 0,
        };
        assert_eq!(r.total(), 4);
        assert_eq!(r.written(), 3);
    }
}
