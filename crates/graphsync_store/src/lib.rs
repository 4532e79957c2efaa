//! # graphsync store
//!
//! Store rows and the collaborator interface consumed by the graphsync
//! engine.
//!
//! This crate provides:
//! - Row types for namespaces, modules, records, pages, charts and users
//! - Search filters with cursor based paging
//! - The store traits ([`ComposeStore`] and its parts) and [`IdAllocator`]
//! - [`InMemoryStore`], a complete in-memory implementation with
//!   operation counters, fault injection and CBOR snapshots
//!
//! ## Paging
//!
//! Every search returns one [`SearchPage`] of rows. A present `next_cursor` means
//! more rows follow; callers resume by copying it into the filter's
//! `paging.page_cursor`. A limit of zero returns all remaining rows.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod filter;
mod id;
mod memory;
mod snapshot;
mod types;

pub use backend::{
    ChartStore, ComposeStore, IdAllocator, ModuleStore, NamespaceStore, PageStore, RecordStore,
    UserStore,
};
pub use error::{StoreError, StoreResult};
pub use filter::{
    ChartFilter, ModuleFieldFilter, ModuleFilter, NamespaceFilter, PageCursor, PageFilter, Paging,
    RecordFilter, SearchPage, UserFilter,
};
pub use id::IdGenerator;
pub use memory::{InMemoryStore, StoreOp, Tables};
pub use types::{
    Chart, ChartConfig, ChartReport, Module, ModuleField, Namespace, Options, Page,
    PageBlock, Record, RecordValue, RowTimestamps, User,
};
