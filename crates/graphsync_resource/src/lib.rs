//! # graphsync resource model
//!
//! The vocabulary shared by the decode and encode pipelines:
//!
//! - [`Identifiers`]: the names a node is known by
//! - [`Ref`]: a symbolic, optionally constrained pointer to another node
//! - [`Resource`]: a graph node, one variant per compose kind
//! - [`embedded`]: references living inside page block options
//! - [`index`]: first-match lookups over a resource graph
//!
//! Nodes are built either from store rows (`from_store`) or from declared
//! entries (`new`), carry references as unresolved identifier queries and
//! are discarded once a sync run completes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compose;
mod config;
pub mod embedded;
mod error;
mod identifier;
pub mod index;
mod reference;
mod resource;
mod stamps;
mod types;
mod userstamp;

pub use compose::{
    ComposeChart, ComposeModule, ComposeNamespace, ComposePage, ComposeRecord, ComposeRecordRaw,
    RecordSource, VecRecordSource,
};
pub use config::{EnvoyConfig, MergeStrategy};
pub use error::{ResourceError, ResourceResult};
pub use identifier::Identifiers;
pub use index::ResourceSet;
pub use reference::{Ref, RefSet};
pub use resource::{Resource, ResourceBase};
pub use stamps::{Timestamps, Userstamp, Userstamps};
pub use types::ResourceType;
pub use userstamp::UserstampIndex;
