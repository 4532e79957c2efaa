//! # graphsync engine
//!
//! Moves compose resource graphs between a store and resource nodes.
//!
//! This crate provides:
//! - [`Decoder`]: paged, filtered reads of namespaces, modules, charts,
//!   pages and records into a [`ResourceSet`]
//! - [`Encoder`]: dependency ordered writes of a [`ResourceSet`] with
//!   reference resolution, conflict merging and skip predicates
//! - [`SyncRun`]: both pipelines against one store, with state tracking
//!
//! ## Encoding
//!
//! ```rust
//! use graphsync_engine::{Encoder, EncoderConfig, MergeStrategy};
//! use graphsync_resource::{ComposeModule, ComposeNamespace, Identifiers, ResourceSet};
//! use graphsync_store::{InMemoryStore, Module, Namespace};
//!
//! let store = InMemoryStore::new();
//! let mut rr = ResourceSet::new();
//! rr.push(ComposeModule::new(
//!     Module { handle: "contacts".into(), ..Default::default() },
//!     Identifiers::from_values(["crm"]),
//! ));
//! rr.push(ComposeNamespace::new(Namespace { slug: "crm".into(), ..Default::default() }));
//!
//! let config = EncoderConfig::default().with_on_existing(MergeStrategy::MergeLeft);
//! let report = Encoder::new(&store, config).encode(&mut rr).unwrap();
//! assert_eq!(report.created, 2);
//! assert_eq!(store.tables().modules.len(), 1);
//! ```
//!
//! ## Skip predicates
//!
//! A skip predicate is a boolean expression over `missing`, `exists` and
//! the node parameters `resourceType`, `handle` and `name`, for example
//! `exists && handle == "contacts"`. A node whose predicate holds is not
//! written.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod decode;
mod encode;
mod error;
mod lookup;
pub mod merge;
mod run;
pub mod skip;

pub use config::{DecoderConfig, EncoderConfig};
pub use decode::{DecodeFilter, DecodeOutput, Decoder, StoreRecordSource};
pub use encode::{EncodeReport, EncodeState, Encoder, Outcome};
pub use error::{EngineError, EngineResult};
pub use graphsync_resource::{MergeStrategy, ResourceSet};
pub use run::{RunState, RunStats, SyncRun};
