//! Compose resource nodes.

mod chart;
mod module;
mod namespace;
mod page;
mod record;

pub use chart::ComposeChart;
pub use module::ComposeModule;
pub use namespace::ComposeNamespace;
pub use page::ComposePage;
pub use record::{ComposeRecord, ComposeRecordRaw, RecordSource, VecRecordSource};
