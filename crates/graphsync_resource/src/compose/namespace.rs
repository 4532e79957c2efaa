use crate::identifier::Identifiers;
use crate::resource::{node_base, ResourceBase};
use crate::stamps::Timestamps;
use graphsync_store::Namespace;

/// A namespace node.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeNamespace {
    pub(crate) base: ResourceBase,
    /// The namespace row.
    pub res: Namespace,
}

impl ComposeNamespace {
    /// Wraps a namespace row; identifiers are slug, name and ID.
    pub fn new(res: Namespace) -> Self {
        let mut base = ResourceBase::new(Identifiers::for_row(&res.slug, &res.name, res.id));
        base.timestamps = Timestamps::from_row(&res.timestamps);
        Self { base, res }
    }
}

node_base!(ComposeNamespace);
