use crate::identifier::Identifiers;
use crate::reference::Ref;
use crate::resource::{node_base, ResourceBase};
use crate::stamps::Timestamps;
use crate::types::ResourceType;
use graphsync_store::Module;

/// A module node, carrying its field definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeModule {
    pub(crate) base: ResourceBase,
    /// The module row with its fields.
    pub res: Module,
    /// Owning namespace.
    pub ref_ns: Ref,
}

impl ComposeModule {
    /// Wraps a module row declared under the given namespace.
    pub fn new(res: Module, namespace: Identifiers) -> Self {
        let mut base = ResourceBase::new(Identifiers::for_row(&res.handle, &res.name, res.id));
        base.timestamps = Timestamps::from_row(&res.timestamps);
        Self {
            base,
            res,
            ref_ns: Ref::new(ResourceType::ComposeNamespace, namespace),
        }
    }

    /// Wraps a stored module row, referencing its namespace by ID.
    pub fn from_store(res: Module) -> Self {
        let ns = Identifiers::for_row("", "", res.namespace_id);
        Self::new(res, ns)
    }
}

node_base!(ComposeModule);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_module_references_namespace_id() {
        let m = ComposeModule::from_store(Module {
            id: 9,
            namespace_id: 3,
            handle: "contacts".into(),
            ..Default::default()
        });
        assert_eq!(m.identifiers().to_string(), "{contacts, 9}");
        assert_eq!(m.ref_ns.identifiers.to_string(), "{3}");
        assert_eq!(m.ref_ns.resource_type, ResourceType::ComposeNamespace);
    }
}
