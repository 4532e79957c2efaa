//! Resource nodes.

use crate::compose::{ComposeChart, ComposeModule, ComposeNamespace, ComposePage, ComposeRecord};
use crate::config::EnvoyConfig;
use crate::identifier::Identifiers;
use crate::stamps::{Timestamps, Userstamps};
use crate::types::ResourceType;

/// Attributes shared by every node.
///
/// The identifier set is fixed at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBase {
    identifiers: Identifiers,
    pub(crate) timestamps: Option<Timestamps>,
    pub(crate) userstamps: Option<Userstamps>,
    pub(crate) config: EnvoyConfig,
}

impl ResourceBase {
    pub(crate) fn new(identifiers: Identifiers) -> Self {
        Self {
            identifiers,
            ..Default::default()
        }
    }

    /// Names the node is known by.
    pub fn identifiers(&self) -> &Identifiers {
        &self.identifiers
    }

    /// Lifecycle times.
    pub fn timestamps(&self) -> Option<&Timestamps> {
        self.timestamps.as_ref()
    }

    /// Responsible users.
    pub fn userstamps(&self) -> Option<&Userstamps> {
        self.userstamps.as_ref()
    }

    /// Encoding overrides.
    pub fn config(&self) -> &EnvoyConfig {
        &self.config
    }
}

/// Adds the shared accessors and builders to a node type.
macro_rules! node_base {
    ($node:ty) => {
        impl $node {
            /// Returns the shared node attributes.
            pub fn base(&self) -> &$crate::resource::ResourceBase {
                &self.base
            }

            /// Names the node is known by.
            pub fn identifiers(&self) -> &$crate::identifier::Identifiers {
                self.base.identifiers()
            }

            /// Sets the encoding overrides.
            #[must_use]
            pub fn with_config(mut self, config: $crate::config::EnvoyConfig) -> Self {
                self.base.config = config;
                self
            }

            /// Sets the lifecycle times.
            #[must_use]
            pub fn with_timestamps(mut self, ts: Option<$crate::stamps::Timestamps>) -> Self {
                self.base.timestamps = ts;
                self
            }

            /// Sets the responsible users.
            #[must_use]
            pub fn with_userstamps(mut self, us: Option<$crate::stamps::Userstamps>) -> Self {
                self.base.userstamps = us;
                self
            }
        }
    };
}
pub(crate) use node_base;

/// A node of the resource graph.
#[derive(Debug)]
pub enum Resource {
    /// Namespace node.
    Namespace(ComposeNamespace),
    /// Module node.
    Module(ComposeModule),
    /// Chart node.
    Chart(ComposeChart),
    /// Page node.
    Page(ComposePage),
    /// Record set node.
    Record(ComposeRecord),
}

impl Resource {
    /// Returns the node kind.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Namespace(_) => ResourceType::ComposeNamespace,
            Resource::Module(_) => ResourceType::ComposeModule,
            Resource::Chart(_) => ResourceType::ComposeChart,
            Resource::Page(_) => ResourceType::ComposePage,
            Resource::Record(_) => ResourceType::ComposeRecord,
        }
    }

    /// Returns the shared node attributes.
    pub fn base(&self) -> &ResourceBase {
        match self {
            Resource::Namespace(n) => n.base(),
            Resource::Module(n) => n.base(),
            Resource::Chart(n) => n.base(),
            Resource::Page(n) => n.base(),
            Resource::Record(n) => n.base(),
        }
    }

    /// Names the node is known by.
    pub fn identifiers(&self) -> &Identifiers {
        self.base().identifiers()
    }

    /// Returns the store ID of the node's row, zero when not persisted.
    ///
    /// Record sets have no single row and always report zero.
    pub fn sys_id(&self) -> u64 {
        match self {
            Resource::Namespace(n) => n.res.id,
            Resource::Module(n) => n.res.id,
            Resource::Chart(n) => n.res.id,
            Resource::Page(n) => n.res.id,
            Resource::Record(_) => 0,
        }
    }
}

impl From<ComposeNamespace> for Resource {
    fn from(n: ComposeNamespace) -> Self {
        Resource::Namespace(n)
    }
}

impl From<ComposeModule> for Resource {
    fn from(n: ComposeModule) -> Self {
        Resource::Module(n)
    }
}

impl From<ComposeChart> for Resource {
    fn from(n: ComposeChart) -> Self {
        Resource::Chart(n)
    }
}

impl From<ComposePage> for Resource {
    fn from(n: ComposePage) -> Self {
        Resource::Page(n)
    }
}

impl From<ComposeRecord> for Resource {
    fn from(n: ComposeRecord) -> Self {
        Resource::Record(n)
    }
}
