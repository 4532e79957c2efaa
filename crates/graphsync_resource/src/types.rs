//! Resource kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// Compose namespace.
    ComposeNamespace,
    /// Compose module (with its fields).
    ComposeModule,
    /// Compose chart.
    ComposeChart,
    /// Compose page.
    ComposePage,
    /// Set of compose records of one module.
    ComposeRecord,
    /// System user.
    User,
}

impl ResourceType {
    /// Returns the stable name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::ComposeNamespace => "compose:namespace",
            ResourceType::ComposeModule => "compose:module",
            ResourceType::ComposeChart => "compose:chart",
            ResourceType::ComposePage => "compose:page",
            ResourceType::ComposeRecord => "compose:record",
            ResourceType::User => "system:user",
        }
    }

    /// Returns the encode rank; lower ranks are encoded first.
    ///
    /// References only point at kinds with a lower rank, except for page
    /// parents which are ordered within the page rank.
    pub fn rank(&self) -> u8 {
        match self {
            ResourceType::User => 0,
            ResourceType::ComposeNamespace => 1,
            ResourceType::ComposeModule => 2,
            ResourceType::ComposeChart => 3,
            ResourceType::ComposePage => 4,
            ResourceType::ComposeRecord => 5,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
