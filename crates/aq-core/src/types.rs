//! Common types used throughout Aquaplan

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of resource a template type applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceKind {
    Node,
    Link,
    Network,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "NODE",
            Self::Link => "LINK",
            Self::Network => "NETWORK",
        }
    }

    /// Nodes and links are the kinds migrated resource by resource
    pub fn is_feature(&self) -> bool {
        matches!(self, Self::Node | Self::Link)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sharing scope of a compute model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelScope {
    #[default]
    Public,
    Private,
}

impl ModelScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "private" => Self::Private,
            _ => Self::Public,
        }
    }
}
