//! Resource records and resource kinds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A kind of cloud resource azwipe knows how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "vm")]
    Vm,
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "nic")]
    Nic,
    #[serde(rename = "publicip")]
    PublicIp,
    #[serde(rename = "nsg")]
    Nsg,
    #[serde(rename = "resource_group")]
    ResourceGroup,
}

/// Canonical processing order: every kind comes after the kinds that reference it.
pub const CLEANUP_ORDER: [ResourceKind; 6] = [
    ResourceKind::Vm,
    ResourceKind::Disk,
    ResourceKind::Nic,
    ResourceKind::PublicIp,
    ResourceKind::Nsg,
    ResourceKind::ResourceGroup,
];

impl ResourceKind {
    /// Configuration key of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Vm => "vm",
            ResourceKind::Disk => "disk",
            ResourceKind::Nic => "nic",
            ResourceKind::PublicIp => "publicip",
            ResourceKind::Nsg => "nsg",
            ResourceKind::ResourceGroup => "resource_group",
        }
    }

    /// Human-readable name used in log messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ResourceKind::Vm => "VM",
            ResourceKind::Disk => "disk",
            ResourceKind::Nic => "NIC",
            ResourceKind::PublicIp => "public IP",
            ResourceKind::Nsg => "NSG",
            ResourceKind::ResourceGroup => "resource group",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CLEANUP_ORDER
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownResourceKind(s.to_string()))
    }
}

/// A resource as reported by the inventory source. Read-only to the cleanup engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Globally unique, opaque identifier.
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub location: String,
    pub kind: ResourceKind,
    /// Absent tags are an empty map.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Kind-specific properties, passed through untouched.
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl ResourceRecord {
    pub fn new(
        kind: ResourceKind,
        id: impl Into<String>,
        name: impl Into<String>,
        resource_group: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_group: resource_group.into(),
            subscription_id: subscription_id.into(),
            location: String::new(),
            kind,
            tags: BTreeMap::new(),
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
