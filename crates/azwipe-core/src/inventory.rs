//! Inventory source trait and orphan queries.
//!
//! The inventory source discovers resources. Pagination and query execution are its
//! concern; the engine only ever sees fully materialized record lists.

use async_trait::async_trait;

use crate::{ResourceKind, ResourceRecord, Result};

/// The orphan/idle predicate a cleaner asks the inventory source to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrphanQuery {
    /// Managed disks with no owner in the `Unattached` state.
    UnattachedDisks,
    /// Network interfaces with no virtual machine reference.
    OrphanNics,
    /// Public IPs with no IP configuration.
    UnusedPublicIps,
    /// Network security groups attached to no interface and no subnet.
    UnusedNsgs,
    /// Every virtual machine.
    AllVms,
    /// Resource groups containing zero resources.
    EmptyResourceGroups,
}

impl OrphanQuery {
    pub fn kind(self) -> ResourceKind {
        match self {
            OrphanQuery::UnattachedDisks => ResourceKind::Disk,
            OrphanQuery::OrphanNics => ResourceKind::Nic,
            OrphanQuery::UnusedPublicIps => ResourceKind::PublicIp,
            OrphanQuery::UnusedNsgs => ResourceKind::Nsg,
            OrphanQuery::AllVms => ResourceKind::Vm,
            OrphanQuery::EmptyResourceGroups => ResourceKind::ResourceGroup,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OrphanQuery::UnattachedDisks => "unattached disks",
            OrphanQuery::OrphanNics => "orphan NICs",
            OrphanQuery::UnusedPublicIps => "unused public IPs",
            OrphanQuery::UnusedNsgs => "unused NSGs",
            OrphanQuery::AllVms => "VMs",
            OrphanQuery::EmptyResourceGroups => "empty resource groups",
        }
    }
}

/// Trait for resource discovery backends.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// List the identifiers of all enabled subscriptions visible to the caller.
    async fn list_enabled_subscriptions(&self) -> Result<Vec<String>>;

    /// Evaluate an orphan query across the given subscriptions.
    async fn query_orphan_resources(
        &self,
        query: OrphanQuery,
        subscriptions: &[String],
    ) -> Result<Vec<ResourceRecord>>;
}
