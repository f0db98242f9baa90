//! Concrete cleaners, one per resource kind, and the kind to cleaner lookup table.

mod disk;
mod network;
mod resource_group;
mod vm;

pub use disk::DiskCleaner;
pub use network::{NicCleaner, NsgCleaner, PublicIpCleaner};
pub use resource_group::ResourceGroupCleaner;
pub use vm::VmCleaner;

use azwipe_core::{
    DeleteTarget, OrphanQuery, Platform, ResourceKind, ResourceRecord, Result,
};
use tracing::info;

use crate::ResourceCleaner;

/// A row of the cleaner lookup table.
#[derive(Debug, Clone, Copy)]
pub struct CleanerEntry {
    pub kind: ResourceKind,
    pub dependencies: &'static [ResourceKind],
    build: fn(&Platform) -> Box<dyn ResourceCleaner>,
}

impl CleanerEntry {
    /// Create a fresh cleaner for one run.
    pub fn build(&self, platform: &Platform) -> Box<dyn ResourceCleaner> {
        (self.build)(platform)
    }
}

/// Every cleaner azwipe knows about.
pub const CLEANERS: [CleanerEntry; 6] = [
    CleanerEntry {
        kind: ResourceKind::Vm,
        dependencies: VmCleaner::DEPENDENCIES,
        build: VmCleaner::boxed,
    },
    CleanerEntry {
        kind: ResourceKind::Disk,
        dependencies: DiskCleaner::DEPENDENCIES,
        build: DiskCleaner::boxed,
    },
    CleanerEntry {
        kind: ResourceKind::Nic,
        dependencies: NicCleaner::DEPENDENCIES,
        build: NicCleaner::boxed,
    },
    CleanerEntry {
        kind: ResourceKind::PublicIp,
        dependencies: PublicIpCleaner::DEPENDENCIES,
        build: PublicIpCleaner::boxed,
    },
    CleanerEntry {
        kind: ResourceKind::Nsg,
        dependencies: NsgCleaner::DEPENDENCIES,
        build: NsgCleaner::boxed,
    },
    CleanerEntry {
        kind: ResourceKind::ResourceGroup,
        dependencies: ResourceGroupCleaner::DEPENDENCIES,
        build: ResourceGroupCleaner::boxed,
    },
];

/// Look up the table entry for `kind`.
pub fn entry_for(kind: ResourceKind) -> Option<&'static CleanerEntry> {
    CLEANERS.iter().find(|e| e.kind == kind)
}

async fn discover_orphans(
    platform: &Platform,
    query: OrphanQuery,
    subscriptions: &[String],
) -> Result<Vec<ResourceRecord>> {
    info!(kind = %query.kind(), "Discovering {}...", query.description());
    let resources = platform
        .inventory
        .query_orphan_resources(query, subscriptions)
        .await?;
    info!(kind = %query.kind(), "Found {} {}", resources.len(), query.description());
    Ok(resources)
}

async fn delete_resource(platform: &Platform, resource: &ResourceRecord) -> Result<()> {
    platform
        .deleter
        .begin_delete(&DeleteTarget::from(resource))
        .await
}
