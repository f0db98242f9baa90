use async_trait::async_trait;
use azwipe_core::{OrphanQuery, Platform, ResourceKind, ResourceRecord, Result};

use super::{delete_resource, discover_orphans};
use crate::ResourceCleaner;

/// Deletes unattached managed disks.
pub struct DiskCleaner {
    platform: Platform,
}

impl DiskCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[ResourceKind::Vm];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for DiskCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Disk
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(&self.platform, OrphanQuery::UnattachedDisks, subscriptions).await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }
}
