use async_trait::async_trait;
use azwipe_core::{OrphanQuery, Platform, ResourceKind, ResourceRecord, Result};

use super::{delete_resource, discover_orphans};
use crate::ResourceCleaner;

/// Deletes resource groups that contain no resources. Runs last.
pub struct ResourceGroupCleaner {
    platform: Platform,
}

impl ResourceGroupCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[
        ResourceKind::Vm,
        ResourceKind::Disk,
        ResourceKind::Nic,
        ResourceKind::PublicIp,
        ResourceKind::Nsg,
    ];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for ResourceGroupCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ResourceGroup
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(
            &self.platform,
            OrphanQuery::EmptyResourceGroups,
            subscriptions,
        )
        .await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }
}
