use async_trait::async_trait;
use azwipe_core::{DeleteTarget, OrphanQuery, Platform, ResourceKind, ResourceRecord, Result};
use tracing::warn;

use super::{delete_resource, discover_orphans};
use crate::ResourceCleaner;

/// Deletes virtual machines that carry no blocking management lock.
pub struct VmCleaner {
    platform: Platform,
}

impl VmCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for VmCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Vm
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(&self.platform, OrphanQuery::AllVms, subscriptions).await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }

    // Lock lookup failures count as "no lock": a flaky locks API must not stall cleanup.
    async fn is_protected(&self, resource: &ResourceRecord) -> bool {
        match self
            .platform
            .locks
            .has_blocking_lock(&DeleteTarget::from(resource))
            .await
        {
            Ok(locked) => locked,
            Err(e) => {
                warn!(
                    resource_id = %resource.id,
                    error = %e,
                    "Lock check failed, treating VM as unlocked"
                );
                false
            }
        }
    }
}
