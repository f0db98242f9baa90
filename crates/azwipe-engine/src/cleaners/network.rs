//! Network cleaners: interfaces, public IPs and security groups.

use async_trait::async_trait;
use azwipe_core::{OrphanQuery, Platform, ResourceKind, ResourceRecord, Result};

use super::{delete_resource, discover_orphans};
use crate::ResourceCleaner;

/// Deletes network interfaces no VM references.
pub struct NicCleaner {
    platform: Platform,
}

impl NicCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[ResourceKind::Vm];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for NicCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Nic
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(&self.platform, OrphanQuery::OrphanNics, subscriptions).await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }
}

/// Deletes public IPs with no IP configuration.
pub struct PublicIpCleaner {
    platform: Platform,
}

impl PublicIpCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[ResourceKind::Nic, ResourceKind::Vm];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for PublicIpCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PublicIp
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(&self.platform, OrphanQuery::UnusedPublicIps, subscriptions).await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }
}

/// Deletes security groups attached to no interface and no subnet.
pub struct NsgCleaner {
    platform: Platform,
}

impl NsgCleaner {
    pub const DEPENDENCIES: &'static [ResourceKind] = &[ResourceKind::Nic];

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn boxed(platform: &Platform) -> Box<dyn ResourceCleaner> {
        Box::new(Self::new(platform.clone()))
    }
}

#[async_trait]
impl ResourceCleaner for NsgCleaner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Nsg
    }

    fn dependencies(&self) -> &'static [ResourceKind] {
        Self::DEPENDENCIES
    }

    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>> {
        discover_orphans(&self.platform, OrphanQuery::UnusedNsgs, subscriptions).await
    }

    async fn delete(&self, resource: &ResourceRecord) -> Result<()> {
        delete_resource(&self.platform, resource).await
    }
}
