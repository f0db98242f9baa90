//! Long-running ARM deletes.

use async_trait::async_trait;
use azwipe_core::{DeleteTarget, ResourceDeleter, ResourceKind, Result};
use tracing::debug;

use crate::ArmClient;

/// Provider path segment and api-version used to delete each kind.
fn provider(kind: ResourceKind) -> (&'static str, &'static str) {
    match kind {
        ResourceKind::Vm => ("Microsoft.Compute/virtualMachines", "2024-03-01"),
        ResourceKind::Disk => ("Microsoft.Compute/disks", "2023-04-02"),
        ResourceKind::Nic => ("Microsoft.Network/networkInterfaces", "2023-09-01"),
        ResourceKind::PublicIp => ("Microsoft.Network/publicIPAddresses", "2023-09-01"),
        ResourceKind::Nsg => ("Microsoft.Network/networkSecurityGroups", "2023-09-01"),
        ResourceKind::ResourceGroup => ("", "2022-09-01"),
    }
}

/// ARM path of `target` and the api-version to address it with.
pub fn resource_path(target: &DeleteTarget) -> (String, &'static str) {
    let (provider, api_version) = provider(target.kind);
    let path = match target.kind {
        ResourceKind::ResourceGroup => format!(
            "subscriptions/{}/resourcegroups/{}",
            target.subscription_id, target.name
        ),
        _ => format!(
            "subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            target.subscription_id, target.resource_group, provider, target.name
        ),
    };
    (path, api_version)
}

/// Deletes resources through Azure Resource Manager.
pub struct AzureDeleter {
    client: ArmClient,
}

impl AzureDeleter {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceDeleter for AzureDeleter {
    async fn begin_delete(&self, target: &DeleteTarget) -> Result<()> {
        let (path, api_version) = resource_path(target);
        debug!(kind = %target.kind, path = %path, "Issuing delete");
        let url = self.client.url(&path, api_version)?;
        self.client.delete_and_wait(url).await
    }
}
