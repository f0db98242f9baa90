//! Azure backends for azwipe.
//!
//! Implements the platform collaborators against Azure Resource Manager:
//! - Resource Graph inventory source
//! - Long-running resource deletes
//! - Management lock inspection
//! - Bearer token acquisition from the environment or the Azure CLI

pub mod arm;
pub mod credential;
pub mod delete;
pub mod graph;
pub mod locks;

#[cfg(test)]
mod testing;

pub use arm::ArmClient;
pub use credential::{AzureCliCredential, ChainedCredential, EnvCredential};
pub use delete::AzureDeleter;
pub use graph::ResourceGraph;
pub use locks::AzureLockInspector;

use azwipe_core::{CredentialProvider, Platform, Result};
use std::sync::Arc;

/// Build the Azure platform from a credential provider.
pub fn azure_platform(credential: Arc<dyn CredentialProvider>) -> Result<Platform> {
    let client = ArmClient::new(credential)?;
    Ok(Platform::new(
        Arc::new(ResourceGraph::new(client.clone())),
        Arc::new(AzureDeleter::new(client.clone())),
        Arc::new(AzureLockInspector::new(client)),
    ))
}
