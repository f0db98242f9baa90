//! Management lock inspection.

use async_trait::async_trait;
use azwipe_core::{DeleteTarget, LockInspector, Result};
use serde::Deserialize;
use tracing::debug;

use crate::ArmClient;
use crate::delete::resource_path;

const LOCKS_API_VERSION: &str = "2020-05-01";

/// Lock levels that prevent deletion.
const BLOCKING_LEVELS: [&str; 2] = ["CanNotDelete", "ReadOnly"];

#[derive(Debug, Deserialize)]
struct ManagementLock {
    #[serde(default)]
    name: String,
    properties: LockProperties,
}

#[derive(Debug, Deserialize)]
struct LockProperties {
    level: String,
}

impl ManagementLock {
    fn is_blocking(&self) -> bool {
        BLOCKING_LEVELS
            .iter()
            .any(|level| level.eq_ignore_ascii_case(&self.properties.level))
    }
}

/// Looks up locks that apply at a resource's scope, including inherited ones.
pub struct AzureLockInspector {
    client: ArmClient,
}

impl AzureLockInspector {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LockInspector for AzureLockInspector {
    async fn has_blocking_lock(&self, target: &DeleteTarget) -> Result<bool> {
        let (path, _) = resource_path(target);
        let url = self.client.url(
            &format!("{}/providers/Microsoft.Authorization/locks", path),
            LOCKS_API_VERSION,
        )?;
        let locks: Vec<ManagementLock> = self.client.list_paged(url).await?;

        match locks.iter().find(|l| l.is_blocking()) {
            Some(lock) => {
                debug!(
                    resource = %target.name,
                    lock = %lock.name,
                    level = %lock.properties.level,
                    "Blocking lock found"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(level: &str) -> ManagementLock {
        serde_json::from_value(serde_json::json!({
            "name": "lock",
            "properties": { "level": level }
        }))
        .unwrap()
    }

    #[test]
    fn test_blocking_levels() {
        assert!(lock("CanNotDelete").is_blocking());
        assert!(lock("ReadOnly").is_blocking());
        assert!(lock("readonly").is_blocking());
        assert!(!lock("NotSpecified").is_blocking());
    }
}
