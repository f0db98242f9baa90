//! Platform capabilities invoked by cleaners.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{InventorySource, ResourceKind, ResourceRecord, Result};

/// Coordinates of a single resource on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTarget {
    pub kind: ResourceKind,
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl From<&ResourceRecord> for DeleteTarget {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            kind: record.kind,
            subscription_id: record.subscription_id.clone(),
            resource_group: record.resource_group.clone(),
            name: record.name.clone(),
        }
    }
}

/// Trait for platform delete backends.
#[async_trait]
pub trait ResourceDeleter: Send + Sync {
    /// Delete one resource and wait until the platform reports a terminal state.
    ///
    /// Returns `Ok(())` only once deletion has been confirmed.
    async fn begin_delete(&self, target: &DeleteTarget) -> Result<()>;
}

/// Trait for management lock lookups.
#[async_trait]
pub trait LockInspector: Send + Sync {
    /// Whether a lock that blocks deletion is present on the target.
    async fn has_blocking_lock(&self, target: &DeleteTarget) -> Result<bool>;
}

/// The collaborators a cleanup run talks to.
#[derive(Clone)]
pub struct Platform {
    pub inventory: Arc<dyn InventorySource>,
    pub deleter: Arc<dyn ResourceDeleter>,
    pub locks: Arc<dyn LockInspector>,
}

impl Platform {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        deleter: Arc<dyn ResourceDeleter>,
        locks: Arc<dyn LockInspector>,
    ) -> Self {
        Self {
            inventory,
            deleter,
            locks,
        }
    }
}
