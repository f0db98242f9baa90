//! In-memory collaborators for engine tests.

use async_trait::async_trait;
use azwipe_core::{
    DeleteTarget, Error, InventorySource, LockInspector, OrphanQuery, Platform, ResourceDeleter,
    ResourceKind, ResourceRecord, Result, TransientKind,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::RetryPolicy;

/// How the fake deleter responds for a resource name.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    NotFound,
    AlwaysThrottled,
    AlwaysConnection,
    /// Throttled this many times, then succeeds.
    FailTimes(u32),
}

#[derive(Default)]
struct State {
    subscriptions: Vec<(String, bool)>,
    records: HashMap<OrphanQuery, Vec<ResourceRecord>>,
    failing_queries: HashSet<OrphanQuery>,
    behaviors: HashMap<String, Behavior>,
    locked: HashSet<String>,
    lock_errors: HashSet<String>,
    subscription_lists: u32,
    queried_subscriptions: Vec<Vec<String>>,
    query_order: Vec<OrphanQuery>,
    delete_calls: HashMap<String, u32>,
    lock_checks: u32,
}

#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<State>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(self, subscriptions: &[(&str, bool)]) -> Self {
        self.state.lock().unwrap().subscriptions = subscriptions
            .iter()
            .map(|(id, enabled)| (id.to_string(), *enabled))
            .collect();
        self
    }

    pub fn with_records(self, query: OrphanQuery, records: Vec<ResourceRecord>) -> Self {
        self.state.lock().unwrap().records.insert(query, records);
        self
    }

    pub fn with_failing_query(self, query: OrphanQuery) -> Self {
        self.state.lock().unwrap().failing_queries.insert(query);
        self
    }

    pub fn with_behavior(self, name: &str, behavior: Behavior) -> Self {
        self.state
            .lock()
            .unwrap()
            .behaviors
            .insert(name.to_string(), behavior);
        self
    }

    pub fn with_lock(self, name: &str) -> Self {
        self.state.lock().unwrap().locked.insert(name.to_string());
        self
    }

    pub fn with_lock_error(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .lock_errors
            .insert(name.to_string());
        self
    }

    pub fn platform(&self) -> Platform {
        let fake = Arc::new(self.clone());
        Platform::new(fake.clone(), fake.clone(), fake)
    }

    pub fn delete_calls(&self, name: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .delete_calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_delete_calls(&self) -> u32 {
        self.state.lock().unwrap().delete_calls.values().sum()
    }

    pub fn lock_checks(&self) -> u32 {
        self.state.lock().unwrap().lock_checks
    }

    pub fn subscription_lists(&self) -> u32 {
        self.state.lock().unwrap().subscription_lists
    }

    pub fn queried_subscriptions(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().queried_subscriptions.clone()
    }

    pub fn query_order(&self) -> Vec<OrphanQuery> {
        self.state.lock().unwrap().query_order.clone()
    }
}

#[async_trait]
impl InventorySource for FakePlatform {
    async fn list_enabled_subscriptions(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.subscription_lists += 1;
        Ok(state
            .subscriptions
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn query_orphan_resources(
        &self,
        query: OrphanQuery,
        subscriptions: &[String],
    ) -> Result<Vec<ResourceRecord>> {
        let mut state = self.state.lock().unwrap();
        state.query_order.push(query);
        state.queried_subscriptions.push(subscriptions.to_vec());
        if state.failing_queries.contains(&query) {
            return Err(Error::Forbidden("graph query denied".to_string()));
        }
        Ok(state.records.get(&query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ResourceDeleter for FakePlatform {
    async fn begin_delete(&self, target: &DeleteTarget) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let calls = {
            let entry = state.delete_calls.entry(target.name.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        match state.behaviors.get(&target.name) {
            None => Ok(()),
            Some(Behavior::NotFound) => Err(Error::NotFound(target.name.clone())),
            Some(Behavior::AlwaysThrottled) => Err(Error::Throttled("429".to_string())),
            Some(Behavior::AlwaysConnection) => Err(Error::Connection("reset".to_string())),
            Some(Behavior::FailTimes(n)) if calls <= *n => {
                Err(Error::Throttled("429".to_string()))
            }
            Some(Behavior::FailTimes(_)) => Ok(()),
        }
    }
}

#[async_trait]
impl LockInspector for FakePlatform {
    async fn has_blocking_lock(&self, target: &DeleteTarget) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.lock_checks += 1;
        if state.lock_errors.contains(&target.name) {
            return Err(Error::Unavailable("locks API down".to_string()));
        }
        Ok(state.locked.contains(&target.name))
    }
}

pub fn record(kind: ResourceKind, prefix: &str, name: &str) -> ResourceRecord {
    ResourceRecord::new(kind, format!("/{}/{}", prefix, name), name, "rg-dev", "sub-1")
}

pub fn disk(name: &str) -> ResourceRecord {
    record(ResourceKind::Disk, "disks", name)
}

pub fn vm(name: &str) -> ResourceRecord {
    record(ResourceKind::Vm, "vms", name)
}

/// Retry policy that never waits.
pub fn instant_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        max_jitter: Duration::ZERO,
        retryable: TransientKind::ALL.into_iter().collect(),
    }
}
