//! Resource Graph inventory source.

use async_trait::async_trait;
use azwipe_core::{InventorySource, OrphanQuery, ResourceKind, ResourceRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::ArmClient;

const GRAPH_PATH: &str = "providers/Microsoft.ResourceGraph/resources";
const GRAPH_API_VERSION: &str = "2022-10-01";
const SUBSCRIPTIONS_PATH: &str = "subscriptions";
const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

/// Resource Graph accepts at most this many subscriptions per request.
const MAX_SUBSCRIPTIONS_PER_QUERY: usize = 1000;

/// KQL evaluated for each orphan query.
pub fn kql(query: OrphanQuery) -> &'static str {
    match query {
        OrphanQuery::UnattachedDisks => {
            "Resources
            | where type =~ 'microsoft.compute/disks'
            | where managedBy == '' or isnull(managedBy)
            | where properties.diskState =~ 'Unattached'
            | project id, name, resourceGroup, subscriptionId, location, tags"
        }
        OrphanQuery::OrphanNics => {
            "Resources
            | where type =~ 'microsoft.network/networkinterfaces'
            | where isnull(properties.virtualMachine)
            | project id, name, resourceGroup, subscriptionId, location, tags"
        }
        OrphanQuery::UnusedPublicIps => {
            "Resources
            | where type =~ 'microsoft.network/publicipaddresses'
            | where isnull(properties.ipConfiguration)
            | project id, name, resourceGroup, subscriptionId, location, tags"
        }
        OrphanQuery::UnusedNsgs => {
            "Resources
            | where type =~ 'microsoft.network/networksecuritygroups'
            | where isnull(properties.networkInterfaces) or array_length(properties.networkInterfaces) == 0
            | where isnull(properties.subnets) or array_length(properties.subnets) == 0
            | project id, name, resourceGroup, subscriptionId, location, tags"
        }
        OrphanQuery::AllVms => {
            "Resources
            | where type =~ 'microsoft.compute/virtualmachines'
            | project id, name, resourceGroup, subscriptionId, location, tags, properties"
        }
        OrphanQuery::EmptyResourceGroups => {
            // Resources reports resourceGroup lowercased, so join on lowercased names.
            "ResourceContainers
            | where type =~ 'microsoft.resources/subscriptions/resourcegroups'
            | extend rgKey = tolower(name)
            | join kind=leftouter (
                Resources
                | extend rgKey = tolower(resourceGroup)
                | summarize count() by rgKey, subscriptionId
            ) on rgKey, subscriptionId
            | where isnull(count_) or count_ == 0
            | project id, name, subscriptionId, location, tags"
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    subscriptions: &'a [String],
    query: &'a str,
    options: QueryOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryOptions<'a> {
    result_format: &'static str,
    #[serde(rename = "$skipToken", skip_serializing_if = "Option::is_none")]
    skip_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Vec<GraphRow>,
    #[serde(rename = "$skipToken", default)]
    skip_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRow {
    id: String,
    name: String,
    #[serde(default)]
    resource_group: Option<String>,
    subscription_id: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
}

impl GraphRow {
    fn into_record(self, kind: ResourceKind) -> ResourceRecord {
        // Resource group rows have no resourceGroup column; they are their own group.
        let resource_group = match kind {
            ResourceKind::ResourceGroup => self.name.clone(),
            _ => self.resource_group.unwrap_or_default(),
        };
        ResourceRecord {
            id: self.id,
            name: self.name,
            resource_group,
            subscription_id: self.subscription_id,
            location: self.location.unwrap_or_default(),
            kind,
            tags: self.tags.unwrap_or_default(),
            properties: self.properties.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    subscription_id: String,
    #[serde(default)]
    state: String,
}

/// Inventory source backed by Azure Resource Graph.
pub struct ResourceGraph {
    client: ArmClient,
}

impl ResourceGraph {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    async fn query_chunk(
        &self,
        query: &str,
        subscriptions: &[String],
        kind: ResourceKind,
    ) -> Result<Vec<ResourceRecord>> {
        let url = self.client.url(GRAPH_PATH, GRAPH_API_VERSION)?;
        let mut records = Vec::new();
        let mut skip_token: Option<String> = None;
        let mut page = 0u32;

        loop {
            let request = QueryRequest {
                subscriptions,
                query,
                options: QueryOptions {
                    result_format: "objectArray",
                    skip_token: skip_token.as_deref(),
                },
            };
            let response: QueryResponse = self.client.post_json(url.clone(), &request).await?;
            page += 1;
            debug!(%kind, page, rows = response.data.len(), "Resource Graph page");
            records.extend(response.data.into_iter().map(|row| row.into_record(kind)));

            match response.skip_token {
                Some(token) if !token.is_empty() => skip_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl InventorySource for ResourceGraph {
    async fn list_enabled_subscriptions(&self) -> Result<Vec<String>> {
        let url = self.client.url(SUBSCRIPTIONS_PATH, SUBSCRIPTIONS_API_VERSION)?;
        let subscriptions: Vec<Subscription> = self.client.list_paged(url).await?;
        let enabled = enabled_subscriptions(subscriptions);
        info!("Found {} enabled subscriptions", enabled.len());
        Ok(enabled)
    }

    async fn query_orphan_resources(
        &self,
        query: OrphanQuery,
        subscriptions: &[String],
    ) -> Result<Vec<ResourceRecord>> {
        let mut records = Vec::new();
        for chunk in subscriptions.chunks(MAX_SUBSCRIPTIONS_PER_QUERY) {
            records.extend(self.query_chunk(kql(query), chunk, query.kind()).await?);
        }
        Ok(records)
    }
}

fn enabled_subscriptions(subscriptions: Vec<Subscription>) -> Vec<String> {
    subscriptions
        .into_iter()
        .filter(|s| s.state.eq_ignore_ascii_case("enabled"))
        .map(|s| s.subscription_id)
        .collect()
}
