//! Azure Resource Manager HTTP client.

use azwipe_core::{CredentialProvider, Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Public-cloud management endpoint.
pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com/";

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_POLL_DURATION: Duration = Duration::from_secs(60 * 60);

/// Authenticated ARM client. Cheap to clone.
#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    credential: Arc<dyn CredentialProvider>,
    endpoint: Url,
}

impl ArmClient {
    /// Create a client for the public-cloud endpoint.
    pub fn new(credential: Arc<dyn CredentialProvider>) -> Result<Self> {
        let endpoint = Url::parse(MANAGEMENT_ENDPOINT)
            .map_err(|e| Error::InvalidInput(format!("management endpoint: {}", e)))?;
        Ok(Self::with_endpoint(credential, endpoint))
    }

    /// Create a client for a custom endpoint, e.g. a sovereign cloud.
    pub fn with_endpoint(credential: Arc<dyn CredentialProvider>, endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            endpoint,
        }
    }

    /// Resolve an ARM path against the endpoint and add the `api-version` parameter.
    pub fn url(&self, path: &str, api_version: &str) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidInput(format!("invalid path '{}': {}", path, e)))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String> {
        Ok(self.credential.access_token().await?.token)
    }

    /// Send a GET request and deserialize the response.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(response).await
    }

    /// Send a POST request with a JSON body and deserialize the response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        let response = self
            .http
            .post(url)
            .bearer_auth(self.bearer().await?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(response).await
    }

    /// Collect every item of a `value`/`nextLink` paged listing.
    pub async fn list_paged<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.value);
            if let Some(link) = page.next_link {
                next = Some(
                    Url::parse(&link)
                        .map_err(|e| Error::Internal(format!("invalid nextLink: {}", e)))?,
                );
            }
        }

        Ok(items)
    }

    /// Issue a DELETE and wait until the operation reaches a terminal state.
    pub async fn delete_and_wait(&self, url: Url) -> Result<()> {
        let response = self
            .http
            .delete(url.clone())
            .bearer_auth(self.bearer().await?)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::ACCEPTED | StatusCode::CREATED => {
                // Without a tracker, completion is the resource itself disappearing.
                let poller = Poller::from_headers(response.headers())
                    .unwrap_or_else(|| Poller::Resource(url.clone()));
                let interval = retry_after(response.headers()).unwrap_or(DEFAULT_POLL_INTERVAL);
                self.wait(poller, interval, url.path()).await
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(error_for_status(status, &body))
            }
        }
    }

    async fn wait(&self, poller: Poller, mut interval: Duration, resource: &str) -> Result<()> {
        let deadline = Instant::now() + MAX_POLL_DURATION;

        loop {
            if Instant::now() >= deadline {
                return Err(Error::OperationFailed(format!(
                    "timed out waiting for deletion of {}",
                    resource
                )));
            }
            tokio::time::sleep(interval).await;

            let response = self
                .http
                .get(poller.url().clone())
                .bearer_auth(self.bearer().await?)
                .send()
                .await;
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    debug!(resource, error = %e, "Poll request failed, will poll again");
                    continue;
                }
            };
            interval = retry_after(response.headers()).unwrap_or(DEFAULT_POLL_INTERVAL);
            let status = response.status();

            match &poller {
                Poller::AsyncOperation(_) => {
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        let err = error_for_status(status, &body);
                        if err.is_transient() {
                            debug!(resource, error = %err, "Transient poll failure");
                            continue;
                        }
                        return Err(err);
                    }
                    let body = response.text().await.map_err(transport_error)?;
                    let operation: OperationStatus = serde_json::from_str(&body)
                        .map_err(|e| Error::Internal(format!("invalid operation status: {}", e)))?;
                    match operation.state() {
                        OperationState::Succeeded => return Ok(()),
                        OperationState::Failed(message) => {
                            return Err(Error::OperationFailed(format!(
                                "deletion of {} failed: {}",
                                resource, message
                            )));
                        }
                        OperationState::Running => {
                            debug!(resource, status = %operation.status, "Deletion in progress");
                        }
                    }
                }
                Poller::Location(_) => match status {
                    StatusCode::ACCEPTED => debug!(resource, "Deletion in progress"),
                    s if s.is_success() => return Ok(()),
                    s => {
                        let body = response.text().await.unwrap_or_default();
                        let err = error_for_status(s, &body);
                        if !err.is_transient() {
                            return Err(err);
                        }
                        debug!(resource, error = %err, "Transient poll failure");
                    }
                },
                Poller::Resource(_) => match status {
                    StatusCode::NOT_FOUND => return Ok(()),
                    s if s.is_success() => debug!(resource, "Resource still present"),
                    s => {
                        let body = response.text().await.unwrap_or_default();
                        let err = error_for_status(s, &body);
                        if !err.is_transient() {
                            return Err(err);
                        }
                        debug!(resource, error = %err, "Transient poll failure");
                    }
                },
            }
        }
    }
}

/// One page of an ARM listing.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

/// How a long-running operation reports progress.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Poller {
    AsyncOperation(Url),
    Location(Url),
    /// No tracker was returned; poll the resource until it is gone.
    Resource(Url),
}

impl Poller {
    /// `Azure-AsyncOperation` wins over `Location` when both are present.
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header_url = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| Url::parse(v).ok())
        };
        header_url(AZURE_ASYNC_OPERATION)
            .map(Poller::AsyncOperation)
            .or_else(|| header_url(LOCATION).map(Poller::Location))
    }

    fn url(&self) -> &Url {
        match self {
            Poller::AsyncOperation(url) | Poller::Location(url) | Poller::Resource(url) => url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

#[derive(Debug, PartialEq, Eq)]
enum OperationState {
    Succeeded,
    Failed(String),
    Running,
}

impl OperationStatus {
    fn state(&self) -> OperationState {
        if self.status.eq_ignore_ascii_case("succeeded") {
            OperationState::Succeeded
        } else if self.status.eq_ignore_ascii_case("failed")
            || self.status.eq_ignore_ascii_case("canceled")
        {
            let message = self
                .error
                .as_ref()
                .map(ArmErrorDetail::to_string)
                .unwrap_or_else(|| self.status.clone());
            OperationState::Failed(message)
        } else {
            OperationState::Running
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    error: ArmErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl std::fmt::Display for ArmErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => f.write_str(&self.code),
            _ => f.write_str(&self.message),
        }
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(error_for_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| Error::Internal(format!("invalid response body: {}", e)))
}

/// Map an unsuccessful ARM response onto the platform failure taxonomy.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ArmErrorBody>(body)
        .map(|b| b.error.to_string())
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
        StatusCode::FORBIDDEN => Error::Forbidden(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => Error::Throttled(message),
        StatusCode::SERVICE_UNAVAILABLE => Error::Unavailable(message),
        StatusCode::GATEWAY_TIMEOUT => Error::GatewayTimeout(message),
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_decode() {
        Error::Internal(e.to_string())
    } else {
        Error::Connection(e.to_string())
    }
}

/// `Retry-After` in seconds. HTTP-date values are not used by ARM and are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, StaticToken, StubServer};
    use azwipe_core::TransientKind;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, Some(TransientKind::Throttled)),
            (StatusCode::SERVICE_UNAVAILABLE, Some(TransientKind::Unavailable)),
            (StatusCode::GATEWAY_TIMEOUT, Some(TransientKind::GatewayTimeout)),
            (StatusCode::NOT_FOUND, None),
            (StatusCode::FORBIDDEN, None),
            (StatusCode::CONFLICT, None),
            (StatusCode::INTERNAL_SERVER_ERROR, None),
        ];
        for (status, expected) in cases {
            assert_eq!(error_for_status(status, "").transient_kind(), expected, "{}", status);
        }
    }

    #[test]
    fn test_error_message_from_arm_body() {
        let body = r#"{"error":{"code":"ScopeLocked","message":"The scope is locked."}}"#;
        match error_for_status(StatusCode::CONFLICT, body) {
            Error::Conflict(message) => assert_eq!(message, "ScopeLocked: The scope is locked."),
            other => panic!("unexpected error: {:?}", other),
        }

        match error_for_status(StatusCode::BAD_GATEWAY, "upstream broke") {
            Error::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream broke");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_poller_prefers_async_operation() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "location",
            HeaderValue::from_static("https://management.azure.com/loc"),
        );
        assert!(matches!(
            Poller::from_headers(&headers),
            Some(Poller::Location(_))
        ));

        headers.insert(
            "azure-asyncoperation",
            HeaderValue::from_static("https://management.azure.com/op"),
        );
        assert_eq!(
            Poller::from_headers(&headers).unwrap().url().path(),
            "/op"
        );
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(17)));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_operation_states() {
        let parse = |s: &str| serde_json::from_str::<OperationStatus>(s).unwrap().state();
        assert_eq!(parse(r#"{"status":"Succeeded"}"#), OperationState::Succeeded);
        assert_eq!(parse(r#"{"status":"InProgress"}"#), OperationState::Running);
        assert_eq!(
            parse(r#"{"status":"Failed","error":{"code":"Boom","message":"disk in use"}}"#),
            OperationState::Failed("Boom: disk in use".to_string())
        );
        assert_eq!(
            parse(r#"{"status":"Canceled"}"#),
            OperationState::Failed("Canceled".to_string())
        );
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<u32> = serde_json::from_str("{}").unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_url_adds_api_version() {
        let client = ArmClient::new(Arc::new(StaticToken)).unwrap();
        let url = client
            .url("/subscriptions/s1/resourceGroups/rg", "2022-09-01")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/s1/resourceGroups/rg?api-version=2022-09-01"
        );
    }

    #[tokio::test]
    async fn test_list_paged_follows_next_link() {
        let server = StubServer::start(|req, base| {
            if req.target.contains("page=2") {
                Reply::json(200, json!({"value": [3]}))
            } else {
                let next = base.join("items?api-version=1&page=2").unwrap();
                Reply::json(200, json!({"value": [1, 2], "nextLink": next.as_str()}))
            }
        })
        .await;
        let client = server.client();

        let items: Vec<u32> = client
            .list_paged(client.url("items", "1").unwrap())
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(server.count("GET"), 2);
    }

    fn accepted_with_operation(base: &Url) -> Reply {
        let operation = base.join("operations/op-1").unwrap();
        Reply::empty(202)
            .header("azure-asyncoperation", operation.as_str())
            .header("retry-after", "0")
    }

    #[tokio::test]
    async fn test_delete_polls_until_succeeded() {
        let polls = AtomicU32::new(0);
        let server = StubServer::start(move |req, base| match req.method.as_str() {
            "DELETE" => accepted_with_operation(base),
            _ => match polls.fetch_add(1, Ordering::SeqCst) {
                0 => Reply::json(200, json!({"status": "InProgress"})).header("retry-after", "0"),
                1 => Reply::empty(503).header("retry-after", "0"),
                _ => Reply::json(200, json!({"status": "Succeeded"})),
            },
        })
        .await;
        let client = server.client();
        let started = Instant::now();

        client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap();

        // Retry-After of zero replaces the default interval between polls.
        assert!(started.elapsed() < DEFAULT_POLL_INTERVAL);
        assert_eq!(server.count("DELETE"), 1);
        assert_eq!(server.count("GET"), 3);
        assert!(
            server
                .requests()
                .iter()
                .filter(|r| r.method == "GET")
                .all(|r| r.target == "/operations/op-1")
        );
    }

    #[tokio::test]
    async fn test_delete_waits_for_retry_after() {
        let server = StubServer::start(|req, base| match req.method.as_str() {
            "DELETE" => {
                let operation = base.join("operations/op-1").unwrap();
                Reply::empty(202)
                    .header("azure-asyncoperation", operation.as_str())
                    .header("retry-after", "1")
            }
            _ => Reply::json(200, json!({"status": "Succeeded"})),
        })
        .await;
        let client = server.client();
        let started = Instant::now();

        client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_failed_operation_is_an_error() {
        let server = StubServer::start(|req, base| match req.method.as_str() {
            "DELETE" => accepted_with_operation(base),
            _ => Reply::json(
                200,
                json!({"status": "Failed", "error": {"code": "Conflict", "message": "disk in use"}}),
            ),
        })
        .await;
        let client = server.client();

        let err = client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap_err();

        match err {
            Error::OperationFailed(message) => assert!(message.contains("disk in use")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_location_poll_until_done() {
        let polls = AtomicU32::new(0);
        let server = StubServer::start(move |req, base| match req.method.as_str() {
            "DELETE" => Reply::empty(202)
                .header("location", base.join("results/r-1").unwrap().as_str())
                .header("retry-after", "0"),
            _ => match polls.fetch_add(1, Ordering::SeqCst) {
                0 => Reply::empty(202).header("retry-after", "0"),
                _ => Reply::empty(204),
            },
        })
        .await;
        let client = server.client();

        client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap();
        assert_eq!(server.count("GET"), 2);
    }

    #[tokio::test]
    async fn test_accepted_without_tracker_polls_resource_until_gone() {
        let polls = AtomicU32::new(0);
        let server = StubServer::start(move |req, _| match req.method.as_str() {
            "DELETE" => Reply::empty(202).header("retry-after", "0"),
            _ => match polls.fetch_add(1, Ordering::SeqCst) {
                0 => Reply::json(200, json!({"id": "d1"})).header("retry-after", "0"),
                _ => Reply::json(404, json!({"error": {"code": "ResourceNotFound", "message": "gone"}})),
            },
        })
        .await;
        let client = server.client();

        client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap();

        let gets: Vec<_> = server
            .requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .collect();
        assert_eq!(gets.len(), 2);
        assert!(gets.iter().all(|r| r.target == "/disks/d1?api-version=1"));
    }

    #[tokio::test]
    async fn test_accepted_without_tracker_surfaces_permanent_poll_error() {
        let server = StubServer::start(|req, _| match req.method.as_str() {
            "DELETE" => Reply::empty(202).header("retry-after", "0"),
            _ => Reply::json(403, json!({"error": {"code": "AuthorizationFailed", "message": "no"}})),
        })
        .await;
        let client = server.client();

        let err = client
            .delete_and_wait(client.url("disks/d1", "1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
