//! Bearer token providers for the management API.

use async_trait::async_trait;
use azwipe_core::{AccessToken, CredentialProvider, Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Resource the management API tokens are issued for.
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-acquired bearer token.
pub const TOKEN_ENV_VAR: &str = "AZURE_ACCESS_TOKEN";

/// Refresh tokens this long before they expire.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Token taken verbatim from `AZURE_ACCESS_TOKEN`. Its expiry is unknown and never refreshed.
pub struct EnvCredential {
    token: String,
}

impl EnvCredential {
    pub fn from_env() -> Option<Self> {
        let token = std::env::var(TOKEN_ENV_VAR).ok()?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    async fn access_token(&self) -> Result<AccessToken> {
        Ok(AccessToken::new(self.token.clone(), DateTime::<Utc>::MAX_UTC))
    }
}

/// Token obtained from the signed-in Azure CLI (`az login`).
#[derive(Default)]
pub struct AzureCliCredential;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Newer CLI versions report a POSIX timestamp.
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
    /// Local time, e.g. `2024-05-01 13:45:10.000000`.
    #[serde(default)]
    expires_on: Option<String>,
}

impl CliToken {
    fn into_access_token(self) -> Result<AccessToken> {
        let expires_at = match (self.expires_on_epoch, self.expires_on.as_deref()) {
            (Some(epoch), _) => DateTime::from_timestamp(epoch, 0)
                .ok_or_else(|| Error::Credential(format!("invalid expires_on {}", epoch)))?,
            (None, Some(local)) => parse_local_expiry(local)?,
            (None, None) => {
                return Err(Error::Credential(
                    "Azure CLI token has no expiry".to_string(),
                ));
            }
        };
        Ok(AccessToken::new(self.access_token, expires_at))
    }
}

fn parse_local_expiry(value: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| Error::Credential(format!("invalid expiresOn '{}': {}", value, e)))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::Credential(format!("ambiguous expiresOn '{}'", value)))
}

#[async_trait]
impl CredentialProvider for AzureCliCredential {
    async fn access_token(&self) -> Result<AccessToken> {
        debug!("Requesting token from Azure CLI");
        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                MANAGEMENT_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| Error::Credential(format!("failed to run az: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Credential(format!(
                "az account get-access-token failed: {}",
                stderr.trim()
            )));
        }

        let token: CliToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Credential(format!("unexpected az output: {}", e)))?;
        token.into_access_token()
    }
}

/// Environment token if present, otherwise the Azure CLI. Tokens are cached until
/// shortly before they expire.
pub struct ChainedCredential {
    source: Arc<dyn CredentialProvider>,
    cached: Mutex<Option<AccessToken>>,
}

impl ChainedCredential {
    /// Pick the first available source.
    pub fn new() -> Self {
        match EnvCredential::from_env() {
            Some(env) => {
                info!("Using access token from {}", TOKEN_ENV_VAR);
                Self::with_source(Arc::new(env))
            }
            None => {
                info!("Using Azure CLI credentials");
                Self::with_source(Arc::new(AzureCliCredential))
            }
        }
    }

    pub fn with_source(source: Arc<dyn CredentialProvider>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }
}

impl Default for ChainedCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    async fn access_token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        let margin = chrono::Duration::minutes(REFRESH_MARGIN_MINUTES);
        if let Some(token) = cached.as_ref().filter(|t| !t.expires_within(margin)) {
            return Ok(token.clone());
        }

        let token = self.source.access_token().await?;
        debug!(expires_at = %token.expires_at, "Acquired management token");
        *cached = Some(token.clone());
        Ok(token)
    }
}
