//! Credential provider abstraction.
//!
//! The engine never looks inside credentials; backends receive a provider and ask it
//! for bearer tokens when they talk to the platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::Result;

/// A bearer token and its expiry.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the token expires within `margin` of now.
    pub fn expires_within(&self, margin: chrono::Duration) -> bool {
        self.expires_at - margin <= Utc::now()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Trait for token providers.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get a token valid for the management API.
    async fn access_token(&self) -> Result<AccessToken>;
}
