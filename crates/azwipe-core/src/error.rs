//! Error types for azwipe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("throttled: {0}")]
    Throttled(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("credential unavailable: {0}")]
    Credential(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes that may succeed when retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientKind {
    /// Rate limited (HTTP 429).
    Throttled,
    /// Service unavailable (HTTP 503).
    Unavailable,
    /// Gateway timeout (HTTP 504).
    GatewayTimeout,
    /// The request never got a response.
    Connection,
}

impl TransientKind {
    pub const ALL: [TransientKind; 4] = [
        TransientKind::Throttled,
        TransientKind::Unavailable,
        TransientKind::GatewayTimeout,
        TransientKind::Connection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransientKind::Throttled => "throttled",
            TransientKind::Unavailable => "unavailable",
            TransientKind::GatewayTimeout => "gateway_timeout",
            TransientKind::Connection => "connection",
        }
    }

    /// Look up a class by its configuration name. Hyphens are accepted for underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.replace('-', "_");
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether backoff for this class gets random jitter added.
    ///
    /// Rate and availability failures depend on load, so jitter spreads retries out.
    /// Connection failures back off deterministically.
    pub fn is_jittered(self) -> bool {
        !matches!(self, TransientKind::Connection)
    }
}

impl Error {
    /// The transient class of this error, or `None` for permanent failures.
    pub fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            Error::Throttled(_) => Some(TransientKind::Throttled),
            Error::Unavailable(_) => Some(TransientKind::Unavailable),
            Error::GatewayTimeout(_) => Some(TransientKind::GatewayTimeout),
            Error::Connection(_) => Some(TransientKind::Connection),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert_eq!(
            Error::Throttled("429".into()).transient_kind(),
            Some(TransientKind::Throttled)
        );
        assert_eq!(
            Error::Connection("reset".into()).transient_kind(),
            Some(TransientKind::Connection)
        );
        assert!(Error::NotFound("disk".into()).transient_kind().is_none());
        assert!(
            !Error::Api {
                status: 400,
                message: "bad".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_class_names() {
        assert_eq!(
            TransientKind::from_name("gateway-timeout"),
            Some(TransientKind::GatewayTimeout)
        );
        assert_eq!(TransientKind::from_name("throttled"), Some(TransientKind::Throttled));
        assert_eq!(TransientKind::from_name("timeout"), None);
        for kind in TransientKind::ALL {
            assert_eq!(TransientKind::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_only_connection_is_unjittered() {
        let unjittered: Vec<_> = TransientKind::ALL
            .into_iter()
            .filter(|k| !k.is_jittered())
            .collect();
        assert_eq!(unjittered, vec![TransientKind::Connection]);
    }
}
