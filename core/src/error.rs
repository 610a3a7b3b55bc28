use thiserror::Error;

/// Failures from one remote catalog fetch. A single network attempt is
/// made; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store rejected the credentials (HTTP 401/403).
    #[error("store rejected the API credentials (HTTP {status})")]
    Auth { status: u16 },

    /// Any other non-success HTTP status, with the response body for
    /// diagnostics.
    #[error("store API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The payload was not a sequence of product records — usually an
    /// incompatible remote API version.
    #[error("unexpected store response shape: {0}")]
    Shape(String),

    /// The request never produced an HTTP response.
    #[error("could not reach the store: {0}")]
    Transport(String),
}

/// Failures from one sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No settings row, or blank store credentials. Not retryable until the
    /// user fills in settings.
    #[error("store connection is not configured; set the store URL and API keys in settings")]
    SettingsMissing,

    #[error("sync failed: {0}")]
    Remote(#[from] RemoteError),

    /// Some upserts landed, some failed. Each row write is idempotent and
    /// keyed by `woo_id`, so re-running sync converges.
    #[error("sync wrote {applied} products but {failed} failed; first failure: {first}")]
    Partial {
        applied: usize,
        failed: usize,
        first: String,
    },

    #[error("sync failed: {0}")]
    Store(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_distinct_from_api() {
        let auth = RemoteError::Auth { status: 401 };
        let api = RemoteError::Api {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(matches!(auth, RemoteError::Auth { status: 401 }));
        assert!(matches!(api, RemoteError::Api { status: 500, .. }));
        assert!(auth.to_string().contains("401"));
        assert!(api.to_string().contains("500"));
        assert!(api.to_string().contains("boom"));
    }

    #[test]
    fn test_sync_error_wraps_remote_cause() {
        let err = SyncError::from(RemoteError::Shape("not an array".to_string()));
        assert!(err.to_string().contains("not an array"));
    }
}
