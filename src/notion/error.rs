use thiserror::Error;

/// Failures talking to the remote record store.
///
/// None of these are fatal to a sync pass: a failed query yields an empty
/// pass and a failed write is reported against the single record involved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote rejected request (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server handed back a cursor it had already returned.
    #[error("Pagination of {url} stalled: cursor {cursor:?} repeated")]
    StalledPagination { url: String, cursor: String },
}

impl StoreError {
    /// Whether repeating the same request could succeed.
    ///
    /// Rate limits and server errors are transient; any other rejection means
    /// the request itself is wrong (bad filter, missing permission, unknown
    /// property) and will be rejected again.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport { .. } => true,
            StoreError::RemoteRejected { status, .. } => *status == 429 || *status >= 500,
            StoreError::Decode { .. } | StoreError::StalledPagination { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> StoreError {
        StoreError::RemoteRejected {
            status,
            body: "{}".into(),
        }
    }

    #[test]
    fn test_stalled_pagination_not_retryable() {
        let e = StoreError::StalledPagination {
            url: "https://api.notion.com/v1/databases/db1/query".into(),
            cursor: "c2".into(),
        };
        assert!(!e.is_retryable());
        assert!(e.to_string().contains("\"c2\""));
    }

    #[test]
    fn test_bad_request_not_retryable() {
        assert!(!rejected(400).is_retryable());
    }

    #[test]
    fn test_unauthorized_not_retryable() {
        assert!(!rejected(401).is_retryable());
    }

    #[test]
    fn test_not_found_not_retryable() {
        assert!(!rejected(404).is_retryable());
    }

    #[test]
    fn test_rate_limited_retryable() {
        assert!(rejected(429).is_retryable());
    }

    #[test]
    fn test_server_errors_retryable() {
        assert!(rejected(500).is_retryable());
        assert!(rejected(502).is_retryable());
        assert!(rejected(503).is_retryable());
    }

    #[test]
    fn test_decode_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = StoreError::Decode {
            url: "https://api.notion.com/v1/pages/x".into(),
            source,
        };
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_transport_error_retryable() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(reqwest::Client::new().get("http://127.0.0.1:1").send())
            .unwrap_err();
        let e = StoreError::Transport {
            url: "http://127.0.0.1:1".into(),
            source: err,
        };
        assert!(e.is_retryable());
    }

    #[test]
    fn test_rejected_display_carries_status_and_body() {
        let e = StoreError::RemoteRejected {
            status: 400,
            body: r#"{"code":"validation_error"}"#.into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("validation_error"));
    }
}
