use thiserror::Error;

/// The message shown to users whenever a list fetch fails.
///
/// Every [`TransportError`] maps to this same message, the variants only exist for logs.
pub const LIST_FAILED_MESSAGE: &str = "Failed to load projects. Please try again later.";

/// A failed round trip to the record backend.
///
/// Callers should treat every variant the same way: the fetch failed, nothing was returned,
/// and whatever was displayed before is stale but still valid.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (connection refused, timeout, DNS...).
    #[error("request to {path} failed: {message}")]
    Request {
        /// The API path that was requested.
        path: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The backend answered with a non-success status code.
    #[error("{path} returned HTTP {status}")]
    Status {
        /// The API path that was requested.
        path: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, kept for diagnostics.
        body: String,
    },

    /// The backend answered successfully but the body couldn't be decoded.
    #[error("could not decode response from {path}")]
    Decode {
        /// The API path that was requested.
        path: String,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// The generic, user-facing message for this failure.
    pub fn user_message(&self) -> &'static str {
        LIST_FAILED_MESSAGE
    }

    /// The API path the failing request targeted.
    pub fn path(&self) -> &str {
        match self {
            TransportError::Request { path, .. }
            | TransportError::Status { path, .. }
            | TransportError::Decode { path, .. } => path,
        }
    }

    /// The HTTP status, if the backend responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variants_share_user_message() {
        let errors = [
            TransportError::Request {
                path: "/projects/".to_string(),
                message: "connection refused".to_string(),
            },
            TransportError::Status {
                path: "/projects/".to_string(),
                status: 500,
                body: String::new(),
            },
            TransportError::Decode {
                path: "/projects/".to_string(),
                source: serde_json::from_str::<u8>("nope").unwrap_err(),
            },
        ];
        for error in &errors {
            assert_eq!(error.user_message(), LIST_FAILED_MESSAGE);
            assert_eq!(error.path(), "/projects/");
        }
        assert_eq!(errors[1].status(), Some(500));
        assert_eq!(errors[0].status(), None);
    }

    #[test]
    fn test_display_mentions_status() {
        let err = TransportError::Status {
            path: "/projects/4/".to_string(),
            status: 404,
            body: "{\"detail\":\"Not found.\"}".to_string(),
        };
        assert_eq!(err.to_string(), "/projects/4/ returned HTTP 404");
    }
}
