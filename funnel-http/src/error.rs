//! Error types for the HTTP layer.

use thiserror::Error;

/// Failure of an outbound request.
///
/// Cloneable so one failure can be replayed to every subscriber of a
/// [`SharedResult`](crate::SharedResult).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request failed: {message}")]
    Request { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Client configuration error: {reason}")]
    Config { reason: String },
}

impl TransportError {
    /// HTTP status of the failure, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        if err.is_decode() {
            return TransportError::Decode {
                message: err.to_string(),
            };
        }
        if err.is_builder() {
            return TransportError::Config {
                reason: err.to_string(),
            };
        }
        TransportError::Request {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = TransportError::Status {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert_eq!(TransportError::Timeout.status(), None);
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(TransportError::from(err), TransportError::Decode { .. }));
    }
}
