//! Failure taxonomy shared by the client, search sessions and media resolver.

use thiserror::Error;

/// Errors surfaced to the operator for a single user action.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Body could not be parsed as the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The operation is not valid in the current state or lacks required input.
    #[error("Precondition failed: {0}")]
    Precondition(String),
}

impl ApiError {
    pub fn decode(msg: impl Into<String>) -> Self {
        ApiError::Decode(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        ApiError::Precondition(msg.into())
    }

    /// HTTP status for `HttpStatus` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, ApiError::Precondition(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<image::ImageError> for ApiError {
    fn from(e: image::ImageError) -> Self {
        ApiError::Decode(format!("image: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_http_failures() {
        let err = ApiError::HttpStatus {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: busy");
        assert_eq!(ApiError::decode("x").status(), None);
    }

    #[test]
    fn test_serde_error_maps_to_decode() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_reqwest_error_maps_to_network() {
        let err: ApiError = reqwest::Client::new()
            .get("http://[::1")
            .build()
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
