//! Error types for the mesh library

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::envelope::ServiceName;

/// Errors raised while building an envelope or parsing its target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Service name is empty or contains reserved characters
    #[error("Invalid service name: {0:?}")]
    InvalidServiceName(String),

    /// The `to` field does not follow `<service>:[<METHOD>]<path>`
    #[error("Invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Errors that can occur during a cross-service call
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The envelope target could not be parsed
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Discovery knows no instance for the service
    #[error("Service not found: {0}")]
    Unresolvable(ServiceName),

    /// The discovery backend itself failed
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Connection or protocol failure talking to the remote
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote did not answer before the deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The remote body is not valid UTF-8 or JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl DispatchError {
    /// Stable machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidTarget(_) => "invalid_target",
            DispatchError::Unresolvable(_) => "service_not_found",
            DispatchError::Discovery(_) => "discovery_failed",
            DispatchError::Transport(_) => "transport_failed",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Decode(_) => "decode_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Unresolvable(_) | DispatchError::Discovery(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DispatchError::Transport(_) | DispatchError::Decode(_) => StatusCode::BAD_GATEWAY,
            DispatchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// JSON error object written into response bodies
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string()
            }
        })
    }
}

impl From<EnvelopeError> for DispatchError {
    fn from(err: EnvelopeError) -> Self {
        DispatchError::InvalidTarget(err.to_string())
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Errors raised while loading service configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_status_mapping() {
        let name = ServiceName::parse("pong-service").unwrap();
        assert_eq!(
            DispatchError::Unresolvable(name).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DispatchError::Timeout(Duration::from_millis(10)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            DispatchError::Decode("bad utf-8".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            DispatchError::InvalidTarget("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_dispatch_error_json_shape() {
        let name = ServiceName::parse("pong-service").unwrap();
        let json = DispatchError::Unresolvable(name).to_json();

        assert_eq!(json["error"]["kind"], "service_not_found");
        assert_eq!(json["error"]["message"], "Service not found: pong-service");
    }

    #[test]
    fn test_envelope_error_converts_to_invalid_target() {
        let err: DispatchError = EnvelopeError::InvalidServiceName(String::new()).into();
        assert_eq!(err.kind(), "invalid_target");
    }
}
