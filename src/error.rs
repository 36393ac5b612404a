//! @ai:module:intent Error taxonomy for request execution and configuration
//! @ai:module:layer domain
//! @ai:module:public_api RequestError, ErrorKind, ConfigError
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// @ai:intent Classification of a failed request, recorded on the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransportError,
    ServerError,
    DecodeError,
}

impl ErrorKind {
    /// @ai:intent Convert kind to its wire name
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransportError => "transport_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::DecodeError => "decode_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Per-request failure; captured as data, never fatal to a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// Connection, timeout or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The incremental payload could not be consumed to completion.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RequestError {
    /// @ai:intent Map the error onto the recorded taxonomy
    /// @ai:effects pure
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Transport(_) => ErrorKind::TransportError,
            RequestError::Server { .. } => ErrorKind::ServerError,
            RequestError::Decode(_) => ErrorKind::DecodeError,
        }
    }
}

/// @ai:intent Precondition violations rejected before a run starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("workload '{name}': request rate must be positive, got {qps}")]
    NonPositiveRate { name: String, qps: f64 },

    #[error("workload '{name}': request rate {qps} is too low, its interval cannot be represented")]
    RateTooLow { name: String, qps: f64 },

    #[error("workload '{name}': duration must be a non-negative number of seconds in range, got {duration_secs}")]
    InvalidDuration { name: String, duration_secs: f64 },

    #[error("duplicate workload name: {0}")]
    DuplicateWorkload(String),

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("workload '{0}': prompt source produced no prompts")]
    EmptyCorpus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(RequestError::Transport("x".into()).kind().as_str(), "transport_error");
        assert_eq!(
            RequestError::Server {
                status: 500,
                message: "boom".into()
            }
            .kind()
            .as_str(),
            "server_error"
        );
        assert_eq!(RequestError::Decode("x".into()).kind().to_string(), "decode_error");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ServerError).unwrap();
        assert_eq!(json, "\"server_error\"");
    }
}
