use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailureKind {
    NetworkFailure,
    NotFound,
    BadRequest,
    ServerFailure,
    MalformedResponse,
    LogicalError,
}

impl LookupFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkFailure => "network_failure",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ServerFailure => "server_failure",
            Self::MalformedResponse => "malformed_response",
            Self::LogicalError => "logical_error",
        }
    }
}

/// A failed lookup. Never fatal: callers degrade to "no result" and surface
/// `message` as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", kind.as_str())]
pub struct LookupError {
    pub kind: LookupFailureKind,
    pub message: String,
    pub endpoint: Option<String>,
}

impl LookupError {
    pub fn new(kind: LookupFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: None,
        }
    }

    pub fn at(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Default diagnostic for a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::new(
                LookupFailureKind::NotFound,
                "requested resource not found (404); check the endpoint path",
            ),
            400 => Self::new(
                LookupFailureKind::BadRequest,
                "request parameters rejected (400)",
            ),
            401..=499 => Self::new(
                LookupFailureKind::BadRequest,
                format!("request rejected (HTTP {status})"),
            ),
            500 => Self::new(
                LookupFailureKind::ServerFailure,
                "internal server error (500)",
            ),
            _ => Self::new(
                LookupFailureKind::ServerFailure,
                format!("unexpected HTTP {status}"),
            ),
        }
    }
}
