//! Errors reported by the remote collection/item service.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Closed classification of remote failures.
///
/// Every remote client maps its failures onto exactly one of these kinds;
/// the sync engine decides how to handle each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Connectivity failure (DNS, refused connection, dropped socket).
    Network,
    /// The server is temporarily unavailable (maintenance, overload).
    TemporarilyUnavailable,
    /// The account may not access the requested resource.
    PermissionDenied,
    /// Any other HTTP-level failure.
    Http,
    /// Unclassified failure.
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteErrorKind::Network => "network error",
            RemoteErrorKind::TemporarilyUnavailable => "server temporarily unavailable",
            RemoteErrorKind::PermissionDenied => "permission denied",
            RemoteErrorKind::Http => "http error",
            RemoteErrorKind::Other => "remote error",
        };
        f.write_str(name)
    }
}

/// A failure reported by the remote service client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Classification of the failure.
    pub kind: RemoteErrorKind,
    /// HTTP status, when the failure came with one.
    pub status: Option<u16>,
    /// Human readable description.
    pub message: String,
}

impl RemoteError {
    /// Creates an error of the given kind.
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Creates a connectivity error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    /// Creates a temporary unavailability error (HTTP 503).
    pub fn temporarily_unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::TemporarilyUnavailable, message).with_status(503)
    }

    /// Creates a permission error (HTTP 403).
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, message).with_status(403)
    }

    /// Creates a generic HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Http, message).with_status(status)
    }

    /// Creates an unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Other, message)
    }

    /// Attaches an HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind_and_status() {
        let err = RemoteError::permission_denied("not a member");
        assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);
        assert_eq!(err.status, Some(403));

        let err = RemoteError::network("connection reset");
        assert_eq!(err.kind, RemoteErrorKind::Network);
        assert_eq!(err.status, None);

        let err = RemoteError::http(404, "no such collection");
        assert_eq!(err.kind, RemoteErrorKind::Http);
        assert_eq!(err.status, Some(404));
    }

    #[test]
    fn error_display() {
        let err = RemoteError::temporarily_unavailable("maintenance");
        assert_eq!(err.to_string(), "server temporarily unavailable: maintenance");
    }
}
