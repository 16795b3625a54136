//! Error types for the reference service.

use colmirror_protocol::RemoteError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the reference service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The cursor could not be parsed.
    #[error("invalid sync token: {0}")]
    InvalidToken(String),

    /// The account is not a member of the collection.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Unknown collection or item.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service is in maintenance mode.
    #[error("service unavailable")]
    Unavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::InvalidToken(_)
                | ServerError::NotAuthorized(_)
                | ServerError::NotFound(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Unavailable | ServerError::Internal(_))
    }

    /// HTTP status the error would be served with.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::InvalidToken(_) => 400,
            ServerError::NotAuthorized(_) => 403,
            ServerError::NotFound(_) => 404,
            ServerError::Unavailable => 503,
            ServerError::Internal(_) => 500,
        }
    }
}

impl From<ServerError> for RemoteError {
    fn from(error: ServerError) -> Self {
        let message = error.to_string();
        match error {
            ServerError::NotAuthorized(_) => RemoteError::permission_denied(message),
            ServerError::Unavailable => RemoteError::temporarily_unavailable(message),
            other => RemoteError::http(other.status(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmirror_protocol::RemoteErrorKind;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidToken("x".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::NotFound("c".into()).is_server_error());
    }

    #[test]
    fn converts_into_remote_error_kinds() {
        let err: RemoteError = ServerError::NotAuthorized("c1".into()).into();
        assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);

        let err: RemoteError = ServerError::Unavailable.into();
        assert_eq!(err.kind, RemoteErrorKind::TemporarilyUnavailable);

        let err: RemoteError = ServerError::NotFound("c1".into()).into();
        assert_eq!(err.kind, RemoteErrorKind::Http);
        assert_eq!(err.status, Some(404));
    }
}
