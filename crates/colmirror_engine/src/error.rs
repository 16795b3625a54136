//! Error types for the sync engine.

use colmirror_protocol::{AccountId, RemoteError, RemoteErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error while persisting the cache.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted cache could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend specific failure.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote service client failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The cache store failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// The remote client acts for another account than the manager.
    #[error("sync manager for {expected} was given a client for {actual}")]
    AccountMismatch {
        /// Account the manager belongs to.
        expected: AccountId,
        /// Account of the remote client.
        actual: AccountId,
    },
}

/// How a failed sync run is reported when not in strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Transient: swallow and wait for the next trigger.
    Ignore(RemoteErrorKind),
    /// Swallow, but record for the user in the non-fatal error queue.
    Record(RemoteErrorKind),
    /// Return the error to the caller.
    Propagate,
}

impl SyncError {
    /// Classifies the error.
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            SyncError::Remote(error) => match error.kind {
                kind @ (RemoteErrorKind::Network | RemoteErrorKind::TemporarilyUnavailable) => {
                    ErrorDisposition::Ignore(kind)
                }
                kind @ (RemoteErrorKind::PermissionDenied | RemoteErrorKind::Http) => {
                    ErrorDisposition::Record(kind)
                }
                RemoteErrorKind::Other => ErrorDisposition::Propagate,
            },
            SyncError::Cache(_) | SyncError::AccountMismatch { .. } => ErrorDisposition::Propagate,
        }
    }

    /// Returns the remote error kind, if the error came from the remote.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            SyncError::Remote(error) => Some(error.kind),
            _ => None,
        }
    }

    /// Returns true if a later run is expected to succeed without any
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self.disposition(), ErrorDisposition::Ignore(_))
    }
}

/// A swallowed error kept for later, user-visible reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFatalError {
    /// Account whose sync failed.
    pub account: AccountId,
    /// Classification of the failure.
    pub kind: RemoteErrorKind,
    /// HTTP status, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human readable description.
    pub message: String,
    /// When the error was recorded, in milliseconds since the Unix epoch.
    pub recorded_at: u64,
}

impl NonFatalError {
    /// Builds a record from a remote failure.
    pub fn from_remote(account: &AccountId, error: &RemoteError) -> Self {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            account: account.clone(),
            kind: error.kind,
            status: error.status,
            message: error.message.clone(),
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_ignored() {
        let err = SyncError::from(RemoteError::network("connection reset"));
        assert_eq!(
            err.disposition(),
            ErrorDisposition::Ignore(RemoteErrorKind::Network)
        );
        assert!(err.is_retryable());

        let err = SyncError::from(RemoteError::temporarily_unavailable("maintenance"));
        assert_eq!(
            err.disposition(),
            ErrorDisposition::Ignore(RemoteErrorKind::TemporarilyUnavailable)
        );
    }

    #[test]
    fn permission_and_http_errors_are_recorded() {
        let err = SyncError::from(RemoteError::permission_denied("not a member"));
        assert_eq!(
            err.disposition(),
            ErrorDisposition::Record(RemoteErrorKind::PermissionDenied)
        );
        assert!(!err.is_retryable());

        let err = SyncError::from(RemoteError::http(500, "boom"));
        assert_eq!(err.disposition(), ErrorDisposition::Record(RemoteErrorKind::Http));
    }

    #[test]
    fn everything_else_propagates() {
        let err = SyncError::from(RemoteError::other("bad payload"));
        assert_eq!(err.disposition(), ErrorDisposition::Propagate);

        let err = SyncError::from(CacheError::Backend("disk full".into()));
        assert_eq!(err.disposition(), ErrorDisposition::Propagate);
        assert_eq!(err.remote_kind(), None);

        let err = SyncError::AccountMismatch {
            expected: AccountId::from("alice"),
            actual: AccountId::from("bob"),
        };
        assert_eq!(err.disposition(), ErrorDisposition::Propagate);
    }

    #[test]
    fn non_fatal_record_copies_remote_details() {
        let remote = RemoteError::http(502, "bad gateway");
        let record = NonFatalError::from_remote(&AccountId::from("alice"), &remote);

        assert_eq!(record.kind, RemoteErrorKind::Http);
        assert_eq!(record.status, Some(502));
        assert_eq!(record.message, "bad gateway");
        assert!(record.recorded_at > 0);
    }

    #[test]
    fn error_display() {
        let err = SyncError::AccountMismatch {
            expected: AccountId::from("alice"),
            actual: AccountId::from("bob"),
        };
        assert!(err.to_string().contains("alice"));
        assert!(err.to_string().contains("bob"));

        let err = SyncError::from(RemoteError::network("offline"));
        assert_eq!(err.to_string(), "network error: offline");
    }
}
