//! Cursor tokens and account identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, server-issued continuation marker.
///
/// Resuming a list from a token yields only changes observed after it.
/// The client never interprets the contents; absence of a token
/// (`Option::None`) means "start from scratch".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncToken(String);

impl SyncToken {
    /// Creates a token from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SyncToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SyncToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique account identity (the account's username).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account identity from a username.
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    /// Returns the username.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_serializes_as_plain_string() {
        let token = SyncToken::new("42");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"42\"");

        let parsed: Option<SyncToken> = serde_json::from_str("null").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn account_display() {
        let account = AccountId::from("alice");
        assert_eq!(account.to_string(), "alice");
        assert_eq!(account.as_str(), "alice");
    }
}
