//! Continuation state that bridges the consent redirect.
//!
//! Between `initiate` and `finalize` the only thing that survives is a
//! [`ContinuationRecord`], keyed by the [`InteractionRef`] recovered from the
//! redirect URL. The reference is not the continuation token; the two are
//! distinct identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::Timestamp;

// =============================================================================
// Interaction Reference
// =============================================================================

/// Opaque value correlating a returning user with their pending grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InteractionRef(String);

impl InteractionRef {
    /// Validate a caller-supplied reference.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        if value.is_empty() {
            return Err(ValidationError::InvalidInteractionRef(
                "reference is empty".to_string(),
            ));
        }
        if value
            .chars()
            .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidInteractionRef(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Recover the reference from an authorization server's redirect URL.
    ///
    /// Takes the last path segment after dropping any query string and
    /// fragment, so `.../interact/abc123?clientName=X` yields `abc123`.
    /// A URL with no path after its authority, such as `https://auth`, is
    /// rejected rather than yielding the host.
    ///
    /// This relies on the authorization server placing the reference last
    /// in the redirect path. If that layout changes the extracted value is
    /// wrong and `finalize` will report the reference as unknown.
    pub fn from_redirect_url(url: &str) -> ValidationResult<Self> {
        let without_query = url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let path = match without_query.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
            None => without_query,
        };
        let segment = path.rsplit('/').next().unwrap_or_default();
        if segment.is_empty() || segment.contains(':') {
            return Err(ValidationError::InvalidRedirectUrl(url.to_string()));
        }
        Self::parse(segment).map_err(|_| ValidationError::InvalidRedirectUrl(url.to_string()))
    }

    /// The reference text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InteractionRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InteractionRef> for String {
    fn from(value: InteractionRef) -> Self {
        value.0
    }
}

// =============================================================================
// Continuation Record
// =============================================================================

/// What `finalize` needs to resume a grant, and nothing more.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationRecord {
    /// Token authorizing the continuation request.
    pub continuation_token: String,

    /// URI to post the continuation request to.
    pub continuation_uri: String,

    /// Quote captured at initiation; the outgoing payment is created from it.
    pub quote_id: String,

    /// When the record was written.
    pub created_at: Timestamp,

    /// After this instant the record is treated as absent.
    pub expires_at: Timestamp,
}

impl ContinuationRecord {
    /// Create a record living for `ttl_ms` from `now`.
    pub fn new(
        continuation_token: impl Into<String>,
        continuation_uri: impl Into<String>,
        quote_id: impl Into<String>,
        now: Timestamp,
        ttl_ms: u64,
    ) -> Self {
        Self {
            continuation_token: continuation_token.into(),
            continuation_uri: continuation_uri.into(),
            quote_id: quote_id.into(),
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    /// Whether the record has expired at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for ContinuationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationRecord")
            .field("continuation_token", &"<redacted>")
            .field("continuation_uri", &self.continuation_uri)
            .field("quote_id", &self.quote_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
