//! Typed error handling for policy resolution.
//!
//! Lookup-level absence (a DNS name with no answer) is never an error
//! here - it is a valid value consumed by the classification logic in
//! [`crate::Domain`]. Errors cover the policy fetch path and
//! collaborator transport failures only.

use postguard_proto::ParseError;
use thiserror::Error;

/// Errors that can occur while resolving a domain's delivery policy.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The policy could not be retrieved: either the domain advertises
    /// no `_mta-sts` TXT record at fetch time, or HTTPS returned a
    /// non-success status (the message carries the status line).
    #[error("Policy retrieval failed: {0}")]
    Retrieval(String),

    /// The fetched policy body exceeds the configured size limit.
    /// Raised before any parse attempt.
    #[error("Policy document too large: {size} bytes (limit {limit})")]
    SizeLimit { size: usize, limit: usize },

    /// The fetched policy document body is malformed.
    #[error("Malformed policy document: {0}")]
    Policy(#[from] ParseError),

    /// DNS query failed due to network or resolver issues.
    #[error("DNS lookup failed: {0}")]
    Dns(#[from] hickory_resolver::ResolveError),

    /// HTTPS transport failed before a response was obtained.
    #[error("Policy fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ResolveError {
    /// Returns `true` if this error is temporary and a retry at a
    /// higher layer may succeed. Retries are the caller's concern;
    /// nothing here retries internally.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Dns(_) | Self::Http(_))
    }
}
