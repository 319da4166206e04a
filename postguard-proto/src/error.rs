//! Parse errors for the policy document format.

use thiserror::Error;

/// Errors raised while parsing a policy document body.
///
/// Malformed TXT records are not represented here: record decoding
/// returns `None` so that a broken record reads as "no such record"
/// upstream. A malformed policy *document* is a hard failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The `max_age` value is not a non-negative integer.
    #[error("Invalid max_age value: {0:?}")]
    InvalidMaxAge(String),
}
