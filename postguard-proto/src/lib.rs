//! Text formats for MTA-STS (RFC 8461) and TLSRPT (RFC 8460).
//!
//! This crate holds the pure, I/O-free side of secure-delivery policy
//! discovery:
//! - The semicolon-separated `key=value;` codec used by both DNS TXT
//!   record shapes
//! - Typed wrappers for the `_mta-sts` and `_smtp._tls` TXT records
//! - The line-oriented `key: value` policy document fetched over HTTPS
//!
//! Resolution and policy lifecycle live in `postguard-resolver`.

pub mod policy;
pub mod record;
pub mod sskv;

mod error;

pub use error::ParseError;
pub use policy::{PolicyDocument, PolicyMode};
pub use record::{StsRecord, TlsrptRecord};
