//! Secure mail-delivery policy resolution.
//!
//! This crate answers one question: how should mail for a given domain
//! be delivered securely? It provides functionality to:
//! - Resolve the mail-exchanger topology (MX, with A/AAAA fallback)
//! - Read DNSSEC-authenticated security signals (TLSA, per-lookup
//!   authenticated-data flags)
//! - Discover and fetch the domain's MTA-STS policy over HTTPS
//! - Track when the cached policy expires and detect upstream changes
//!   via the advertised policy id

pub mod cache;
pub mod config;
pub mod dns;
pub mod http;
pub mod lookup;

mod domain;
mod error;

// Re-export the resolution context and classification
pub use domain::{Domain, RecordClass};
// Re-export collaborator contracts and their production backends
pub use dns::{DnsAnswer, DnsLookup, HickoryDns, QueryType, RecordData};
pub use http::{HttpsFetch, HttpsResponse, ReqwestFetch};
// Re-export lifecycle and configuration types
pub use cache::PolicyCache;
pub use config::ResolverConfig;
pub use error::ResolveError;
// Re-export the text formats consumed through this crate's API
pub use postguard_proto::{ParseError, PolicyDocument, PolicyMode, StsRecord, TlsrptRecord};
