//! DNS collaborator contract and the hickory-backed implementation.
//!
//! The resolution engine consumes DNS through the narrow [`DnsLookup`]
//! trait: a name and query type in, an ordered answer with a
//! DNSSEC-authenticated flag out. Wire-level DNS stays behind the
//! trait, which is what the tests swap for an in-memory double.
//!
//! Absence is two-valued: `Ok(None)` means no answer at all (NXDOMAIN,
//! no records of the requested type), while `Ok(Some)` with an empty
//! record list is an answer that matched nothing. Downstream
//! classification cares about the difference.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    TokioResolver,
    config::ResolverOpts,
    name_server::TokioConnectionProvider,
    proto::rr::{RData, RecordType},
};
use tracing::debug;

use crate::error::ResolveError;

/// The record kinds the engine queries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// MX records.
    Mx,
    /// A and AAAA records, folded into one address lookup.
    Addr,
    /// TXT records.
    Txt,
    /// TLSA records.
    Tlsa,
}

/// A single resource record within an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// A mail exchanger with its preference value.
    Mx { preference: u16, exchange: String },
    /// An A or AAAA address.
    Addr(IpAddr),
    /// An alias; the chase in [`crate::lookup`] follows these.
    Cname { target: String },
    /// A TXT record's character strings, concatenated.
    Txt(String),
    /// A TLSA certificate association.
    Tlsa {
        usage: u8,
        selector: u8,
        matching_type: u8,
        data: Vec<u8>,
    },
}

/// One DNS answer: the ordered record set plus whether the resolver
/// signalled successful DNSSEC validation for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    /// Resource records in answer order.
    pub records: Vec<RecordData>,
    /// DNSSEC authenticated-data flag for this answer.
    pub authenticated: bool,
}

/// DNS lookup collaborator.
///
/// Implementations must treat "name does not exist" and "no records of
/// this type" as `Ok(None)`, reserving `Err` for transport failures.
/// Timeouts are the implementation's responsibility.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Queries `name` for records of `query_type`.
    async fn query(
        &self,
        name: &str,
        query_type: QueryType,
    ) -> Result<Option<DnsAnswer>, ResolveError>;
}

/// Production [`DnsLookup`] backed by hickory's tokio resolver, with
/// DNSSEC validation enabled.
#[derive(Debug)]
pub struct HickoryDns {
    resolver: TokioResolver,
}

impl HickoryDns {
    /// Creates a resolver using the system DNS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system DNS configuration cannot be
    /// loaded.
    pub fn new(timeout_secs: u64) -> Result<Self, ResolveError> {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(timeout_secs);
        opts.validate = true;

        let resolver = TokioResolver::builder(TokioConnectionProvider::default())?
            .with_options(opts)
            .build();

        Ok(Self { resolver })
    }

    fn convert(lookup: &hickory_resolver::lookup::Lookup) -> DnsAnswer {
        // Signed answers carry their RRSIGs alongside the data when the
        // validating resolver accepted them; an unsigned zone yields
        // none. Mirrors how DANE clients decide whether TLSA data is
        // trustworthy.
        let authenticated = lookup
            .record_iter()
            .any(|record| record.record_type() == RecordType::RRSIG);

        let records = lookup
            .record_iter()
            .filter_map(|record| match record.data() {
                RData::MX(mx) => Some(RecordData::Mx {
                    preference: mx.preference(),
                    exchange: normalise(&mx.exchange().to_utf8()),
                }),
                RData::A(a) => Some(RecordData::Addr(IpAddr::V4(a.0))),
                RData::AAAA(aaaa) => Some(RecordData::Addr(IpAddr::V6(aaaa.0))),
                RData::CNAME(cname) => Some(RecordData::Cname {
                    target: normalise(&cname.0.to_utf8()),
                }),
                RData::TXT(txt) => {
                    let text = txt
                        .txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part).into_owned())
                        .collect::<String>();
                    Some(RecordData::Txt(text))
                }
                RData::TLSA(tlsa) => Some(RecordData::Tlsa {
                    usage: tlsa.cert_usage().into(),
                    selector: tlsa.selector().into(),
                    matching_type: tlsa.matching().into(),
                    data: tlsa.cert_data().to_vec(),
                }),
                _ => None,
            })
            .collect();

        DnsAnswer {
            records,
            authenticated,
        }
    }
}

#[async_trait]
impl DnsLookup for HickoryDns {
    async fn query(
        &self,
        name: &str,
        query_type: QueryType,
    ) -> Result<Option<DnsAnswer>, ResolveError> {
        debug!("DNS query: {name} ({query_type:?})");

        let lookup = match query_type {
            QueryType::Addr => self.resolver.lookup_ip(name).await.map(|ips| ips.as_lookup().clone()),
            QueryType::Mx => self.resolver.lookup(name, RecordType::MX).await,
            QueryType::Txt => self.resolver.lookup(name, RecordType::TXT).await,
            QueryType::Tlsa => self.resolver.lookup(name, RecordType::TLSA).await,
        };

        match lookup {
            Ok(lookup) => Ok(Some(Self::convert(&lookup))),
            Err(err) if err.is_no_records_found() || err.is_nx_domain() => {
                debug!("No answer for {name} ({query_type:?})");
                Ok(None)
            }
            Err(err) => Err(ResolveError::Dns(err)),
        }
    }
}

/// Strips the trailing root dot hickory keeps on absolute names.
fn normalise(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}
