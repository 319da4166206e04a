//! The lookup table: which name and record type each lookup kind
//! queries, and the CNAME chase shared by all of them.

use tracing::{debug, warn};

use crate::{
    dns::{DnsAnswer, DnsLookup, QueryType, RecordData},
    error::ResolveError,
};

/// The five lookups performed per domain.
///
/// Each kind carries its wire query type and how its query name is
/// derived; one generic chase routine serves them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// MX records at the domain itself.
    Mx,
    /// A/AAAA records at the domain itself.
    Addr,
    /// TLSA records at `_25._tcp.<primary>`.
    Tlsa,
    /// The MTA-STS TXT record at `_mta-sts.<domain>`.
    Sts,
    /// The TLSRPT TXT record at `_smtp._tls.<domain>`.
    Tlsrpt,
}

impl LookupKind {
    /// The wire record type this kind queries for.
    #[must_use]
    pub const fn query_type(self) -> QueryType {
        match self {
            Self::Mx => QueryType::Mx,
            Self::Addr => QueryType::Addr,
            Self::Tlsa => QueryType::Tlsa,
            Self::Sts | Self::Tlsrpt => QueryType::Txt,
        }
    }

    /// Derives the query name for this kind.
    ///
    /// `primary` is only consulted for [`LookupKind::Tlsa`], whose name
    /// hangs off the primary MTA rather than the domain; with no
    /// primary there is nothing to query and the result is `None`.
    #[must_use]
    pub fn query_name(self, domain: &str, primary: Option<&str>) -> Option<String> {
        match self {
            Self::Mx | Self::Addr => Some(domain.to_string()),
            Self::Tlsa => primary.map(|host| format!("_25._tcp.{host}")),
            Self::Sts => Some(format!("_mta-sts.{domain}")),
            Self::Tlsrpt => Some(format!("_smtp._tls.{domain}")),
        }
    }
}

/// Resolves `name` for `query_type`, following CNAMEs.
///
/// When the first record of an answer is a CNAME, the query is
/// reissued at the alias target. The chase stops at the first
/// non-CNAME answer, at "no answer", or once `limit` redirections have
/// been exceeded - at which point the whole lookup degrades to "no
/// answer" rather than an error, keeping lookups uniformly
/// present-or-absent. The DNSSEC flag downstream consumers see is the
/// terminal answer's, never accumulated across the chain.
pub(crate) async fn resolve_with_cname_chase(
    dns: &dyn DnsLookup,
    name: &str,
    query_type: QueryType,
    limit: u32,
) -> Result<Option<DnsAnswer>, ResolveError> {
    let mut name = name.to_string();
    let mut depth = 0u32;

    loop {
        let Some(answer) = dns.query(&name, query_type).await? else {
            return Ok(None);
        };

        match answer.records.first() {
            Some(RecordData::Cname { target }) => {
                depth += 1;
                if depth > limit {
                    warn!("CNAME chain for {name} exceeds {limit} links, treating as no answer");
                    return Ok(None);
                }
                debug!("Following CNAME {name} -> {target} (depth {depth})");
                name = target.clone();
            }
            _ => return Ok(Some(answer)),
        }
    }
}
