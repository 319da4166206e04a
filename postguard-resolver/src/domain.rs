//! Per-domain resolution context.
//!
//! A [`Domain`] orchestrates every lookup needed to decide how mail
//! for one domain should be delivered securely: the MX topology, the
//! A/AAAA fallback, TLSA at the primary MTA, and the MTA-STS / TLSRPT
//! TXT records. Each lookup is issued on first access and memoized for
//! the lifetime of the value; only [`Domain::invalidate_sts`] (driven
//! by the policy-refresh path) ever clears a slot.
//!
//! The memoized fields form a one-way dependency graph: classification
//! pulls MX then maybe A/AAAA, the primary MTA pulls classification,
//! TLSA pulls the primary, and the policy pulls the MTA-STS record.
//! Accessing a derived field triggers exactly the chain of queries it
//! needs. Accessors take `&mut self`; a `Domain` is a single-caller
//! value, not a shared service.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use postguard_proto::{PolicyDocument, StsRecord, TlsrptRecord};

use crate::{
    cache::PolicyCache,
    config::ResolverConfig,
    dns::{DnsAnswer, DnsLookup, RecordData},
    error::ResolveError,
    http::{HttpsFetch, HttpsResponse, ReqwestFetch},
    lookup::{LookupKind, resolve_with_cname_chase},
};

/// Classification of how a domain receives mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    /// At least one MX record exists.
    Mx,
    /// No MX, but an A/AAAA answer exists; the domain itself receives.
    A,
    /// Neither - the domain has no mail path.
    NonExistent,
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mx => "mx",
            Self::A => "a",
            Self::NonExistent => "non-existent",
        })
    }
}

/// Resolution context for one domain.
///
/// The domain name is fixed at construction; lookup results and the
/// policy cache live alongside it.
pub struct Domain {
    name: String,
    config: ResolverConfig,
    dns: Arc<dyn DnsLookup>,
    https: Arc<dyn HttpsFetch>,

    mx_answer: Option<Option<DnsAnswer>>,
    addr_answer: Option<Option<DnsAnswer>>,
    tlsa_answer: Option<Option<DnsAnswer>>,
    sts_answer: Option<Option<DnsAnswer>>,
    tlsrpt_answer: Option<Option<DnsAnswer>>,

    sts_record: Option<Option<StsRecord>>,
    tlsrpt_record: Option<Option<TlsrptRecord>>,

    cache: PolicyCache,
}

impl Domain {
    /// Creates a resolution context with explicit collaborators.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        dns: Arc<dyn DnsLookup>,
        https: Arc<dyn HttpsFetch>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            dns,
            https,
            mx_answer: None,
            addr_answer: None,
            tlsa_answer: None,
            sts_answer: None,
            tlsrpt_answer: None,
            sts_record: None,
            tlsrpt_record: None,
            cache: PolicyCache::new(),
        }
    }

    /// Creates a context wired to the production collaborators
    /// (hickory DNS, reqwest HTTPS) with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either collaborator fails to initialise.
    pub fn with_defaults(name: impl Into<String>) -> Result<Self, ResolveError> {
        let config = ResolverConfig::default();
        let dns = Arc::new(crate::dns::HickoryDns::new(config.dns_timeout_secs)?);
        let https = Arc::new(ReqwestFetch::new(config.http_timeout_secs)?);

        Ok(Self::new(name, dns, https, config))
    }

    /// The domain this context resolves.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The policy cache state.
    #[must_use]
    pub const fn policy_cache(&self) -> &PolicyCache {
        &self.cache
    }

    /// MX exchange hostnames, ascending by preference. Ties keep the
    /// original answer order. Empty when the domain has no MX records.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure; "no records" is
    /// an empty list.
    pub async fn mx(&mut self) -> Result<Vec<String>, ResolveError> {
        let Some(answer) = self.lookup_raw(LookupKind::Mx).await? else {
            return Ok(Vec::new());
        };

        let mut exchanges: Vec<(u16, String)> = answer
            .records
            .iter()
            .filter_map(|record| match record {
                RecordData::Mx {
                    preference,
                    exchange,
                } => Some((*preference, exchange.clone())),
                _ => None,
            })
            .collect();
        // Stable: equal preferences keep answer order.
        exchanges.sort_by_key(|(preference, _)| *preference);

        Ok(exchanges.into_iter().map(|(_, exchange)| exchange).collect())
    }

    /// The domain itself, when it resolves to at least one A/AAAA
    /// address; `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn a(&mut self) -> Result<Option<String>, ResolveError> {
        let answer = self.lookup_raw(LookupKind::Addr).await?;
        let has_address = answer.is_some_and(|answer| {
            answer
                .records
                .iter()
                .any(|record| matches!(record, RecordData::Addr(_)))
        });

        Ok(has_address.then(|| self.name.clone()))
    }

    /// Classifies the domain's mail path: MX records win, then the
    /// A/AAAA fallback, then nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn record_type(&mut self) -> Result<RecordClass, ResolveError> {
        if !self.mx().await?.is_empty() {
            return Ok(RecordClass::Mx);
        }
        if self.a().await?.is_some() {
            return Ok(RecordClass::A);
        }
        Ok(RecordClass::NonExistent)
    }

    /// The primary MTA hostname: the lowest-preference MX exchange, or
    /// the domain itself on the A/AAAA path, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn primary(&mut self) -> Result<Option<String>, ResolveError> {
        Ok(match self.record_type().await? {
            RecordClass::Mx => self.mx().await?.into_iter().next(),
            RecordClass::A => Some(self.name.clone()),
            RecordClass::NonExistent => None,
        })
    }

    /// DNSSEC flag of whichever lookup classified the domain: the MX
    /// lookup's on the MX path, the A/AAAA lookup's on the fallback
    /// path, `false` when the domain has no mail path.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_primary_secure(&mut self) -> Result<bool, ResolveError> {
        match self.record_type().await? {
            RecordClass::Mx => self.is_mx_secure().await,
            RecordClass::A => self.is_a_secure().await,
            RecordClass::NonExistent => Ok(false),
        }
    }

    /// The TLSA answer at `_25._tcp.<primary>`, or `None` when there
    /// is no primary or no TLSA records.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn tlsa(&mut self) -> Result<Option<DnsAnswer>, ResolveError> {
        if let Some(cached) = &self.tlsa_answer {
            return Ok(cached.clone());
        }

        // The TLSA name hangs off the primary MTA, so that lookup (and
        // whatever it depends on) happens first.
        let primary = self.primary().await?;
        let answer = match LookupKind::Tlsa.query_name(&self.name, primary.as_deref()) {
            Some(name) => {
                resolve_with_cname_chase(
                    self.dns.as_ref(),
                    &name,
                    LookupKind::Tlsa.query_type(),
                    self.config.cname_chase_limit,
                )
                .await?
            }
            None => None,
        };

        self.tlsa_answer = Some(answer.clone());
        Ok(answer)
    }

    /// The decoded `_mta-sts` TXT record. Decode failure (no pairs,
    /// missing `id`) reads as absent, the same as no record at all.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn sts(&mut self) -> Result<Option<StsRecord>, ResolveError> {
        if let Some(cached) = &self.sts_record {
            return Ok(cached.clone());
        }

        let record = self
            .lookup_raw(LookupKind::Sts)
            .await?
            .as_ref()
            .and_then(first_txt)
            .and_then(StsRecord::from_txt);

        self.sts_record = Some(record.clone());
        Ok(record)
    }

    /// The decoded `_smtp._tls` TXT record. Decode failure (no pairs,
    /// missing `rua`) reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn tlsrpt(&mut self) -> Result<Option<TlsrptRecord>, ResolveError> {
        if let Some(cached) = &self.tlsrpt_record {
            return Ok(cached.clone());
        }

        let record = self
            .lookup_raw(LookupKind::Tlsrpt)
            .await?
            .as_ref()
            .and_then(first_txt)
            .and_then(TlsrptRecord::from_txt);

        self.tlsrpt_record = Some(record.clone());
        Ok(record)
    }

    /// DNSSEC flag of the raw MX answer; `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_mx_secure(&mut self) -> Result<bool, ResolveError> {
        Ok(authenticated(self.lookup_raw(LookupKind::Mx).await?.as_ref()))
    }

    /// DNSSEC flag of the raw A/AAAA answer; `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_a_secure(&mut self) -> Result<bool, ResolveError> {
        Ok(authenticated(
            self.lookup_raw(LookupKind::Addr).await?.as_ref(),
        ))
    }

    /// DNSSEC flag of the raw TLSA answer; `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_tlsa_secure(&mut self) -> Result<bool, ResolveError> {
        Ok(authenticated(self.tlsa().await?.as_ref()))
    }

    /// DNSSEC flag of the raw MTA-STS TXT answer; `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_sts_secure(&mut self) -> Result<bool, ResolveError> {
        Ok(authenticated(
            self.lookup_raw(LookupKind::Sts).await?.as_ref(),
        ))
    }

    /// DNSSEC flag of the raw TLSRPT TXT answer; `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only on DNS transport failure.
    pub async fn is_tlsrpt_secure(&mut self) -> Result<bool, ResolveError> {
        Ok(authenticated(
            self.lookup_raw(LookupKind::Tlsrpt).await?.as_ref(),
        ))
    }

    /// Drops the memoized MTA-STS TXT answer and its decoded record so
    /// the next [`Domain::sts`] call re-queries DNS. No other slot is
    /// touched.
    pub fn invalidate_sts(&mut self) {
        self.sts_answer = None;
        self.sts_record = None;
    }

    /// The domain's policy document, fetching it on first call.
    ///
    /// A fetch requires the `_mta-sts` record to be present (its `id`
    /// is recorded for later change detection), retrieves
    /// `https://mta-sts.<domain>/.well-known/mta-sts.txt`, enforces
    /// the configured size limit before parsing, and rejects
    /// non-success statuses. On success the expiry timer starts from
    /// the document's `max_age`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Retrieval`] when no record is advertised or
    /// HTTPS returns a non-success status; [`ResolveError::SizeLimit`]
    /// when the body exceeds the limit; [`ResolveError::Policy`] when
    /// the body is malformed; transport errors pass through.
    pub async fn policy(&mut self) -> Result<PolicyDocument, ResolveError> {
        if let Some(policy) = self.cache.policy() {
            return Ok(policy.clone());
        }

        let sts = self.sts().await?.ok_or_else(|| {
            ResolveError::Retrieval(format!("no MTA-STS record advertised for {}", self.name))
        })?;

        let url = format!("https://mta-sts.{}/.well-known/mta-sts.txt", self.name);
        debug!("Fetching policy for {} from {url}", self.name);
        let response = self.https.get(&url).await?;

        self.check_response(&response)?;

        let policy = PolicyDocument::parse(&response.body)?;
        debug!(
            "Fetched policy for {}: mode={}, {} mx pattern(s)",
            self.name,
            policy.mode,
            policy.mx.len()
        );
        self.cache.store(
            policy.clone(),
            sts.id,
            Utc::now(),
            self.config.default_max_age_secs,
        );

        Ok(policy)
    }

    fn check_response(&self, response: &HttpsResponse) -> Result<(), ResolveError> {
        // Size first: an oversized body is rejected before any other
        // interpretation of the response.
        if let Some(limit) = self.config.max_policy_size {
            if response.body.len() > limit {
                return Err(ResolveError::SizeLimit {
                    size: response.body.len(),
                    limit,
                });
            }
        }
        if !response.is_success() {
            return Err(ResolveError::Retrieval(format!(
                "policy fetch for {} returned {}",
                self.name, response.status_line
            )));
        }
        Ok(())
    }

    /// Whether the cached policy is past its expiry, judged against
    /// the wall clock. An unfetched policy counts as expired.
    #[must_use]
    pub fn is_policy_expired(&self) -> bool {
        self.is_policy_expired_at(Utc::now())
    }

    /// [`Domain::is_policy_expired`] against a supplied instant.
    #[must_use]
    pub fn is_policy_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.cache.is_expired_at(now)
    }

    /// Checks whether the upstream policy changed, re-resolving the
    /// `_mta-sts` record once the cached policy has expired.
    ///
    /// Returns `false` without any DNS traffic while the policy is
    /// still valid. Past expiry: an unchanged `id` only restarts the
    /// expiry timer from the existing document's `max_age` (no
    /// re-fetch) and returns `false`; a changed `id` drops the cached
    /// document so the next [`Domain::policy`] call fetches afresh,
    /// and returns `true`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Retrieval`] when the previously present record
    /// has disappeared - a domain losing its MTA-STS record is treated
    /// as an error, not a silent downgrade.
    pub async fn check_policy_update(&mut self) -> Result<bool, ResolveError> {
        self.check_policy_update_at(Utc::now()).await
    }

    /// [`Domain::check_policy_update`] against a supplied instant.
    ///
    /// # Errors
    ///
    /// As [`Domain::check_policy_update`].
    pub async fn check_policy_update_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<bool, ResolveError> {
        if !self.cache.is_expired_at(now) {
            return Ok(false);
        }

        self.invalidate_sts();
        let sts = self.sts().await?.ok_or_else(|| {
            ResolveError::Retrieval(format!(
                "MTA-STS record for {} has disappeared since the last fetch",
                self.name
            ))
        })?;

        if self.cache.policy_id() == Some(sts.id.as_str()) {
            debug!("Policy id for {} unchanged, refreshing expiry", self.name);
            self.cache.refresh_expiry(now, self.config.default_max_age_secs);
            Ok(false)
        } else {
            debug!("Policy id for {} changed, dropping cached policy", self.name);
            self.cache.invalidate();
            Ok(true)
        }
    }

    async fn lookup_raw(&mut self, kind: LookupKind) -> Result<Option<DnsAnswer>, ResolveError> {
        // TLSA queries hang off the primary MX host, which only tlsa()
        // knows; routing one through here would memoize a bogus absence.
        debug_assert!(kind != LookupKind::Tlsa);

        if let Some(cached) = self.slot(kind) {
            return Ok(cached.clone());
        }

        let answer = match kind.query_name(&self.name, None) {
            Some(name) => {
                resolve_with_cname_chase(
                    self.dns.as_ref(),
                    &name,
                    kind.query_type(),
                    self.config.cname_chase_limit,
                )
                .await?
            }
            None => None,
        };

        *self.slot_mut(kind) = Some(answer.clone());
        Ok(answer)
    }

    const fn slot(&self, kind: LookupKind) -> &Option<Option<DnsAnswer>> {
        match kind {
            LookupKind::Mx => &self.mx_answer,
            LookupKind::Addr => &self.addr_answer,
            LookupKind::Tlsa => &self.tlsa_answer,
            LookupKind::Sts => &self.sts_answer,
            LookupKind::Tlsrpt => &self.tlsrpt_answer,
        }
    }

    const fn slot_mut(&mut self, kind: LookupKind) -> &mut Option<Option<DnsAnswer>> {
        match kind {
            LookupKind::Mx => &mut self.mx_answer,
            LookupKind::Addr => &mut self.addr_answer,
            LookupKind::Tlsa => &mut self.tlsa_answer,
            LookupKind::Sts => &mut self.sts_answer,
            LookupKind::Tlsrpt => &mut self.tlsrpt_answer,
        }
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn first_txt(answer: &DnsAnswer) -> Option<&str> {
    answer.records.iter().find_map(|record| match record {
        RecordData::Txt(text) => Some(text.as_str()),
        _ => None,
    })
}

fn authenticated(answer: Option<&DnsAnswer>) -> bool {
    answer.is_some_and(|answer| answer.authenticated)
}
