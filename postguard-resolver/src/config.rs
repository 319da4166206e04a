//! Configuration for the policy resolver.

use serde::Deserialize;

/// Configuration for domain resolution and policy retrieval.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// DNS query timeout in seconds (default: 5)
    #[serde(default = "default_dns_timeout_secs")]
    pub dns_timeout_secs: u64,

    /// HTTPS fetch timeout in seconds (default: 10)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Maximum accepted policy document size in bytes (default: 65536)
    /// `None` disables the check entirely.
    #[serde(default = "default_max_policy_size")]
    pub max_policy_size: Option<usize>,

    /// Maximum number of CNAMEs followed per lookup before the result
    /// degrades to "no answer" (default: 20)
    /// Bounds misconfigured or adversarial zones with CNAME loops.
    #[serde(default = "default_cname_chase_limit")]
    pub cname_chase_limit: u32,

    /// Policy lifetime in seconds applied when a fetched document has
    /// no `max_age` of its own (default: 86400 = 1 day)
    #[serde(default = "default_max_age_secs")]
    pub default_max_age_secs: u64,
}

const fn default_dns_timeout_secs() -> u64 {
    5
}

const fn default_http_timeout_secs() -> u64 {
    10
}

const fn default_max_policy_size() -> Option<usize> {
    Some(65_536)
}

const fn default_cname_chase_limit() -> u32 {
    20
}

const fn default_max_age_secs() -> u64 {
    86_400 // 1 day
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dns_timeout_secs: default_dns_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            max_policy_size: default_max_policy_size(),
            cname_chase_limit: default_cname_chase_limit(),
            default_max_age_secs: default_max_age_secs(),
        }
    }
}
