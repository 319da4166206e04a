//! Policy lifecycle state.
//!
//! [`PolicyCache`] holds the last successfully fetched policy document,
//! the advertised `id` it was fetched under, and when it stops being
//! valid: `Unfetched -> Valid -> Expired -> Valid` again after a
//! refresh, with [`crate::Domain`] driving the transitions. All expiry
//! judgements take the evaluation instant as a parameter so the clock
//! can be simulated in tests; callers normally pass `Utc::now()`.

use chrono::{DateTime, Duration, Utc};

use postguard_proto::PolicyDocument;

/// Cached policy state for one domain.
#[derive(Debug, Clone, Default)]
pub struct PolicyCache {
    policy: Option<PolicyDocument>,
    policy_id: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl PolicyCache {
    /// Creates an empty (unfetched) cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached document, if any.
    #[must_use]
    pub const fn policy(&self) -> Option<&PolicyDocument> {
        self.policy.as_ref()
    }

    /// The advertised `id` the cached document was fetched under.
    #[must_use]
    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    /// When the cached document stops being valid.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` once `now` is past the expiry timestamp. An
    /// unfetched cache counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now > expires_at)
    }

    /// Records a freshly fetched document, restarting the expiry timer
    /// from `now`. A document without `max_age` lives for
    /// `default_max_age_secs`.
    pub fn store(
        &mut self,
        policy: PolicyDocument,
        policy_id: String,
        now: DateTime<Utc>,
        default_max_age_secs: u64,
    ) {
        self.expires_at = Some(now + lifetime(policy.max_age, default_max_age_secs));
        self.policy_id = Some(policy_id);
        self.policy = Some(policy);
    }

    /// Restarts the expiry timer from `now` using the *existing*
    /// document's `max_age`, without touching the document itself.
    /// Used when a re-resolved record carries an unchanged `id`.
    pub fn refresh_expiry(&mut self, now: DateTime<Utc>, default_max_age_secs: u64) {
        let max_age = self.policy.as_ref().and_then(|policy| policy.max_age);
        self.expires_at = Some(now + lifetime(max_age, default_max_age_secs));
    }

    /// Drops the cached document so the next fetch starts from
    /// scratch. Used when the advertised `id` has changed.
    pub fn invalidate(&mut self) {
        self.policy = None;
        self.policy_id = None;
        self.expires_at = None;
    }
}

fn lifetime(max_age: Option<u64>, default_max_age_secs: u64) -> Duration {
    let secs = max_age.unwrap_or(default_max_age_secs);
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use postguard_proto::PolicyMode;

    use super::*;

    fn sample_policy(max_age: Option<u64>) -> PolicyDocument {
        PolicyDocument {
            version: "STSv1".to_string(),
            mode: PolicyMode::Enforce,
            max_age,
            mx: vec!["mta1.example.com".to_string()],
        }
    }

    #[test]
    fn test_unfetched_is_expired() {
        assert!(PolicyCache::new().is_expired_at(Utc::now()));
    }

    #[test]
    fn test_store_sets_expiry_from_max_age() {
        let mut cache = PolicyCache::new();
        let now = Utc::now();
        cache.store(sample_policy(Some(604_800)), "a".to_string(), now, 86_400);

        assert!(!cache.is_expired_at(now));
        assert!(!cache.is_expired_at(now + Duration::seconds(604_800)));
        assert!(cache.is_expired_at(now + Duration::seconds(604_801)));
    }

    #[test]
    fn test_store_without_max_age_uses_default() {
        let mut cache = PolicyCache::new();
        let now = Utc::now();
        cache.store(sample_policy(None), "a".to_string(), now, 86_400);

        assert!(!cache.is_expired_at(now + Duration::seconds(86_400)));
        assert!(cache.is_expired_at(now + Duration::seconds(86_401)));
    }

    #[test]
    fn test_refresh_expiry_keeps_document() {
        let mut cache = PolicyCache::new();
        let fetched = Utc::now();
        cache.store(sample_policy(Some(100)), "a".to_string(), fetched, 86_400);

        let later = fetched + Duration::seconds(500);
        assert!(cache.is_expired_at(later));

        cache.refresh_expiry(later, 86_400);
        assert!(!cache.is_expired_at(later));
        assert!(cache.is_expired_at(later + Duration::seconds(101)));
        assert_eq!(cache.policy(), Some(&sample_policy(Some(100))));
        assert_eq!(cache.policy_id(), Some("a"));
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let mut cache = PolicyCache::new();
        cache.store(sample_policy(Some(100)), "a".to_string(), Utc::now(), 86_400);
        cache.invalidate();

        assert!(cache.policy().is_none());
        assert!(cache.policy_id().is_none());
        assert!(cache.is_expired_at(Utc::now()));
    }
}
