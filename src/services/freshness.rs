//! Staleness policy for cached repository and issue data.
//!
//! Pure decision logic over a nullable "last cached" timestamp: no I/O, no
//! side effects. Callers (list/detail handlers, the sync scheduler) use it
//! to decide whether cached rows can be served as-is or need a refetch.

use chrono::{DateTime, Duration, Utc};

/// Default freshness window in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// TTL-based freshness policy. The TTL is an explicit parameter so the
/// policy stays testable in isolation.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    ttl: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with the given TTL in seconds.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Decide whether cached data must be refetched before being trusted.
    ///
    /// `stale = cached_at is null OR now - cached_at > ttl`. The comparison
    /// is strict, so data exactly TTL old is still fresh.
    pub fn is_stale(&self, cached_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match cached_at {
            None => true,
            Some(t) => now - t > self.ttl,
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_SECS)
    }
}

/// Coarse human-readable freshness label for display next to cached data.
///
/// "Never synced" when the row has never completed a sync; otherwise the
/// elapsed time bucketed to the largest whole unit (integer truncation, no
/// rounding) suffixed with "ago".
pub fn freshness_in_words(cached_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(cached_at) = cached_at else {
        return "Never synced".to_string();
    };

    let elapsed = (now - cached_at).num_seconds().max(0);

    if elapsed < 60 {
        format!("{} seconds ago", elapsed)
    } else if elapsed < 3600 {
        format!("{} minutes ago", elapsed / 60)
    } else if elapsed < 86400 {
        format!("{} hours ago", elapsed / 3600)
    } else {
        format!("{} days ago", elapsed / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn secs_ago(s: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::seconds(s))
    }

    #[test]
    fn test_null_cached_at_is_stale() {
        let policy = FreshnessPolicy::new(300);
        assert!(policy.is_stale(None, now()));
    }

    #[test]
    fn test_exactly_ttl_old_is_fresh() {
        let policy = FreshnessPolicy::new(300);
        assert!(!policy.is_stale(secs_ago(300), now()));
    }

    #[test]
    fn test_one_second_past_ttl_is_stale() {
        let policy = FreshnessPolicy::new(300);
        assert!(policy.is_stale(secs_ago(301), now()));
    }

    #[test]
    fn test_just_cached_is_fresh() {
        let policy = FreshnessPolicy::new(300);
        assert!(!policy.is_stale(secs_ago(0), now()));
    }

    #[test]
    fn test_ttl_is_a_parameter() {
        let tight = FreshnessPolicy::new(10);
        assert!(tight.is_stale(secs_ago(11), now()));
        assert!(!tight.is_stale(secs_ago(10), now()));
    }

    #[test]
    fn test_words_never_synced() {
        assert_eq!(freshness_in_words(None, now()), "Never synced");
    }

    #[test]
    fn test_words_second_buckets() {
        assert_eq!(freshness_in_words(secs_ago(0), now()), "0 seconds ago");
        assert_eq!(freshness_in_words(secs_ago(59), now()), "59 seconds ago");
    }

    #[test]
    fn test_words_minute_buckets() {
        assert_eq!(freshness_in_words(secs_ago(60), now()), "1 minutes ago");
        assert_eq!(freshness_in_words(secs_ago(119), now()), "1 minutes ago");
        assert_eq!(freshness_in_words(secs_ago(3599), now()), "59 minutes ago");
    }

    #[test]
    fn test_words_hour_buckets() {
        assert_eq!(freshness_in_words(secs_ago(3600), now()), "1 hours ago");
        assert_eq!(freshness_in_words(secs_ago(86399), now()), "23 hours ago");
    }

    #[test]
    fn test_words_day_buckets() {
        assert_eq!(freshness_in_words(secs_ago(86400), now()), "1 days ago");
        assert_eq!(freshness_in_words(secs_ago(200_000), now()), "2 days ago");
    }
}
