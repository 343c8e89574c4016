//! TTL-based alert suppression
//!
//! Tracks, per issue fingerprint, when an operator was last notified and
//! answers "may I alert now?". Entries are only ever inserted or
//! refreshed; an aged-out entry stays in memory until the next alert for
//! the same fingerprint overwrites it.
//!
//! Concurrency contract: claims for the same fingerprint are serialized,
//! so two concurrent scans hitting the same issue cannot both decide to
//! alert. A claim is committed once the notification actually went out,
//! or released on failure so the next scan retries.

use dashmap::DashMap;

/// Default minimum interval between two alerts for the same fingerprint
pub const DEFAULT_ALERT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct SuppressionEntry {
    /// Unix timestamp of the last delivered alert. `None` while a first
    /// alert is still in flight.
    last_alerted_at: Option<i64>,
    /// An alert for this fingerprint is currently being dispatched
    in_flight: bool,
}

/// Per-fingerprint alert suppression cache
pub struct AlertSuppressor {
    ttl_secs: i64,
    entries: DashMap<String, SuppressionEntry>,
}

impl Default for AlertSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSuppressor {
    /// Create a suppressor with the default one-hour TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_ALERT_TTL_SECS)
    }

    /// Create a suppressor with a custom TTL in seconds
    pub fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            ttl_secs: ttl_secs.max(0),
            entries: DashMap::new(),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// True when no alert was ever recorded for this fingerprint, or the
    /// last one has aged out. Read-only; never mutates state.
    pub fn should_alert(&self, fingerprint: &str, now: i64) -> bool {
        match self.entries.get(fingerprint) {
            Some(entry) => match entry.last_alerted_at {
                Some(last) => now - last >= self.ttl_secs,
                None => true,
            },
            None => true,
        }
    }

    /// Atomically claim the right to alert on a fingerprint.
    ///
    /// Returns false when a fresh alert already exists or another claim is
    /// in flight. A successful claim must be followed by [`commit`] or
    /// [`release`].
    ///
    /// [`commit`]: AlertSuppressor::commit
    /// [`release`]: AlertSuppressor::release
    pub fn try_claim(&self, fingerprint: &str, now: i64) -> bool {
        let mut entry = self
            .entries
            .entry(fingerprint.to_string())
            .or_insert(SuppressionEntry {
                last_alerted_at: None,
                in_flight: false,
            });
        if entry.in_flight {
            return false;
        }
        if let Some(last) = entry.last_alerted_at {
            if now - last < self.ttl_secs {
                return false;
            }
        }
        entry.in_flight = true;
        true
    }

    /// Record a delivered alert, releasing the claim
    pub fn commit(&self, fingerprint: &str, now: i64) {
        self.record_alert(fingerprint, now);
    }

    /// Abandon a claim without recording anything, so the same issue is
    /// retried on the next scan. First-attempt residue is removed
    /// entirely.
    pub fn release(&self, fingerprint: &str) {
        let removed = self
            .entries
            .remove_if(fingerprint, |_, entry| entry.last_alerted_at.is_none());
        if removed.is_none() {
            if let Some(mut entry) = self.entries.get_mut(fingerprint) {
                entry.in_flight = false;
            }
        }
    }

    /// Insert or refresh the last-alerted timestamp for a fingerprint
    pub fn record_alert(&self, fingerprint: &str, now: i64) {
        self.entries
            .entry(fingerprint.to_string())
            .and_modify(|entry| {
                entry.last_alerted_at = Some(now);
                entry.in_flight = false;
            })
            .or_insert(SuppressionEntry {
                last_alerted_at: Some(now),
                in_flight: false,
            });
    }

    /// When the last alert for a fingerprint went out, if ever.
    /// Display/audit only; never mutates state.
    pub fn last_alerted_at(&self, fingerprint: &str) -> Option<i64> {
        self.entries
            .get(fingerprint)
            .and_then(|entry| entry.last_alerted_at)
    }

    /// Number of tracked fingerprints, expired entries included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_fingerprint_is_alertable() {
        let suppressor = AlertSuppressor::new();
        assert!(suppressor.should_alert("fp", 1_000));
        assert_eq!(suppressor.last_alerted_at("fp"), None);
    }

    #[test]
    fn test_suppressed_within_ttl_window() {
        let suppressor = AlertSuppressor::with_ttl(3600);
        suppressor.record_alert("fp", 1_000);

        assert!(!suppressor.should_alert("fp", 1_000));
        assert!(!suppressor.should_alert("fp", 1_010));
        assert!(!suppressor.should_alert("fp", 1_000 + 3599));
        assert!(suppressor.should_alert("fp", 1_000 + 3600));
        assert!(suppressor.should_alert("fp", 1_000 + 7200));
    }

    #[test]
    fn test_record_alert_overwrites_timestamp() {
        let suppressor = AlertSuppressor::with_ttl(3600);
        suppressor.record_alert("fp", 1_000);
        suppressor.record_alert("fp", 5_000);

        assert_eq!(suppressor.last_alerted_at("fp"), Some(5_000));
        assert!(!suppressor.should_alert("fp", 5_010));
        assert_eq!(suppressor.len(), 1);
    }

    #[test]
    fn test_claim_blocks_second_claim_until_resolution() {
        let suppressor = AlertSuppressor::with_ttl(3600);
        assert!(suppressor.try_claim("fp", 1_000));
        assert!(!suppressor.try_claim("fp", 1_000));

        suppressor.commit("fp", 1_001);
        assert!(!suppressor.try_claim("fp", 1_002));
        assert!(suppressor.try_claim("fp", 1_001 + 3600));
    }

    #[test]
    fn test_release_of_first_attempt_leaves_no_residue() {
        let suppressor = AlertSuppressor::with_ttl(3600);
        assert!(suppressor.try_claim("fp", 1_000));
        suppressor.release("fp");

        assert!(suppressor.is_empty());
        assert_eq!(suppressor.last_alerted_at("fp"), None);
        assert!(suppressor.try_claim("fp", 1_000));
    }

    #[test]
    fn test_release_after_refresh_keeps_previous_timestamp() {
        let suppressor = AlertSuppressor::with_ttl(3600);
        suppressor.record_alert("fp", 1_000);
        assert!(suppressor.try_claim("fp", 1_000 + 3600));
        suppressor.release("fp");

        assert_eq!(suppressor.last_alerted_at("fp"), Some(1_000));
        assert!(suppressor.try_claim("fp", 1_000 + 3600));
    }

    #[test]
    fn test_concurrent_claims_grant_exactly_one() {
        let suppressor = Arc::new(AlertSuppressor::with_ttl(3600));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let suppressor = suppressor.clone();
            handles.push(std::thread::spawn(move || suppressor.try_claim("fp", 1_000)));
        }

        let granted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|claimed| *claimed)
            .count();
        assert_eq!(granted, 1);
    }
}
