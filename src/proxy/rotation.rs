//! Proxy pool rotation
//!
//! Owns the pool and all rotation state: which proxies were used in the
//! current 2-day window, and which failed during the current forwarded
//! request. Selection is uniformly random among eligible proxies so upstream
//! services cannot fingerprint a rotation sequence.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::models::{PoolStats, Proxy, Selection};

/// Length of the rolling usage window in calendar days
const USAGE_PERIOD_DAYS: i64 = 2;

/// Rotation state guarded by a single lock
///
/// The pool and its bookkeeping sets are swapped together, so an index in
/// either set is always a valid index into the current pool.
struct RotationState {
    pool: Vec<Proxy>,
    used_this_period: HashSet<usize>,
    failed_this_cycle: HashSet<usize>,
    period_start: NaiveDate,
}

/// Selects proxies from the pool and records per-attempt outcomes
///
/// Shared across concurrent forwarded requests; the lock is held only across
/// state reads/writes, never across a transport call.
pub struct Rotator {
    inner: Mutex<RotationState>,
}

impl Rotator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RotationState {
                pool: Vec::new(),
                used_this_period: HashSet::new(),
                failed_this_cycle: HashSet::new(),
                period_start: today_utc(),
            }),
        }
    }

    /// Select a proxy eligible for the current attempt
    ///
    /// Returns `None` only when every proxy in the pool has failed during the
    /// current cycle (or the pool is empty).
    pub fn select(&self) -> Option<Selection> {
        self.select_at(today_utc())
    }

    fn select_at(&self, today: NaiveDate) -> Option<Selection> {
        let mut state = self.inner.lock();

        let days_elapsed = (today - state.period_start).num_days().max(0);
        if days_elapsed >= USAGE_PERIOD_DAYS {
            debug!(days_elapsed, "Usage period elapsed, resetting used set");
            state.used_this_period.clear();
            state.period_start = today;
        } else if !state.pool.is_empty() && state.used_this_period.len() >= state.pool.len() {
            debug!("Entire pool used within the period, starting a new usage cycle");
            state.used_this_period.clear();
        }

        let eligible: Vec<usize> = (0..state.pool.len())
            .filter(|i| {
                !state.used_this_period.contains(i) && !state.failed_this_cycle.contains(i)
            })
            .collect();

        let candidates = if eligible.is_empty() {
            // Ignore the period quota rather than stall an in-flight request;
            // proxies that failed this cycle stay excluded.
            (0..state.pool.len())
                .filter(|i| !state.failed_this_cycle.contains(i))
                .collect()
        } else {
            eligible
        };

        let index = *candidates.choose(&mut rand::thread_rng())?;
        Some(Selection {
            proxy: state.pool[index].clone(),
            index,
        })
    }

    /// Record a successful use of the proxy at `index`
    pub fn mark_used(&self, index: usize) {
        let mut state = self.inner.lock();
        if index >= state.pool.len() {
            warn!(
                index,
                pool_size = state.pool.len(),
                "Ignoring mark_used for out-of-range index"
            );
            return;
        }
        state.used_this_period.insert(index);
    }

    /// Record a failure of the proxy at `index` for the current cycle
    pub fn mark_failed(&self, index: usize) {
        let mut state = self.inner.lock();
        if index >= state.pool.len() {
            warn!(
                index,
                pool_size = state.pool.len(),
                "Ignoring mark_failed for out-of-range index"
            );
            return;
        }
        state.failed_this_cycle.insert(index);
    }

    /// Clear the per-cycle failure set; called before each forwarded request
    pub fn reset_failures(&self) {
        self.inner.lock().failed_this_cycle.clear();
    }

    /// Atomically swap the pool and reset all rotation state
    pub fn replace_pool(&self, pool: Vec<Proxy>) {
        self.replace_pool_at(pool, today_utc());
    }

    fn replace_pool_at(&self, pool: Vec<Proxy>, today: NaiveDate) {
        let mut state = self.inner.lock();
        info!(
            old_size = state.pool.len(),
            new_size = pool.len(),
            "Replacing proxy pool"
        );
        state.pool = pool;
        state.used_this_period.clear();
        state.failed_this_cycle.clear();
        state.period_start = today;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().pool.is_empty()
    }

    /// Whether every proxy in the pool has failed during the current cycle
    pub fn all_failed_this_cycle(&self) -> bool {
        let state = self.inner.lock();
        !state.pool.is_empty() && state.failed_this_cycle.len() >= state.pool.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats_at(today_utc())
    }

    fn stats_at(&self, today: NaiveDate) -> PoolStats {
        let state = self.inner.lock();
        let days_elapsed = (today - state.period_start).num_days().max(0);
        PoolStats {
            pool_size: state.pool.len(),
            used_in_period: state.used_this_period.len(),
            remaining_in_period: state.pool.len() - state.used_this_period.len(),
            days_remaining: (USAGE_PERIOD_DAYS - days_elapsed).max(0),
        }
    }

    #[cfg(test)]
    fn set_period_start(&self, date: NaiveDate) {
        self.inner.lock().period_start = date;
    }

    #[cfg(test)]
    fn used_indices(&self) -> HashSet<usize> {
        self.inner.lock().used_this_period.clone()
    }
}

impl Default for Rotator {
    fn default() -> Self {
        Self::new()
    }
}

// Period arithmetic is pinned to UTC calendar dates so the 2-day boundary is
// unaffected by host time zones or daylight-saving shifts.
fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_pool(size: usize) -> Vec<Proxy> {
        (0..size)
            .map(|i| Proxy::new(format!("10.0.0.{}", i + 1), 8080))
            .collect()
    }

    fn rotator_with_pool(size: usize) -> Rotator {
        let rotator = Rotator::new();
        rotator.replace_pool(test_pool(size));
        rotator
    }

    #[test]
    fn test_select_empty_pool_returns_none() {
        let rotator = Rotator::new();
        assert!(rotator.select().is_none());
        assert!(rotator.is_empty());
    }

    #[test]
    fn test_select_does_not_mark_used() {
        let rotator = rotator_with_pool(3);
        rotator.select().unwrap();
        assert_eq!(rotator.stats().used_in_period, 0);
    }

    #[test]
    fn test_select_excludes_used_until_exhaustion() {
        let rotator = rotator_with_pool(3);

        // Three selections with mark_used hit three distinct proxies.
        let mut seen = HashSet::new();
        for _ in 0..3 {
            let selection = rotator.select().unwrap();
            assert!(seen.insert(selection.index));
            rotator.mark_used(selection.index);
        }
        assert_eq!(seen.len(), 3);

        // Quota exhausted before the window elapsed: the next call starts a
        // new usage cycle instead of blocking.
        let selection = rotator.select().unwrap();
        assert!(selection.index < 3);
        assert!(rotator.used_indices().is_empty());
    }

    #[test]
    fn test_select_never_returns_failed_index() {
        let rotator = rotator_with_pool(5);
        for i in 0..4 {
            rotator.mark_failed(i);
        }
        for _ in 0..20 {
            assert_eq!(rotator.select().unwrap().index, 4);
        }
    }

    #[test]
    fn test_select_none_when_all_failed() {
        let rotator = rotator_with_pool(2);
        rotator.mark_failed(0);
        rotator.mark_failed(1);
        assert!(rotator.select().is_none());
        assert!(rotator.all_failed_this_cycle());
    }

    #[test]
    fn test_fallback_to_used_proxies() {
        let rotator = rotator_with_pool(2);
        rotator.mark_used(0);
        rotator.mark_failed(1);

        // No fully eligible proxy remains; the quota gives way so the request
        // can still make progress.
        for _ in 0..10 {
            assert_eq!(rotator.select().unwrap().index, 0);
        }
    }

    #[test]
    fn test_reset_failures_restores_eligibility() {
        let rotator = rotator_with_pool(1);
        rotator.mark_failed(0);
        assert!(rotator.select().is_none());

        rotator.reset_failures();
        assert_eq!(rotator.select().unwrap().index, 0);
    }

    #[test]
    fn test_period_rollover_clears_used_and_advances_start() {
        let rotator = rotator_with_pool(3);
        rotator.mark_used(0);

        let today = today_utc();
        rotator.set_period_start(today - Duration::days(2));

        let selection = rotator.select_at(today).unwrap();
        assert!(selection.index < 3);
        assert!(rotator.used_indices().is_empty());
        assert_eq!(rotator.inner.lock().period_start, today);
    }

    #[test]
    fn test_period_rollover_ignores_fill_level() {
        // A single used entry is still cleared once the window elapses.
        let rotator = rotator_with_pool(5);
        rotator.mark_used(2);

        let today = today_utc();
        rotator.set_period_start(today - Duration::days(3));
        rotator.select_at(today).unwrap();
        assert!(rotator.used_indices().is_empty());
    }

    #[test]
    fn test_used_persists_within_period() {
        let rotator = rotator_with_pool(2);
        rotator.mark_used(0);

        let today = today_utc();
        rotator.set_period_start(today - Duration::days(1));

        assert_eq!(rotator.select_at(today).unwrap().index, 1);
        assert!(rotator.used_indices().contains(&0));
    }

    #[test]
    fn test_future_period_start_is_not_negative_elapsed() {
        let rotator = rotator_with_pool(2);
        rotator.mark_used(0);

        let today = today_utc();
        rotator.set_period_start(today + Duration::days(1));

        // Clock skew must not trigger a rollover.
        rotator.select_at(today).unwrap();
        assert!(rotator.used_indices().contains(&0));
        assert_eq!(rotator.stats_at(today).days_remaining, 2);
    }

    #[test]
    fn test_mark_out_of_range_is_a_noop() {
        let rotator = rotator_with_pool(2);
        rotator.mark_used(7);
        rotator.mark_failed(7);
        assert_eq!(rotator.stats().used_in_period, 0);
        assert!(!rotator.all_failed_this_cycle());
    }

    #[test]
    fn test_replace_pool_invalidates_old_indices() {
        let rotator = rotator_with_pool(5);
        rotator.mark_used(4);

        rotator.replace_pool(test_pool(2));

        // Indices valid only in the old pool are rejected, not recorded.
        rotator.mark_used(4);
        rotator.mark_failed(3);
        let stats = rotator.stats();
        assert_eq!(stats.pool_size, 2);
        assert_eq!(stats.used_in_period, 0);
        assert!(!rotator.all_failed_this_cycle());
    }

    #[test]
    fn test_replace_pool_resets_period() {
        let rotator = rotator_with_pool(2);
        rotator.mark_used(0);
        rotator.mark_failed(1);
        rotator.set_period_start(today_utc() - Duration::days(1));

        rotator.replace_pool(test_pool(3));

        let stats = rotator.stats();
        assert_eq!(stats.pool_size, 3);
        assert_eq!(stats.used_in_period, 0);
        assert_eq!(stats.remaining_in_period, 3);
        assert_eq!(stats.days_remaining, 2);
    }

    #[test]
    fn test_stats_days_remaining() {
        let rotator = rotator_with_pool(1);
        let today = today_utc();

        rotator.set_period_start(today);
        assert_eq!(rotator.stats_at(today).days_remaining, 2);

        rotator.set_period_start(today - Duration::days(1));
        assert_eq!(rotator.stats_at(today).days_remaining, 1);

        rotator.set_period_start(today - Duration::days(2));
        assert_eq!(rotator.stats_at(today).days_remaining, 0);

        rotator.set_period_start(today - Duration::days(5));
        assert_eq!(rotator.stats_at(today).days_remaining, 0);
    }

    #[test]
    fn test_stats_counts() {
        let rotator = rotator_with_pool(4);
        rotator.mark_used(0);
        rotator.mark_used(2);

        let stats = rotator.stats();
        assert_eq!(stats.pool_size, 4);
        assert_eq!(stats.used_in_period, 2);
        assert_eq!(stats.remaining_in_period, 2);
    }
}
