//! Time-bounded outcome accounting.
//!
//! # Responsibilities
//! - Keep the recent call outcomes of one breaker, oldest first
//! - Trim outcomes older than the window width on every append
//! - Count half-open probes in flight
//!
//! # Design Decisions
//! - Pruning is lazy: only `record` trims, `counts` reads what is there
//! - Records are time-ordered, so pruning is a prefix trim of a `VecDeque`
//! - No policy lives here; the breaker decides what the counts mean

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// A single observed call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// When the outcome was recorded.
    pub at: Instant,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Sliding record of outcomes plus the half-open probe counter.
#[derive(Debug)]
pub struct OutcomeWindow {
    records: VecDeque<OutcomeRecord>,
    width: Duration,
    probes: u32,
}

impl OutcomeWindow {
    /// Create an empty window retaining outcomes for `width`.
    pub fn new(width: Duration) -> Self {
        Self {
            records: VecDeque::new(),
            width,
            probes: 0,
        }
    }

    /// Append an outcome stamped now, dropping records older than the window.
    pub fn record(&mut self, success: bool) {
        let now = Instant::now();
        self.prune(now);
        self.records.push_back(OutcomeRecord { at: now, success });
    }

    /// Return `(failures, successes)` over the current contents.
    pub fn counts(&self) -> (u32, u32) {
        self.records.iter().fold((0, 0), |(failures, successes), r| {
            if r.success {
                (failures, successes + 1)
            } else {
                (failures + 1, successes)
            }
        })
    }

    /// Drop every record and reset the probe counter.
    pub fn clear(&mut self) {
        self.records.clear();
        self.probes = 0;
    }

    /// Increment the probe counter and return the new value.
    pub fn increment_probe(&mut self) -> u32 {
        self.probes = self.probes.saturating_add(1);
        self.probes
    }

    /// Take a probe slot if fewer than `quota` have been handed out.
    pub fn try_acquire_probe(&mut self, quota: u32) -> bool {
        if self.probes >= quota {
            return false;
        }
        self.increment_probe();
        true
    }

    /// Give back a probe slot once its call is no longer in flight.
    pub fn release_probe(&mut self) {
        self.probes = self.probes.saturating_sub(1);
    }

    /// Number of probe slots currently taken.
    pub fn probes(&self) -> u32 {
        self.probes
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.width) else {
            return;
        };
        while let Some(front) = self.records.front() {
            if front.at >= cutoff {
                break;
            }
            self.records.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends() {
        let mut window = OutcomeWindow::new(Duration::from_secs(1));
        assert!(window.is_empty());

        window.record(true);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_counts() {
        let mut window = OutcomeWindow::new(Duration::from_secs(5));
        window.record(true);
        window.record(true);
        window.record(false);

        assert_eq!(window.counts(), (1, 2));
    }

    #[test]
    fn test_clear_resets_probes() {
        let mut window = OutcomeWindow::new(Duration::from_secs(5));
        window.record(true);
        for _ in 0..5 {
            window.increment_probe();
        }
        assert_eq!(window.probes(), 5);

        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.probes(), 0);
    }

    #[test]
    fn test_probe_quota() {
        let mut window = OutcomeWindow::new(Duration::from_secs(5));
        assert!(window.try_acquire_probe(2));
        assert!(window.try_acquire_probe(2));
        assert!(!window.try_acquire_probe(2));
        assert_eq!(window.probes(), 2);

        assert!(!OutcomeWindow::new(Duration::from_secs(5)).try_acquire_probe(0));

        window.release_probe();
        assert!(window.try_acquire_probe(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prunes_on_record() {
        let mut window = OutcomeWindow::new(Duration::from_secs(10));
        window.record(false);
        window.record(false);

        tokio::time::advance(Duration::from_secs(6)).await;
        window.record(false);

        tokio::time::advance(Duration::from_secs(5)).await;
        // Counts are stale until the next write.
        assert_eq!(window.counts(), (3, 0));

        window.record(true);
        assert_eq!(window.counts(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_on_boundary_is_kept() {
        let mut window = OutcomeWindow::new(Duration::from_secs(10));
        window.record(false);

        tokio::time::advance(Duration::from_secs(10)).await;
        window.record(false);
        assert_eq!(window.counts(), (2, 0));
    }
}
