//! Reachability tracking for cluster peers.
//!
//! Mirrors the shape of [`crate::supervisor::RestartBackoff`]: a sliding
//! window of recent heartbeat misses drives an escalating suspicion level,
//! rather than a single missed-heartbeat-and-you're-down check.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

/// Per-peer phi-accrual-style suspicion tracker, simplified to a counted
/// sliding window rather than a full phi calculation (the same
/// simplification `RestartBackoff` takes for restart storms).
#[derive(Debug, Clone)]
pub struct FailureDetector {
    heartbeat_window: Duration,
    miss_threshold: u32,
    misses: VecDeque<DateTime<Utc>>,
    last_heartbeat: Option<DateTime<Utc>>,
}

impl FailureDetector {
    pub fn new(heartbeat_window: Duration, miss_threshold: u32) -> Self {
        Self {
            heartbeat_window,
            miss_threshold,
            misses: VecDeque::new(),
            last_heartbeat: None,
        }
    }

    /// Record a successful heartbeat from the peer, clearing suspicion.
    pub fn record_heartbeat(&mut self) {
        self.last_heartbeat = Some(Utc::now());
        self.misses.clear();
    }

    /// Record a missed heartbeat deadline.
    pub fn record_miss(&mut self) {
        self.misses.push_front(Utc::now());
        self.cleanup_expired();
    }

    /// `true` once misses within the sliding window reach `miss_threshold`.
    /// A peer crossing this becomes `Unreachable` in the membership table.
    pub fn is_suspected(&mut self) -> bool {
        self.cleanup_expired();
        self.misses.len() >= self.miss_threshold as usize
    }

    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
    }

    fn cleanup_expired(&mut self) {
        let Ok(window) = chrono::Duration::from_std(self.heartbeat_window) else {
            return;
        };
        let cutoff = Utc::now() - window;
        while self.misses.back().is_some_and(|t| *t < cutoff) {
            self.misses.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_suspected_below_threshold() {
        let mut detector = FailureDetector::new(Duration::from_secs(60), 3);
        detector.record_miss();
        detector.record_miss();
        assert!(!detector.is_suspected());
    }

    #[test]
    fn suspected_at_threshold() {
        let mut detector = FailureDetector::new(Duration::from_secs(60), 3);
        for _ in 0..3 {
            detector.record_miss();
        }
        assert!(detector.is_suspected());
    }

    #[test]
    fn heartbeat_clears_suspicion() {
        let mut detector = FailureDetector::new(Duration::from_secs(60), 2);
        detector.record_miss();
        detector.record_miss();
        assert!(detector.is_suspected());

        detector.record_heartbeat();
        assert!(!detector.is_suspected());
        assert!(detector.last_heartbeat().is_some());
    }
}
