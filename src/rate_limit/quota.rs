//! Quota Tracker
//!
//! Sliding log of attempted call timestamps, evaluated against every
//! configured [`RateLimitPolicy`] on each check. Stale entries are pruned
//! lazily while evaluating; nothing runs in the background.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;

use super::config::{RateLimitConfig, RateLimitPolicy};

/// Whole seconds between `stamp` and `now`, rounded up.
///
/// A call made 0.1s ago counts as one second ago.
fn elapsed_secs_ceil(now: Instant, stamp: Instant) -> u64 {
    let elapsed = now.saturating_duration_since(stamp);
    elapsed.as_secs() + u64::from(elapsed.subsec_nanos() > 0)
}

/// Returned when a window has no room left for another call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit reached: {used}/{limit} calls in the last {window_secs}s")]
pub struct QuotaExceeded {
    pub window_secs: u64,
    pub limit: u32,
    pub used: u32,
}

/// Usage of a single window at the time of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowUsage {
    pub window_secs: u64,
    pub limit: u32,
    pub used: u32,
}

impl WindowUsage {
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// Point-in-time usage across all windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub windows: Vec<WindowUsage>,
}

impl QuotaUsage {
    pub fn is_allowed(&self) -> bool {
        self.exhausted().is_none()
    }

    /// First window (shortest first) that has no room left
    pub fn exhausted(&self) -> Option<&WindowUsage> {
        self.windows.iter().find(|w| w.is_exhausted())
    }

    pub fn window(&self, window_secs: u64) -> Option<&WindowUsage> {
        self.windows.iter().find(|w| w.window_secs == window_secs)
    }
}

/// Record of recent call attempts for one client
///
/// Not synchronized on its own; the dispatch gate keeps it behind a mutex so
/// that checking and recording happen in one critical section.
#[derive(Debug)]
pub struct QuotaTracker {
    policies: Vec<RateLimitPolicy>,

    /// Entries older than this many seconds are dropped on the next check
    horizon_secs: u64,

    /// Attempt instants, oldest first
    timestamps: VecDeque<Instant>,
}

impl QuotaTracker {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_policies(config.policies())
    }

    pub fn with_policies(policies: Vec<RateLimitPolicy>) -> Self {
        let horizon_secs = policies.iter().map(|p| p.window_secs).max().unwrap_or(0);
        Self {
            policies,
            horizon_secs,
            timestamps: VecDeque::new(),
        }
    }

    /// Whether a new call may be attempted at `now`.
    ///
    /// Prunes entries older than the longest window as a side effect. Does not
    /// reserve a slot: callers that proceed must [`record_attempt`] themselves.
    ///
    /// [`record_attempt`]: QuotaTracker::record_attempt
    pub fn is_allowed(&mut self, now: Instant) -> bool {
        if self.timestamps.is_empty() {
            return true;
        }
        self.usage(now).is_allowed()
    }

    /// Append an attempt. Call exactly once per call that actually goes out.
    pub fn record_attempt(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Check and record in one step.
    ///
    /// Returns usage including the attempt just recorded. On denial nothing
    /// is recorded.
    pub fn try_acquire(&mut self, now: Instant) -> Result<QuotaUsage, QuotaExceeded> {
        let mut usage = self.usage(now);
        if !self.timestamps.is_empty() {
            if let Some(window) = usage.exhausted() {
                return Err(QuotaExceeded {
                    window_secs: window.window_secs,
                    limit: window.limit,
                    used: window.used,
                });
            }
        }

        self.record_attempt(now);
        for window in &mut usage.windows {
            window.used += 1;
        }
        Ok(usage)
    }

    /// Prune stale entries and count the rest per window.
    ///
    /// An entry exactly `window_secs` old still counts toward that window.
    pub fn usage(&mut self, now: Instant) -> QuotaUsage {
        let horizon = self.horizon_secs;
        let policies = &self.policies;
        let mut counts = vec![0u32; policies.len()];

        self.timestamps.retain(|stamp| {
            let elapsed = elapsed_secs_ceil(now, *stamp);
            if elapsed > horizon {
                return false;
            }
            for (count, policy) in counts.iter_mut().zip(policies) {
                if elapsed <= policy.window_secs {
                    *count += 1;
                }
            }
            true
        });

        let windows = policies
            .iter()
            .zip(counts)
            .map(|(policy, used)| WindowUsage {
                window_secs: policy.window_secs,
                limit: policy.max_calls,
                used,
            })
            .collect();

        QuotaUsage { windows }
    }

    pub fn policies(&self) -> &[RateLimitPolicy] {
        &self.policies
    }

    /// Entries currently held, including any not yet pruned
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn is_chronological(&self) -> bool {
        self.timestamps
            .iter()
            .zip(self.timestamps.iter().skip(1))
            .all(|(earlier, later)| earlier <= later)
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}
