//! Rate Limit Configuration
//!
//! Rolling-window policies mirroring the quotas rustmaps.com enforces on
//! each API key.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Requests allowed by the service within any trailing 60 seconds
pub const DEFAULT_MAX_PER_MINUTE: u32 = 80;
/// Requests allowed by the service within any trailing hour
pub const DEFAULT_MAX_PER_HOUR: u32 = 3600;

pub const MINUTE_WINDOW_SECS: u64 = 60;
pub const HOUR_WINDOW_SECS: u64 = 3600;

/// A single `(window, max calls)` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Trailing window length in whole seconds
    pub window_secs: u64,

    /// Calls allowed inside the window
    pub max_calls: u32,
}

impl RateLimitPolicy {
    pub const fn new(window_secs: u64, max_calls: u32) -> Self {
        Self {
            window_secs,
            max_calls,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limit configuration
///
/// Both limits are evaluated independently and must hold at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum calls in the trailing minute
    pub max_per_minute: u32,

    /// Maximum calls in the trailing hour
    pub max_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_minute: DEFAULT_MAX_PER_MINUTE,
            max_per_hour: DEFAULT_MAX_PER_HOUR,
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policies in ascending window order
    pub fn policies(&self) -> Vec<RateLimitPolicy> {
        vec![
            RateLimitPolicy::new(MINUTE_WINDOW_SECS, self.max_per_minute),
            RateLimitPolicy::new(HOUR_WINDOW_SECS, self.max_per_hour),
        ]
    }
}
