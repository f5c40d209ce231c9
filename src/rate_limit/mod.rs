//! Client-side Rate Limiting
//!
//! rustmaps.com bans keys that exceed their quota, so every outbound call is
//! checked against a local record of recent attempts first.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                Dispatch Gate                  │
//! │        (Mutex<QuotaTracker> + Transport)      │
//! ├──────────────────────────────────────────────┤
//! │  ┌─────────────────┐   ┌──────────────────┐  │
//! │  │ 60s  -> 80 calls│   │ 3600s -> 3600    │  │
//! │  └─────────────────┘   └──────────────────┘  │
//! │        Timestamp record (lazy pruning)        │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod quota;

pub use config::{RateLimitConfig, RateLimitPolicy};
pub use quota::{QuotaExceeded, QuotaTracker, QuotaUsage, WindowUsage};
