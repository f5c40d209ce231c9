//! rustmaps-client
//!
//! Client library for the rustmaps.com map API: fetch maps by seed and size
//! or by identifier, and request generation of new ones.
//!
//! Every call is checked against a local quota (80 calls per minute and 3600
//! per hour by default) before it leaves the process. Calls that would exceed
//! the quota are skipped and reported as `RateLimited`, never sent.

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod request;
pub mod transport;
pub mod validation;

pub use client::MapsClient;
pub use config::{ClientConfig, LoggingConfig};
pub use error::{ClientError, Result};
pub use gate::{DispatchGate, Outcome};
pub use models::{FetchOutcome, GenerateOutcome, MapPayload};
pub use rate_limit::{QuotaTracker, QuotaUsage, RateLimitConfig, RateLimitPolicy, WindowUsage};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use validation::ValidationError;
