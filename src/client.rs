//! Maps Client
//!
//! Caller-facing surface. Arguments are validated here, before the quota is
//! consulted, so a bad seed never costs a call. Everything else is delegated
//! to the [`DispatchGate`].
//!
//! # Example
//!
//! ```no_run
//! use rustmaps_client::{ClientConfig, FetchOutcome, MapsClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MapsClient::new(ClientConfig::new("474b4c64-ab86-4128-a075-e88737fa5820"))?;
//! match client.get_map(590877946, 2500).await? {
//!     FetchOutcome::Found(map) => println!("map {:?}", map.map_id()),
//!     FetchOutcome::Generating(_) => println!("still generating"),
//!     FetchOutcome::NotFound => println!("never generated"),
//!     FetchOutcome::RateLimited => println!("try again later"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::gate::{DispatchGate, Outcome};
use crate::models::{FetchOutcome, GenerateOutcome};
use crate::rate_limit::QuotaUsage;
use crate::request::{ApiRequest, Endpoint, Operation};
use crate::transport::{HttpTransport, Transport};
use crate::validation::{validate_map_id, validate_map_seed, validate_map_size};

/// Client for the rustmaps.com map API
///
/// Share one instance (for example behind an `Arc`) to share its quota.
pub struct MapsClient<T = HttpTransport> {
    config: ClientConfig,
    gate: DispatchGate<T>,
}

impl MapsClient<HttpTransport> {
    /// Create a client talking to the configured API over HTTP
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> MapsClient<T> {
    /// Create a client over an arbitrary transport
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let gate = DispatchGate::new(transport, &config.rate_limit);
        tracing::debug!(
            staging = config.staging,
            barren = config.barren,
            "Created rustmaps client"
        );
        Self { config, gate }
    }

    /// Fetch a procedural map by seed and size
    pub async fn get_map(&self, seed: i64, size: i64) -> Result<FetchOutcome> {
        let seed = validate_map_seed(seed)?;
        let size = validate_map_size(size)?;
        let request = self.request(Operation::GetMap, Endpoint::MapBySeed { seed, size });
        Ok(fetch_outcome(self.gate.send(&request).await?))
    }

    /// Fetch a map by its identifier
    pub async fn get_map_by_id(&self, map_id: &str) -> Result<FetchOutcome> {
        let id = validate_map_id(map_id)?;
        let request = self.request(Operation::GetMapById, Endpoint::MapById(id));
        Ok(fetch_outcome(self.gate.send(&request).await?))
    }

    /// Ask the service to generate a procedural map
    ///
    /// A map that already exists is not an error; see
    /// [`GenerateOutcome::exists`].
    pub async fn generate_map(&self, seed: i64, size: i64) -> Result<GenerateOutcome> {
        let seed = validate_map_seed(seed)?;
        let size = validate_map_size(size)?;
        let request = self.request(Operation::GenerateMap, Endpoint::MapBySeed { seed, size });

        match self.gate.send(&request).await? {
            Outcome::Success(payload) => Ok(GenerateOutcome::Started(payload)),
            Outcome::Conflict(payload) => Ok(GenerateOutcome::AlreadyExists(payload)),
            Outcome::RateLimited => Ok(GenerateOutcome::RateLimited),
            // the gate never reports NotFound for a create
            Outcome::NotFound => Err(ClientError::UnexpectedStatus {
                status: 404,
                body: String::new(),
            }),
        }
    }

    pub fn quota_usage(&self) -> QuotaUsage {
        self.gate.quota_usage()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.gate.transport()
    }

    fn request(&self, operation: Operation, endpoint: Endpoint) -> ApiRequest {
        ApiRequest::new(operation, endpoint, self.config.staging, self.config.barren)
    }
}

fn fetch_outcome(outcome: Outcome) -> FetchOutcome {
    match outcome {
        Outcome::Success(payload) => FetchOutcome::Found(payload),
        Outcome::NotFound => FetchOutcome::NotFound,
        Outcome::Conflict(payload) => FetchOutcome::Generating(payload),
        Outcome::RateLimited => FetchOutcome::RateLimited,
    }
}
