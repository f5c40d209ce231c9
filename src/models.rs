//! Response payloads and caller-facing outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Map data as returned by rustmaps.com
///
/// The service's schema is not modelled field by field; the raw JSON is kept
/// and the few fields callers usually need are exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapPayload(Value);

impl MapPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Map identifier; fetches return `id`, generation returns `mapId`
    pub fn map_id(&self) -> Option<&str> {
        self.0
            .get("id")
            .or_else(|| self.0.get("mapId"))
            .and_then(Value::as_str)
    }

    pub fn seed(&self) -> Option<u64> {
        self.0.get("seed").and_then(Value::as_u64)
    }

    pub fn size(&self) -> Option<u64> {
        self.0.get("size").and_then(Value::as_u64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Result of a map lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Map exists
    Found(MapPayload),
    /// Map has never been generated
    NotFound,
    /// Map is being generated right now
    Generating(MapPayload),
    /// Skipped locally; the quota is exhausted
    RateLimited,
}

impl FetchOutcome {
    pub fn payload(&self) -> Option<&MapPayload> {
        match self {
            FetchOutcome::Found(payload) | FetchOutcome::Generating(payload) => Some(payload),
            FetchOutcome::NotFound | FetchOutcome::RateLimited => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchOutcome::RateLimited)
    }
}

/// Result of a generation request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// Generation started; the map did not exist before
    Started(MapPayload),
    /// The map already existed
    AlreadyExists(MapPayload),
    /// Skipped locally; the quota is exhausted
    RateLimited,
}

impl GenerateOutcome {
    /// `Some(true)` if the map already existed, `None` if nothing was sent
    pub fn exists(&self) -> Option<bool> {
        match self {
            GenerateOutcome::Started(_) => Some(false),
            GenerateOutcome::AlreadyExists(_) => Some(true),
            GenerateOutcome::RateLimited => None,
        }
    }

    pub fn payload(&self) -> Option<&MapPayload> {
        match self {
            GenerateOutcome::Started(payload) | GenerateOutcome::AlreadyExists(payload) => {
                Some(payload)
            }
            GenerateOutcome::RateLimited => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerateOutcome::RateLimited)
    }
}
