//! Request description handed from the client to the dispatch gate
//!
//! Requests are built from already validated values, so nothing here fails.

use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// How the gate should read the response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Fetch something that may or may not exist yet
    Read,
    /// Ask the service to generate something
    Create,
}

/// Caller-facing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetMap,
    GetMapById,
    GenerateMap,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::GetMap | Operation::GetMapById => OperationKind::Read,
            Operation::GenerateMap => OperationKind::Create,
        }
    }

    pub fn method(&self) -> Method {
        match self.kind() {
            OperationKind::Read => Method::Get,
            OperationKind::Create => Method::Post,
        }
    }

    /// Label used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetMap => "get_map",
            Operation::GetMapById => "get_map_by_id",
            Operation::GenerateMap => "generate_map",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/maps/{seed}/{size}`
    MapBySeed { seed: u32, size: u32 },
    /// `/maps/{mapId}`
    MapById(Uuid),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::MapBySeed { seed, size } => format!("/maps/{}/{}", seed, size),
            Endpoint::MapById(id) => format!("/maps/{}", id.hyphenated()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub operation: Operation,
    pub endpoint: Endpoint,
    pub staging: bool,
    pub barren: bool,
}

impl ApiRequest {
    pub fn new(operation: Operation, endpoint: Endpoint, staging: bool, barren: bool) -> Self {
        Self {
            operation,
            endpoint,
            staging,
            barren,
        }
    }

    pub fn method(&self) -> Method {
        self.operation.method()
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    /// Path relative to the API base, with the environment flags appended
    pub fn path_and_query(&self) -> String {
        format!(
            "{}?staging={}&barren={}",
            self.endpoint.path(),
            self.staging,
            self.barren
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_endpoint_path() {
        let request = ApiRequest::new(
            Operation::GetMap,
            Endpoint::MapBySeed {
                seed: 590877946,
                size: 2500,
            },
            false,
            true,
        );
        assert_eq!(
            request.path_and_query(),
            "/maps/590877946/2500?staging=false&barren=true"
        );
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.kind(), OperationKind::Read);
    }

    #[test]
    fn test_id_endpoint_is_lowercase_hyphenated() {
        let id = Uuid::parse_str("474B4C64-AB86-4128-A075-E88737FA5820").unwrap();
        let request = ApiRequest::new(Operation::GetMapById, Endpoint::MapById(id), true, false);
        assert_eq!(
            request.path_and_query(),
            "/maps/474b4c64-ab86-4128-a075-e88737fa5820?staging=true&barren=false"
        );
    }

    #[test]
    fn test_generate_is_post_create() {
        assert_eq!(Operation::GenerateMap.method(), Method::Post);
        assert_eq!(Operation::GenerateMap.kind(), OperationKind::Create);
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
