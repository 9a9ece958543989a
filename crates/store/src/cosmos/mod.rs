//! REST gateway for a Cosmos-style document store.
//!
//! Requests are signed with the account master key. Throttled requests
//! (HTTP 429) are never retried here; they are returned to the caller as
//! capacity rejections so the harness can count them.

mod auth;
mod gateway;
mod types;

pub use auth::{rfc1123_now, MasterKeySigner};
pub use gateway::{ConnectionConfig, CosmosGateway, ENDPOINT_ENV, KEY_ENV};
pub use types::{
    CreateContainerRequest, CreateDatabaseRequest, PartitionKeyDefinition, QueryRequest,
    QueryResponse,
};

/// REST API version sent with every request.
pub const API_VERSION: &str = "2020-07-15";

/// Header names used by the REST API.
pub mod headers {
    pub const AUTHORIZATION: &str = "authorization";
    pub const DATE: &str = "x-ms-date";
    pub const VERSION: &str = "x-ms-version";
    pub const PRIORITY_LEVEL: &str = "x-ms-cosmos-priority-level";
    pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
    pub const IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
    pub const IS_QUERY: &str = "x-ms-documentdb-isquery";
    pub const CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
    pub const CONTINUATION: &str = "x-ms-continuation";
    pub const OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
}
