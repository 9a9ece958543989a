//! Request and response bodies for the REST API.

use serde::{Deserialize, Serialize};

/// Body for creating a database.
#[derive(Debug, Serialize)]
pub struct CreateDatabaseRequest<'a> {
    pub id: &'a str,
}

/// Partition key definition of a container.
#[derive(Debug, Serialize)]
pub struct PartitionKeyDefinition<'a> {
    pub paths: Vec<&'a str>,
    pub kind: &'static str,
}

/// Body for creating a container.
#[derive(Debug, Serialize)]
pub struct CreateContainerRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "partitionKey")]
    pub partition_key: PartitionKeyDefinition<'a>,
}

impl<'a> CreateContainerRequest<'a> {
    /// Container hash-partitioned on a single path.
    pub fn hashed(id: &'a str, partition_key_path: &'a str) -> Self {
        Self {
            id,
            partition_key: PartitionKeyDefinition {
                paths: vec![partition_key_path],
                kind: "Hash",
            },
        }
    }
}

/// Body for a SQL query.
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub parameters: Vec<serde_json::Value>,
}

/// One page of query results.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<T> {
    #[serde(rename = "Documents")]
    pub documents: Vec<T>,
    #[serde(rename = "_count", default)]
    pub count: u64,
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
