//! Logical namespace (database + container) definition.

use serde::{Deserialize, Serialize};

/// Database, container, partitioning and throughput for the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSpec {
    /// Database name.
    pub database: String,

    /// Container name.
    pub container: String,

    /// Partition key path. Records are partitioned by id.
    pub partition_key_path: String,

    /// Manually provisioned throughput in request units per second.
    pub throughput: u32,
}

impl Default for NamespaceSpec {
    fn default() -> Self {
        Self {
            database: "TestDatabase".to_string(),
            container: "TestPBE".to_string(),
            partition_key_path: "/id".to_string(),
            throughput: 400,
        }
    }
}

impl NamespaceSpec {
    /// Resource link of the database, e.g. `dbs/TestDatabase`.
    pub fn database_link(&self) -> String {
        format!("dbs/{}", self.database)
    }

    /// Resource link of the container, e.g. `dbs/TestDatabase/colls/TestPBE`.
    pub fn container_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    /// Set the throughput budget.
    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = throughput;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links() {
        let ns = NamespaceSpec::default();
        assert_eq!(ns.database_link(), "dbs/TestDatabase");
        assert_eq!(ns.container_link(), "dbs/TestDatabase/colls/TestPBE");
        assert_eq!(ns.partition_key_path, "/id");
        assert_eq!(ns.throughput, 400);
    }
}
