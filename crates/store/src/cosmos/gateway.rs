//! The REST [`StoreGateway`] implementation.

use super::auth::{rfc1123_now, MasterKeySigner};
use super::types::{
    CreateContainerRequest, CreateDatabaseRequest, ErrorResponse, QueryRequest, QueryResponse,
};
use super::{headers, API_VERSION};
use crate::{NamespaceSpec, StoreError, StoreGateway};
use async_trait::async_trait;
use prioload_types::{Outcome, PriorityClass, Record, RecordId};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace};

const COUNT_QUERY: &str = "SELECT VALUE COUNT(1) FROM c";

/// Environment variable holding the account endpoint.
pub const ENDPOINT_ENV: &str = "COSMOS_ENDPOINT";

/// Environment variable holding the account key.
pub const KEY_ENV: &str = "COSMOS_KEY";

/// Connection parameters for the REST store.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Account endpoint, e.g. `https://myaccount.documents.azure.com:443/`.
    pub endpoint: String,

    /// Base64 account master key.
    pub key: String,

    /// TCP connect timeout.
    #[serde(skip)]
    pub connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            connect_timeout: None,
        }
    }

    /// Fill empty fields from `COSMOS_ENDPOINT` and `COSMOS_KEY`.
    pub fn with_env_fallback(mut self) -> Self {
        if self.endpoint.is_empty() {
            if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
                self.endpoint = endpoint;
            }
        }
        if self.key.is_empty() {
            if let Ok(key) = std::env::var(KEY_ENV) {
                self.key = key;
            }
        }
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Gateway over the REST API.
///
/// Holds a single pooled HTTP client that every request reuses.
#[derive(Debug, Clone)]
pub struct CosmosGateway {
    http: Client,
    endpoint: Url,
    signer: MasterKeySigner,
    namespace: NamespaceSpec,
}

impl CosmosGateway {
    /// Build the gateway. Fails on a malformed endpoint or key.
    pub fn connect(config: &ConnectionConfig, namespace: NamespaceSpec) -> Result<Self, StoreError> {
        if config.endpoint.is_empty() {
            return Err(StoreError::Connection(format!(
                "no endpoint configured (set {})",
                ENDPOINT_ENV
            )));
        }
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| StoreError::Connection(format!("invalid endpoint {}: {}", config.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(StoreError::Connection(format!(
                "unsupported endpoint scheme: {}",
                endpoint.scheme()
            )));
        }

        let signer = MasterKeySigner::new(&config.key)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {}", e)))?;

        info!(endpoint = %endpoint, container = %namespace.container_link(), "Connected gateway");

        Ok(Self {
            http,
            endpoint,
            signer,
            namespace,
        })
    }

    /// Start a signed request.
    fn request(
        &self,
        method: Method,
        path: &str,
        resource_type: &str,
        resource_link: &str,
    ) -> Result<RequestBuilder, StoreError> {
        let url = self
            .endpoint
            .join(path)
            .map_err(|e| StoreError::Connection(format!("invalid resource path {}: {}", path, e)))?;
        let date = rfc1123_now();
        let auth = self
            .signer
            .authorization(method.as_str(), resource_type, resource_link, &date);

        Ok(self
            .http
            .request(method, url)
            .header(headers::AUTHORIZATION, auth)
            .header(headers::DATE, date)
            .header(headers::VERSION, API_VERSION))
    }

    fn docs_link(&self) -> String {
        format!("{}/docs", self.namespace.container_link())
    }

    fn partition_key_header(id: RecordId) -> String {
        format!("[\"{}\"]", id)
    }

    /// Create a resource, treating "already exists" as success.
    async fn create_if_missing(
        &self,
        request: RequestBuilder,
        resource: String,
    ) -> Result<(), StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                info!(resource = %resource, "Created resource");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!(resource = %resource, "Resource already exists");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Connection(
                format!("credentials rejected while provisioning {}", resource),
            )),
            status => Err(StoreError::Provisioning {
                resource,
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }

    /// Fetch one page of the count query.
    async fn fetch_count_page(
        &self,
        container_link: &str,
        body: &[u8],
        continuation: Option<String>,
    ) -> Result<CountPage, StoreError> {
        let mut request = self
            .request(Method::POST, &self.docs_link(), "docs", container_link)?
            .header(reqwest::header::CONTENT_TYPE, "application/query+json")
            .header(headers::IS_QUERY, "True")
            .header(headers::CROSS_PARTITION, "True")
            .body(body.to_vec());
        if let Some(token) = continuation {
            request = request.header(headers::CONTINUATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Query(format!(
                "count query returned {}: {}",
                status.as_u16(),
                error_message(response).await
            )));
        }

        let continuation = continuation_token(response.headers());
        let page: QueryResponse<u64> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(CountPage::new(&page, continuation))
    }
}

/// Partial count from one query page, plus the token for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CountPage {
    partial: u64,
    continuation: Option<String>,
}

impl CountPage {
    /// Cross-partition counts arrive as one partial count per document.
    fn new(page: &QueryResponse<u64>, continuation: Option<String>) -> Self {
        Self {
            partial: page.documents.iter().sum(),
            continuation,
        }
    }
}

/// Read the continuation header. An empty token means the last page.
fn continuation_token(map: &HeaderMap) -> Option<String> {
    map.get(headers::CONTINUATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Fetch count pages until one comes back without a continuation token,
/// summing the partial counts. The first fetch carries no token.
async fn drain_count_pages<F, Fut>(mut fetch: F) -> Result<u64, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CountPage, StoreError>>,
{
    let mut total = 0u64;
    let mut continuation = None;
    loop {
        let page = fetch(continuation.take()).await?;
        trace!(partial = page.partial, "Count page");
        total += page.partial;
        match page.continuation {
            Some(token) => continuation = Some(token),
            None => return Ok(total),
        }
    }
}

/// Extract a readable message from an error response.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(_) => return status.to_string(),
    };
    let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();
    match parsed {
        Some(err) if !err.message.is_empty() => format!("{}: {}", err.code, err.message),
        _ if body.is_empty() => status.to_string(),
        _ => body,
    }
}

#[async_trait]
impl StoreGateway for CosmosGateway {
    fn namespace(&self) -> &NamespaceSpec {
        &self.namespace
    }

    async fn ensure_namespace(&self) -> Result<(), StoreError> {
        let ns = &self.namespace;

        let create_db = self
            .request(Method::POST, "dbs", "dbs", "")?
            .json(&CreateDatabaseRequest { id: &ns.database });
        self.create_if_missing(create_db, ns.database_link()).await?;

        let database_link = ns.database_link();
        let create_container = self
            .request(
                Method::POST,
                &format!("{}/colls", database_link),
                "colls",
                &database_link,
            )?
            .header(headers::OFFER_THROUGHPUT, ns.throughput.to_string())
            .json(&CreateContainerRequest::hashed(
                &ns.container,
                &ns.partition_key_path,
            ));
        self.create_if_missing(create_container, ns.container_link())
            .await
    }

    async fn count_records(&self) -> Result<u64, StoreError> {
        let container_link = self.namespace.container_link();
        let body = serde_json::to_vec(&QueryRequest {
            query: COUNT_QUERY,
            parameters: Vec::new(),
        })
        .map_err(|e| StoreError::Decode(e.to_string()))?;

        let (container_link, body) = (container_link.as_str(), body.as_slice());
        drain_count_pages(move |continuation| {
            self.fetch_count_page(container_link, body, continuation)
        })
        .await
    }

    async fn upsert(&self, record: &Record) -> Outcome {
        let request = match self.request(
            Method::POST,
            &self.docs_link(),
            "docs",
            &self.namespace.container_link(),
        ) {
            Ok(r) => r,
            Err(e) => return Outcome::failed(e),
        };

        let result = request
            .header(headers::IS_UPSERT, "True")
            .header(headers::PARTITION_KEY, Self::partition_key_header(record.id))
            .json(record)
            .send()
            .await;

        match result {
            Ok(response) => Outcome::from_status(response.status().as_u16()),
            Err(e) => Outcome::failed(e),
        }
    }

    async fn point_read(&self, id: RecordId, hint: Option<PriorityClass>) -> Outcome {
        let link = format!("{}/{}", self.docs_link(), id);
        let mut request = match self.request(Method::GET, &link, "docs", &link) {
            Ok(r) => r,
            Err(e) => return Outcome::failed(e),
        };
        request = request.header(headers::PARTITION_KEY, Self::partition_key_header(id));
        if let Some(priority) = hint {
            request = request.header(headers::PRIORITY_LEVEL, priority.as_header_value());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Outcome::failed(e),
        };

        match Outcome::from_status(response.status().as_u16()) {
            Outcome::Succeeded => match response.json::<Record>().await {
                Ok(record) if record.id == id => Outcome::Succeeded,
                Ok(record) => Outcome::failed(format!("asked for {}, got {}", id, record.id)),
                Err(e) => Outcome::failed(format!("decode {}: {}", id, e)),
            },
            other => other,
        }
    }
}
