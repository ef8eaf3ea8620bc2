//! Pinecone implementation of the professor index
//!
//! Resolves the index data-plane host through the control plane and
//! issues nearest-neighbour queries against a single namespace.

use async_trait::async_trait;
use profrag_core::{PineconeConfig, ProfError, ProfessorMetadata, Result, RetrievalMatch, VectorIndex};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";

/// Pinecone vector index client, scoped to one namespace
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    api_version: String,
    index_name: String,
    /// Data plane base URL, e.g. `https://rag-abc123.svc.pinecone.io`
    host_url: String,
    namespace: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<ProfessorMetadata>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

impl PineconeIndex {
    /// Connect to the configured index, resolving its host when not set
    pub async fn connect(config: &PineconeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| ProfError::ConfigError("Pinecone API key required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProfError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let host = match &config.index_host {
            Some(host) => host.clone(),
            None => {
                describe_index_host(
                    &client,
                    &config.control_plane_url,
                    api_key,
                    &config.api_version,
                    &config.index_name,
                )
                .await?
            }
        };

        let index = Self {
            client,
            api_key: api_key.clone(),
            api_version: config.api_version.clone(),
            index_name: config.index_name.clone(),
            host_url: normalize_host(&host),
            namespace: config.namespace.clone(),
        };

        tracing::info!(
            index = %index.index_name,
            namespace = %index.namespace,
            host = %index.host_url,
            "Pinecone index connected"
        );

        Ok(index)
    }

    /// Create a client for a known host without contacting the control plane
    pub fn new(
        api_key: impl Into<String>,
        host: &str,
        index_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_version: PineconeConfig::default().api_version,
            index_name: index_name.into(),
            host_url: normalize_host(host),
            namespace: namespace.into(),
        }
    }

    /// Data plane base URL
    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Look up the data plane host of an index by name
async fn describe_index_host(
    client: &Client,
    control_plane_url: &str,
    api_key: &str,
    api_version: &str,
    index_name: &str,
) -> Result<String> {
    let url = format!(
        "{}/indexes/{}",
        control_plane_url.trim_end_matches('/'),
        index_name
    );
    tracing::debug!(%url, "Resolving Pinecone index host");

    let response = client
        .get(&url)
        .header(API_KEY_HEADER, api_key)
        .header(API_VERSION_HEADER, api_version)
        .send()
        .await
        .map_err(|e| ProfError::RetrievalError(format!("Describe index request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProfError::RetrievalError(format!(
            "Pinecone describe index error ({status}): {error_text}"
        )));
    }

    let described: DescribeIndexResponse = response.json().await.map_err(|e| {
        ProfError::RetrievalError(format!("Failed to parse describe index response: {e}"))
    })?;

    Ok(described.host)
}

/// Hosts from the control plane come without a scheme
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>> {
        let request = QueryRequest {
            namespace: &self.namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProfError::RetrievalError(format!("Query request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProfError::RetrievalError(format!(
                "Pinecone query error ({status}): {error_text}"
            )));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| ProfError::RetrievalError(format!("Failed to parse query response: {e}")))?;

        let matches: Vec<RetrievalMatch> = result
            .matches
            .into_iter()
            .take(top_k)
            .map(|m| RetrievalMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect();

        tracing::debug!(
            index = %self.index_name,
            namespace = %self.namespace,
            matches = matches.len(),
            "Pinecone query completed"
        );

        Ok(matches)
    }

    fn name(&self) -> &str {
        &self.index_name
    }
}

// ============================================================================
// Tests
// ============================================================================
