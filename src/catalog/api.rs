//! Model listing for direct-API profiles (`GET {base}/v1/models`).
//!
//! These identifiers have no geography grammar; they are compared verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{bearer_headers, catalog_client, status_to_error};
use super::{CatalogFetcher, CatalogSource};
use crate::config::profile::ModelTier;
use crate::error::{ClauderockError, Result};
use crate::models::catalog::Catalog;

/// One entry of a `/v1/models` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Contexts the API recommends this model for (`code`, `code-fast`, `code-heavy`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended: Vec<String>,
}

impl ApiModelInfo {
    /// Whether the API recommends this model for `tier`.
    pub fn is_recommended_for(&self, tier: ModelTier) -> bool {
        let context = match tier {
            ModelTier::Main => "code",
            ModelTier::Fast => "code-fast",
            ModelTier::Heavy => "code-heavy",
        };
        self.recommended.iter().any(|r| r == context)
    }

    /// Human-readable name: `anthropic/claude-sonnet-4-5` becomes `Claude Sonnet 4 5`.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let tail = self.id.rsplit('/').next().unwrap_or(&self.id);
        tail.split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ApiModelInfo>,
}

/// Add `https://` when no scheme is given and drop a trailing slash.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Client for an OpenAI/OpenRouter-style model listing.
#[derive(Clone)]
pub struct ApiModelsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for ApiModelsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiModelsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ApiModelsClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: catalog_client()?,
            base_url: normalize_base_url(base_url),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the model list. An empty listing is an error.
    pub async fn fetch_models(&self) -> Result<Vec<ApiModelInfo>> {
        let url = format!("{}/v1/models", self.base_url);
        tracing::debug!(%url, "listing API models");

        let response = self
            .http
            .get(&url)
            .headers(bearer_headers(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }

        let parsed: ModelsResponse = response.json().await?;
        if parsed.data.is_empty() {
            return Err(ClauderockError::CatalogUnavailable(
                "no models available from API".into(),
            ));
        }
        Ok(parsed.data)
    }
}

#[async_trait]
impl CatalogFetcher for ApiModelsClient {
    fn name(&self) -> &str {
        "api"
    }

    async fn fetch(&self, _source: &CatalogSource) -> Result<Catalog> {
        Ok(self
            .fetch_models()
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect())
    }
}
