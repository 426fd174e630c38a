//! Catalog fetchers: where the list of model identifiers comes from.
//!
//! Bedrock profiles list system-defined inference profiles through the
//! Bedrock control plane; direct-API profiles list `/v1/models` on the
//! configured base URL.

pub mod api;
#[cfg(feature = "bedrock")]
pub mod bedrock;
pub mod http;

pub use api::{normalize_base_url, ApiModelInfo, ApiModelsClient};
#[cfg(feature = "bedrock")]
pub use bedrock::BedrockCatalogFetcher;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ClauderockError, Result};
use crate::models::catalog::Catalog;

/// Credentials profile and region a catalog is fetched with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSource {
    /// AWS shared-config profile name; empty means the default provider chain.
    pub aws_profile: String,
    pub region: String,
}

impl CatalogSource {
    pub fn new(aws_profile: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            aws_profile: aws_profile.into(),
            region: region.into(),
        }
    }
}

/// Fetches the current catalog of model identifiers.
///
/// Implementations report network and credential failures as errors; they
/// never return an empty catalog in place of a failure.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn fetch(&self, source: &CatalogSource) -> Result<Catalog>;
}

/// In-memory fetcher serving a fixed catalog.
///
/// Counts fetches and can simulate latency or a credential failure.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    catalog: Catalog,
    failure: Option<String>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// A fetcher whose every call fails as if credentials were rejected.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogFetcher for StaticCatalog {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, _source: &CatalogSource) -> Result<Catalog> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(ClauderockError::Authentication(message.clone())),
            None => Ok(self.catalog.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_catalog_counts_fetches() {
        let fetcher = StaticCatalog::new(Catalog::new(["us.a.b-v1"]));
        let source = CatalogSource::new("", "us-east-1");
        assert_eq!(fetcher.fetch(&source).await.unwrap().len(), 1);
        assert_eq!(fetcher.fetch(&source).await.unwrap().len(), 1);
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failing_catalog_returns_error() {
        let fetcher = StaticCatalog::failing("no creds");
        let err = fetcher
            .fetch(&CatalogSource::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClauderockError::Authentication(ref m) if m == "no creds"));
    }
}
