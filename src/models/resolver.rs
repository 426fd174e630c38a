//! Friendly-name to identifier resolution against a freshly fetched catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::geography::Geography;
use super::profile_id::{is_full_identifier, to_friendly_name};
use crate::catalog::{CatalogFetcher, CatalogSource};
use crate::error::{ClauderockError, Result};

/// Resolves friendly model names to full inference profile identifiers.
///
/// Every resolution fetches a new catalog; caching the result is the job of
/// the profile config that stores the resolved identifier.
#[derive(Clone)]
pub struct ModelResolver {
    fetcher: Arc<dyn CatalogFetcher>,
}

impl std::fmt::Debug for ModelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelResolver")
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

impl ModelResolver {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Arc<dyn CatalogFetcher> {
        &self.fetcher
    }

    /// Resolve `model` for `geography`.
    ///
    /// Full identifiers are returned as-is without touching the network.
    pub async fn resolve(
        &self,
        source: &CatalogSource,
        geography: Geography,
        model: &str,
    ) -> Result<String> {
        if is_full_identifier(model) {
            tracing::debug!(model, "model already resolved; skipping catalog fetch");
            return Ok(model.to_string());
        }

        let catalog = self
            .fetcher
            .fetch(source)
            .await
            .map_err(into_catalog_unavailable)?;
        let resolved = catalog.find_match(geography, model)?.to_string();
        tracing::debug!(model, %geography, resolved = %resolved, "resolved inference profile");
        Ok(resolved)
    }

    /// Friendly models available in `geography`, grouped by provider.
    pub async fn available_models(
        &self,
        source: &CatalogSource,
        geography: Geography,
    ) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let catalog = self
            .fetcher
            .fetch(source)
            .await
            .map_err(into_catalog_unavailable)?;
        let grouped = catalog.group_by_provider(geography);
        if grouped.is_empty() {
            return Err(ClauderockError::CatalogUnavailable(format!(
                "no models found for cross-region '{geography}'"
            )));
        }
        Ok(grouped)
    }

    /// Friendly name for a stored identifier.
    pub fn to_friendly(identifier: &str) -> String {
        to_friendly_name(identifier)
    }
}

fn into_catalog_unavailable(err: ClauderockError) -> ClauderockError {
    match err {
        ClauderockError::CatalogUnavailable(_) => err,
        other => ClauderockError::catalog_unavailable(other),
    }
}
