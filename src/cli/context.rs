//! State shared by every command, built once per invocation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{ApiModelsClient, BedrockCatalogFetcher, CatalogFetcher};
use crate::config::{
    default_home_dir, ApiKeyStore, ConfigStore, FileProfileStore, ProfileConfig, ProfileType,
    Settings,
};
use crate::error::{ClauderockError, Result};
use crate::migrations::{load_migrated, MigrationEngine};
use crate::models::ModelResolver;
use crate::usage::JsonlUsageSink;

pub struct AppContext {
    pub home: PathBuf,
    pub settings: Settings,
    pub store: FileProfileStore,
    pub keys: ApiKeyStore,
    pub engine: MigrationEngine,
    bedrock: Arc<dyn CatalogFetcher>,
}

impl AppContext {
    /// Context rooted at `CLAUDEROCK_HOME` or `~/.clauderock`.
    pub fn from_env() -> Result<Self> {
        let bedrock: Arc<dyn CatalogFetcher> = Arc::new(BedrockCatalogFetcher::new()?);
        Self::new(default_home_dir(), bedrock)
    }

    pub fn new(home: PathBuf, bedrock: Arc<dyn CatalogFetcher>) -> Result<Self> {
        let settings = Settings::load(&home)?;
        Ok(Self {
            store: FileProfileStore::new(home.clone()),
            keys: ApiKeyStore::in_home(&home),
            engine: MigrationEngine::default(),
            settings,
            home,
            bedrock,
        })
    }

    pub fn with_engine(mut self, engine: MigrationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn resolver(&self) -> ModelResolver {
        ModelResolver::new(self.bedrock.clone())
    }

    /// Fetcher matching the profile's type.
    ///
    /// `api_key` overrides the stored key of API profiles.
    pub fn fetcher_for(
        &self,
        config: &ProfileConfig,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn CatalogFetcher>> {
        match config.effective_type() {
            ProfileType::Bedrock => Ok(self.bedrock.clone()),
            ProfileType::Api => {
                let key = match api_key {
                    Some(key) => key.to_string(),
                    None => self.keys.get(&config.api_key_id)?,
                };
                Ok(Arc::new(ApiModelsClient::new(&config.base_url, key)?))
            }
        }
    }

    pub fn usage_sink(&self) -> JsonlUsageSink {
        JsonlUsageSink::new(self.settings.usage_log_path(&self.home))
    }

    /// Load a profile (the active one when `name` is `None`) and migrate it.
    ///
    /// Applied migration steps are reported on stdout.
    pub async fn load_profile(&self, name: Option<&str>) -> Result<(String, ProfileConfig)> {
        let name = match name {
            Some(name) => {
                if !self.store.exists(name) {
                    return Err(ClauderockError::Configuration(format!(
                        "failed to load profile '{name}': profile does not exist"
                    )));
                }
                name.to_string()
            }
            None => {
                self.store
                    .load_or_create_current(self.engine.running_version())?
                    .0
            }
        };

        let needs_upgrade = self.engine.needs_migration(&self.store.load(&name)?);
        if needs_upgrade {
            println!("Upgrading config to version {}...", self.engine.running_version());
        }
        let outcome = load_migrated(&self.store, &self.engine, &self.resolver(), &name).await?;
        for step in &outcome.applied {
            println!("✓ {}", step.summary());
        }
        if needs_upgrade {
            println!();
        }
        Ok((name, outcome.config))
    }

    /// The active profile name.
    pub fn current_profile(&self) -> Result<String> {
        self.store.current()
    }
}
