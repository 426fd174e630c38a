//! Versioned profile migrations.
//!
//! Each [`MigrationStep`] is keyed by the release that introduced it and runs
//! when the stored profile is strictly older than that release. Steps check
//! the field they would set before touching it, so re-running one is a
//! no-op. The engine migrates a copy: callers persist the returned record
//! only when the whole migration succeeded.

use crate::config::profile::{ModelTier, ProfileConfig, ProfileType};
use crate::config::store::ConfigStore;
use crate::config::version::{compare_versions, is_dev, is_older, CURRENT_VERSION};
use crate::error::{ClauderockError, Result};
use crate::models::profile_id::is_full_identifier;
use crate::models::provider_key::qualify_model_name;
use crate::models::resolver::ModelResolver;

use std::cmp::Ordering;

use strum::IntoEnumIterator;

/// One schema upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Prefix bare model names with their provider.
    QualifyModelNames,
    /// Mark untyped profiles as Bedrock profiles.
    BackfillProfileType,
    /// Replace friendly model names with full inference profile identifiers.
    CacheIdentifiers,
    /// Seed the heavy model from the main model.
    AddHeavyModel,
}

impl MigrationStep {
    /// All steps in the order they must run.
    ///
    /// The type backfill runs before any step that branches on the profile type.
    pub const ALL: [MigrationStep; 4] = [
        Self::QualifyModelNames,
        Self::BackfillProfileType,
        Self::CacheIdentifiers,
        Self::AddHeavyModel,
    ];

    /// Release that introduced the step.
    pub const fn target_version(self) -> &'static str {
        match self {
            Self::QualifyModelNames => "0.2.0",
            Self::CacheIdentifiers => "0.4.0",
            Self::AddHeavyModel => "0.5.0",
            Self::BackfillProfileType => "0.6.0",
        }
    }

    /// Past-tense summary for the user.
    pub const fn summary(self) -> &'static str {
        match self {
            Self::QualifyModelNames => "Added provider prefixes to model names",
            Self::BackfillProfileType => "Added profile type support (set to bedrock)",
            Self::CacheIdentifiers => "Cached model profile IDs for faster startup",
            Self::AddHeavyModel => "Added heavy model support (set to default model)",
        }
    }

    /// Apply this step to `config`, returning whether anything changed.
    pub async fn apply(self, config: &mut ProfileConfig, resolver: &ModelResolver) -> Result<bool> {
        match self {
            Self::BackfillProfileType => {
                if config.profile_type.is_some() {
                    return Ok(false);
                }
                config.profile_type = Some(ProfileType::Bedrock);
                Ok(true)
            }
            Self::QualifyModelNames => match config.effective_type() {
                ProfileType::Api => Ok(false),
                ProfileType::Bedrock => Ok(qualify_models(config)),
            },
            Self::CacheIdentifiers => match config.effective_type() {
                ProfileType::Api => Ok(false),
                ProfileType::Bedrock => cache_identifiers(config, resolver).await,
            },
            Self::AddHeavyModel => match config.effective_type() {
                ProfileType::Api => Ok(false),
                ProfileType::Bedrock => {
                    if !config.heavy_model.is_empty() || config.model.is_empty() {
                        return Ok(false);
                    }
                    config.heavy_model = config.model.clone();
                    Ok(true)
                }
            },
        }
    }
}

fn qualify_models(config: &mut ProfileConfig) -> bool {
    let mut changed = false;
    for tier in ModelTier::iter() {
        let slot = config.model_mut(tier);
        let qualified = qualify_model_name(slot);
        if qualified != *slot {
            *slot = qualified;
            changed = true;
        }
    }
    changed
}

async fn cache_identifiers(config: &mut ProfileConfig, resolver: &ModelResolver) -> Result<bool> {
    let pending: Vec<ModelTier> = ModelTier::iter()
        .filter(|tier| {
            let value = config.model(*tier);
            !value.is_empty() && !is_full_identifier(value)
        })
        .collect();
    if pending.is_empty() {
        return Ok(false);
    }

    let geography = config.geography()?;
    let source = config.catalog_source();
    for tier in pending {
        let resolved = resolver
            .resolve(&source, geography, config.model(tier))
            .await?;
        *config.model_mut(tier) = resolved;
    }
    Ok(true)
}

/// Result of running the engine over one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub config: ProfileConfig,
    /// Steps that changed something, in the order they ran.
    pub applied: Vec<MigrationStep>,
    /// Whether the version field was rewritten.
    pub stamped: bool,
}

impl MigrationOutcome {
    fn unchanged(config: ProfileConfig) -> Self {
        Self {
            config,
            applied: Vec::new(),
            stamped: false,
        }
    }

    /// Whether the record differs from what was loaded.
    pub fn changed(&self) -> bool {
        self.stamped || !self.applied.is_empty()
    }
}

/// Runs the migration steps a profile is due for and stamps the running version.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    running_version: String,
}

impl Default for MigrationEngine {
    fn default() -> Self {
        Self::new(CURRENT_VERSION)
    }
}

impl MigrationEngine {
    pub fn new(running_version: impl Into<String>) -> Self {
        Self {
            running_version: running_version.into(),
        }
    }

    pub fn running_version(&self) -> &str {
        &self.running_version
    }

    /// Whether `config` is due for any migration at all.
    ///
    /// Development builds never migrate, and an unversioned profile with no
    /// models is a fresh install rather than an old one.
    pub fn needs_migration(&self, config: &ProfileConfig) -> bool {
        if is_dev(&self.running_version) {
            return false;
        }
        if config.version.trim().is_empty() && !config.has_models() {
            return false;
        }
        is_older(&config.version, &self.running_version)
    }

    fn is_due(&self, step: MigrationStep, from: &str) -> bool {
        let target = step.target_version();
        is_older(from, target)
            && compare_versions(target, &self.running_version) != Ordering::Greater
    }

    /// Migrate a copy of `config`.
    ///
    /// On error nothing has been persisted and `config` is untouched.
    pub async fn migrate(
        &self,
        config: &ProfileConfig,
        resolver: &ModelResolver,
    ) -> Result<MigrationOutcome> {
        if !self.needs_migration(config) {
            return Ok(MigrationOutcome::unchanged(config.clone()));
        }

        let from = config.version.clone();
        let mut working = config.clone();
        let mut applied = Vec::new();

        for step in MigrationStep::ALL {
            if !self.is_due(step, &from) {
                tracing::debug!(?step, from = %from, "migration step not due");
                continue;
            }
            let changed = step.apply(&mut working, resolver).await.map_err(|e| {
                ClauderockError::Migration {
                    from: display_version(&from),
                    to: self.running_version.clone(),
                    source: Box::new(e),
                }
            })?;
            if changed {
                tracing::info!(?step, target = step.target_version(), "applied migration step");
                applied.push(step);
            }
        }

        working.version = self.running_version.clone();
        Ok(MigrationOutcome {
            config: working,
            applied,
            stamped: true,
        })
    }
}

fn display_version(version: &str) -> String {
    if version.trim().is_empty() {
        "unversioned".to_string()
    } else {
        version.to_string()
    }
}

/// Load `name`, migrate it and persist the result if anything changed.
///
/// A failed migration leaves the stored profile as it was.
pub async fn load_migrated(
    store: &dyn ConfigStore,
    engine: &MigrationEngine,
    resolver: &ModelResolver,
    name: &str,
) -> Result<MigrationOutcome> {
    let config = store.load(name)?;
    let outcome = engine.migrate(&config, resolver).await?;
    if outcome.changed() {
        store.save(name, &outcome.config).map_err(|e| {
            ClauderockError::Configuration(format!("failed to save migrated config: {e}"))
        })?;
    }
    Ok(outcome)
}
