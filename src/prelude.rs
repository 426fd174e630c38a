//! Convenience re-exports for common use.

pub use crate::catalog::{CatalogFetcher, CatalogSource, StaticCatalog};
#[cfg(feature = "bedrock")]
pub use crate::catalog::BedrockCatalogFetcher;
pub use crate::catalog::ApiModelsClient;
pub use crate::config::{
    ConfigStore, FileProfileStore, ModelTier, ProfileConfig, ProfileType, Settings,
};
pub use crate::error::{ClauderockError, Result};
pub use crate::launcher::{
    IdentifierValidator, LaunchCommand, LaunchCoordinator, LaunchPlan, ProcessRunner,
    RunningProcess, SessionOutcome,
};
pub use crate::migrations::{MigrationEngine, MigrationOutcome, MigrationStep};
pub use crate::models::{Catalog, Geography, ModelResolver};
pub use crate::usage::{JsonlUsageSink, SessionRecord, UsageSink};
