//! Profiles, credentials, host settings and schema versions.

pub mod auth;
pub mod profile;
pub mod settings;
pub mod store;
pub mod version;

pub use auth::ApiKeyStore;
pub use profile::{
    parse_key, ApiTarget, BedrockTarget, ConfigKey, ModelTier, ProfileConfig, ProfileKind,
    ProfileType,
};
pub use settings::{default_home_dir, Settings};
pub use store::{ConfigStore, FileProfileStore, DEFAULT_PROFILE};
pub use version::{compare_versions, CURRENT_VERSION, DEV_VERSION};
