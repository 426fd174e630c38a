//! Profile configuration record.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::catalog::CatalogSource;
use crate::error::{ClauderockError, Result};
use crate::models::Geography;

/// How a profile reaches the model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProfileType {
    /// Amazon Bedrock through cross-region inference profiles.
    Bedrock,
    /// A directly configured HTTP completion API.
    Api,
}

/// The three model slots a profile configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ModelTier {
    #[strum(to_string = "model")]
    Main,
    #[strum(to_string = "fast-model")]
    Fast,
    #[strum(to_string = "heavy-model")]
    Heavy,
}

/// Keys accepted by `manage config get|set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ProfileType,
    Profile,
    Region,
    CrossRegion,
    BaseUrl,
    ApiKeyId,
    Model,
    FastModel,
    HeavyModel,
}

impl ConfigKey {
    pub fn model_tier(self) -> Option<ModelTier> {
        match self {
            Self::Model => Some(ModelTier::Main),
            Self::FastModel => Some(ModelTier::Fast),
            Self::HeavyModel => Some(ModelTier::Heavy),
            _ => None,
        }
    }
}

/// A stored profile.
///
/// Model fields hold either friendly names or full inference profile
/// identifiers; migrations move them from the former to the latter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileConfig {
    #[serde(default)]
    pub version: String,
    /// Unset on profiles written before profile types existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
    /// AWS shared-config profile name.
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub cross_region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key_id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub fast_model: String,
    #[serde(default)]
    pub heavy_model: String,
}

/// Bedrock routing settings of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedrockTarget {
    pub aws_profile: String,
    pub region: String,
    pub geography: Geography,
}

impl BedrockTarget {
    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::new(self.aws_profile.clone(), self.region.clone())
    }
}

/// Direct-API settings of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    pub base_url: String,
    pub api_key_id: String,
}

/// Typed view of the type-specific half of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Bedrock(BedrockTarget),
    Api(ApiTarget),
}

impl ProfileConfig {
    /// A new, unconfigured Bedrock profile.
    pub fn fresh(version: &str) -> Self {
        Self {
            version: version.to_string(),
            profile_type: Some(ProfileType::Bedrock),
            profile: "default".to_string(),
            region: "us-east-1".to_string(),
            cross_region: Geography::Global.to_string(),
            ..Self::default()
        }
    }

    /// The profile type, treating an unset type as the legacy Bedrock default.
    pub fn effective_type(&self) -> ProfileType {
        self.profile_type.unwrap_or(ProfileType::Bedrock)
    }

    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Main => &self.model,
            ModelTier::Fast => &self.fast_model,
            ModelTier::Heavy => &self.heavy_model,
        }
    }

    pub fn model_mut(&mut self, tier: ModelTier) -> &mut String {
        match tier {
            ModelTier::Main => &mut self.model,
            ModelTier::Fast => &mut self.fast_model,
            ModelTier::Heavy => &mut self.heavy_model,
        }
    }

    /// Whether any model field is populated.
    pub fn has_models(&self) -> bool {
        !(self.model.is_empty() && self.fast_model.is_empty() && self.heavy_model.is_empty())
    }

    /// Non-empty model values, deduplicated, in tier order.
    pub fn model_identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in [&self.model, &self.fast_model, &self.heavy_model] {
            if !id.is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn geography(&self) -> Result<Geography> {
        Geography::parse(&self.cross_region)
    }

    /// Typed view of the type-specific fields.
    pub fn kind(&self) -> Result<ProfileKind> {
        match self.effective_type() {
            ProfileType::Bedrock => Ok(ProfileKind::Bedrock(BedrockTarget {
                aws_profile: self.profile.clone(),
                region: self.region.clone(),
                geography: self.geography()?,
            })),
            ProfileType::Api => Ok(ProfileKind::Api(ApiTarget {
                base_url: self.base_url.clone(),
                api_key_id: self.api_key_id.clone(),
            })),
        }
    }

    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::new(self.profile.clone(), self.region.clone())
    }

    /// Check that every field needed to launch is present.
    pub fn validate(&self) -> Result<()> {
        fn missing(field: &str) -> Result<()> {
            Err(ClauderockError::Configuration(format!("{field} is required")))
        }
        match self.effective_type() {
            ProfileType::Bedrock => {
                if self.profile.is_empty() {
                    return missing("profile");
                }
                if self.region.is_empty() {
                    return missing("region");
                }
                if self.cross_region.is_empty() {
                    return missing("cross-region");
                }
                self.geography()?;
            }
            ProfileType::Api => {
                if self.base_url.is_empty() {
                    return missing("base-url");
                }
                if self.api_key_id.is_empty() {
                    return missing("api-key-id");
                }
            }
        }
        if self.model.is_empty() {
            return missing("model");
        }
        if self.fast_model.is_empty() {
            return missing("fast-model");
        }
        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::ProfileType => self
                .profile_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            ConfigKey::Profile => self.profile.clone(),
            ConfigKey::Region => self.region.clone(),
            ConfigKey::CrossRegion => self.cross_region.clone(),
            ConfigKey::BaseUrl => self.base_url.clone(),
            ConfigKey::ApiKeyId => self.api_key_id.clone(),
            ConfigKey::Model => self.model.clone(),
            ConfigKey::FastModel => self.fast_model.clone(),
            ConfigKey::HeavyModel => self.heavy_model.clone(),
        }
    }

    /// Set a field from its textual form. Model values are stored verbatim.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::ProfileType => {
                let parsed = value.parse::<ProfileType>().map_err(|_| {
                    ClauderockError::InvalidArgument(format!(
                        "invalid profile-type: {value} (must be one of: bedrock, api)"
                    ))
                })?;
                self.profile_type = Some(parsed);
            }
            ConfigKey::Profile => self.profile = value.to_string(),
            ConfigKey::Region => self.region = value.to_string(),
            ConfigKey::CrossRegion => {
                self.cross_region = Geography::parse(value)?.to_string();
            }
            ConfigKey::BaseUrl => self.base_url = value.to_string(),
            ConfigKey::ApiKeyId => {
                return Err(ClauderockError::InvalidArgument(
                    "api-key-id is managed by clauderock; set api-key instead".into(),
                ))
            }
            ConfigKey::Model | ConfigKey::FastModel | ConfigKey::HeavyModel => {
                if let Some(tier) = key.model_tier() {
                    *self.model_mut(tier) = value.to_string();
                }
            }
        }
        Ok(())
    }
}

/// Parse a `manage config` key.
pub fn parse_key(raw: &str) -> Result<ConfigKey> {
    raw.parse()
        .map_err(|_| ClauderockError::InvalidArgument(format!("unknown config key: {raw}")))
}
