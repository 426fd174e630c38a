//! The default command: launch `claude` with the active profile.

use std::sync::Arc;

use clap::Parser;

use super::context::AppContext;
use crate::config::{ProfileConfig, ProfileType};
use crate::error::{ClauderockError, Result};
use crate::launcher::{
    ignore_interrupts, launch_env, CatalogValidator, LaunchCommand, LaunchCoordinator, LaunchPlan,
    TokioProcessRunner,
};
use crate::models::{is_full_identifier, Geography};

const EPHEMERAL_KEY_ID: &str = "ephemeral";

/// Per-run overrides. Nothing here is written back to the profile.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "clauderock", disable_help_flag = true, disable_version_flag = true)]
pub struct LaunchOverrides {
    /// Use a specific clauderock profile for this run
    #[arg(long = "clauderock-profile")]
    pub profile: Option<String>,
    /// Override profile type for this run (bedrock or api)
    #[arg(long = "clauderock-profile-type")]
    pub profile_type: Option<String>,
    /// Override main model for this run
    #[arg(long = "clauderock-model")]
    pub model: Option<String>,
    /// Override fast model for this run
    #[arg(long = "clauderock-fast-model")]
    pub fast_model: Option<String>,
    /// Override heavy model for this run
    #[arg(long = "clauderock-heavy-model")]
    pub heavy_model: Option<String>,
    /// Override AWS profile for this run (bedrock only)
    #[arg(long = "clauderock-aws-profile")]
    pub aws_profile: Option<String>,
    /// Override AWS region for this run (bedrock only)
    #[arg(long = "clauderock-region")]
    pub region: Option<String>,
    /// Override cross-region setting for this run (bedrock only)
    #[arg(long = "clauderock-cross-region")]
    pub cross_region: Option<String>,
    /// Override base URL for this run (api only)
    #[arg(long = "clauderock-base-url")]
    pub base_url: Option<String>,
    /// Override API key for this run (api only, never stored)
    #[arg(long = "clauderock-api-key")]
    pub api_key: Option<String>,
}

impl LaunchOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a loaded profile.
    ///
    /// Type-specific overrides must match the (possibly overridden) profile
    /// type, and Bedrock model overrides must be full identifiers.
    pub fn apply(&self, config: &mut ProfileConfig) -> Result<()> {
        if let Some(raw) = &self.profile_type {
            let parsed = raw.parse::<ProfileType>().map_err(|_| {
                ClauderockError::InvalidArgument(
                    "--clauderock-profile-type must be either 'bedrock' or 'api'".into(),
                )
            })?;
            config.profile_type = Some(parsed);
        }
        let kind = config.effective_type();

        let only_for = |flag: &str, wanted: ProfileType| -> Result<()> {
            if kind == wanted {
                Ok(())
            } else {
                Err(ClauderockError::InvalidArgument(format!(
                    "--clauderock-{flag} can only be used with {wanted} profile type"
                )))
            }
        };

        if let Some(value) = &self.aws_profile {
            only_for("aws-profile", ProfileType::Bedrock)?;
            config.profile = value.clone();
        }
        if let Some(value) = &self.region {
            only_for("region", ProfileType::Bedrock)?;
            config.region = value.clone();
        }
        if let Some(value) = &self.cross_region {
            only_for("cross-region", ProfileType::Bedrock)?;
            config.cross_region = Geography::parse(value)?.to_string();
        }
        if let Some(value) = &self.base_url {
            only_for("base-url", ProfileType::Api)?;
            config.base_url = value.clone();
        }
        if self.api_key.is_some() {
            only_for("api-key", ProfileType::Api)?;
            if config.api_key_id.is_empty() {
                // The key comes from the flag; the id only has to be present.
                config.api_key_id = EPHEMERAL_KEY_ID.to_string();
            }
        }

        for (flag, value, slot) in [
            ("model", &self.model, &mut config.model),
            ("fast-model", &self.fast_model, &mut config.fast_model),
            ("heavy-model", &self.heavy_model, &mut config.heavy_model),
        ] {
            let Some(value) = value else { continue };
            if kind == ProfileType::Bedrock && !is_full_identifier(value) {
                return Err(ClauderockError::InvalidArgument(format!(
                    "--clauderock-{flag} must be a full profile ID for bedrock \
                     (e.g. 'global.anthropic.claude-sonnet-4-5-20250929-v1:0')\n\
                     Run 'clauderock manage models list' to see available models"
                )));
            }
            *slot = value.clone();
        }
        Ok(())
    }

    fn print_summary(&self, config: &ProfileConfig) {
        println!("Using overrides:");
        if self.profile_type.is_some() {
            println!("  Profile Type: {}", config.effective_type());
        }
        if self.aws_profile.is_some() {
            println!("  AWS Profile: {}", config.profile);
        }
        if self.region.is_some() {
            println!("  Region: {}", config.region);
        }
        if self.cross_region.is_some() {
            println!("  Cross Region: {}", config.cross_region);
        }
        if self.base_url.is_some() {
            println!("  Base URL: {}", config.base_url);
        }
        if self.api_key.is_some() {
            println!("  API Key: <provided via flag>");
        }
        if self.model.is_some() {
            println!("  Model: {}", config.model);
        }
        if self.fast_model.is_some() {
            println!("  Fast Model: {}", config.fast_model);
        }
        if self.heavy_model.is_some() {
            println!("  Heavy Model: {}", config.heavy_model);
        }
        println!();
    }
}

/// All three model slots must be filled before launching.
pub fn ensure_complete(config: &ProfileConfig) -> Result<()> {
    if config.model.is_empty() || config.fast_model.is_empty() || config.heavy_model.is_empty() {
        return Err(ClauderockError::Configuration(
            "model configuration is incomplete, please run: clauderock manage config".into(),
        ));
    }
    Ok(())
}

/// Load, override, validate and launch. Returns the child's exit code.
pub async fn run(overrides: &LaunchOverrides, passthrough: Vec<String>) -> Result<i32> {
    let ctx = AppContext::from_env()?;
    let (profile_name, mut config) = ctx.load_profile(overrides.profile.as_deref()).await?;

    overrides.apply(&mut config)?;
    ensure_complete(&config)?;
    config
        .validate()
        .map_err(|e| ClauderockError::Configuration(format!("invalid configuration: {e}")))?;
    if !overrides.is_empty() {
        overrides.print_summary(&config);
    }

    let api_key = match config.effective_type() {
        ProfileType::Bedrock => None,
        ProfileType::Api => match &overrides.api_key {
            Some(key) => Some(key.clone()),
            None => Some(ctx.keys.get(&config.api_key_id)?),
        },
    };

    let env = launch_env(&config, api_key.as_deref())?;
    let plan = LaunchPlan {
        profile_name,
        command: LaunchCommand {
            program: ctx.settings.claude_binary()?,
            args: passthrough,
            env: env.set,
            env_remove: env.remove,
        },
        identifiers: config.model_identifiers(),
    };

    let validator = CatalogValidator::new(
        ctx.fetcher_for(&config, api_key.as_deref())?,
        config.catalog_source(),
    );
    let coordinator = LaunchCoordinator::new(Arc::new(TokioProcessRunner))
        .with_validator(Arc::new(validator))
        .with_usage_sink(Arc::new(ctx.usage_sink()))
        .with_validation_timeout(ctx.settings.validation_timeout());

    let interrupts = ignore_interrupts();
    let result = coordinator.launch(&plan).await;
    interrupts.abort();
    result
}
