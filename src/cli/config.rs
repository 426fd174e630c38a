//! `clauderock manage config`.

use clap::{Args, Subcommand};
use strum::IntoEnumIterator;

use super::context::AppContext;
use crate::config::{parse_key, ApiKeyStore, ConfigKey, ConfigStore, ProfileConfig, ProfileType};
use crate::error::Result;

/// Pseudo-key that stores an API key in the credential store.
const API_KEY: &str = "api-key";

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List all values of the active profile
    List,
    /// Print one value of the active profile
    Get { key: String },
    /// Set a value in the active profile
    ///
    /// Keys: profile-type, profile, region, cross-region, base-url, model,
    /// fast-model, heavy-model, api-key. Model names on Bedrock profiles are
    /// resolved to full inference profile IDs before saving.
    Set { key: String, value: String },
}

pub async fn handle(ctx: &AppContext, args: ConfigArgs) -> Result<()> {
    let (name, mut config) = ctx.load_profile(None).await?;
    match args.command {
        ConfigCommands::List => {
            print!("{}", render_config(&name, &config));
        }
        ConfigCommands::Get { key } => {
            println!("{}", config.get(parse_key(&key)?));
        }
        ConfigCommands::Set { key, value } => {
            let stored = set_value(ctx, &mut config, &key, &value).await?;
            ctx.store.save(&name, &config)?;
            println!("Set {key} = {stored} (in profile '{name}')");
        }
    }
    Ok(())
}

/// Apply `key = value` and return the value as stored.
///
/// API keys are written to the credential store and echoed redacted.
pub async fn set_value(
    ctx: &AppContext,
    config: &mut ProfileConfig,
    key: &str,
    value: &str,
) -> Result<String> {
    if key == API_KEY {
        if config.api_key_id.is_empty() {
            config.api_key_id = ApiKeyStore::generate_id();
        }
        ctx.keys.store(&config.api_key_id, value)?;
        return Ok("<stored>".to_string());
    }

    let key = parse_key(key)?;
    let mut value = value.to_string();
    if key.model_tier().is_some() && config.effective_type() == ProfileType::Bedrock {
        println!("Validating model and resolving profile ID...");
        value = ctx
            .resolver()
            .resolve(&config.catalog_source(), config.geography()?, &value)
            .await?;
        println!("✓ Resolved to: {value}");
    }
    config.set(key, &value)?;
    Ok(config.get(key))
}

fn render_config(name: &str, config: &ProfileConfig) -> String {
    let mut out = format!("Configuration (profile: {name}):\n");
    let shown = ConfigKey::iter().filter(|key| match config.effective_type() {
        ProfileType::Bedrock => !matches!(key, ConfigKey::BaseUrl | ConfigKey::ApiKeyId),
        ProfileType::Api => !matches!(
            key,
            ConfigKey::Profile | ConfigKey::Region | ConfigKey::CrossRegion
        ),
    });
    for key in shown {
        let value = match key {
            ConfigKey::ProfileType => config.effective_type().to_string(),
            _ => config.get(key),
        };
        out.push_str(&format!("  {:<13} {value}\n", format!("{key}:")));
    }
    out
}
