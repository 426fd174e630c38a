//! `clauderock manage models`.

use std::collections::{BTreeMap, BTreeSet};

use clap::{Args, Subcommand};

use super::context::AppContext;
use crate::catalog::{ApiModelInfo, ApiModelsClient};
use crate::config::{ModelTier, ProfileConfig, ProfileType};
use crate::error::Result;
use crate::models::{provider_display_name, Geography};

#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// List models available to a profile
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Filter by provider (e.g. anthropic, meta, amazon)
    #[arg(long)]
    pub provider: Option<String>,
    /// Override cross-region setting (us, eu, global)
    #[arg(long)]
    pub cross_region: Option<String>,
    /// Override AWS region
    #[arg(long)]
    pub region: Option<String>,
    /// Use settings from a specific profile
    #[arg(long)]
    pub profile: Option<String>,
}

pub async fn handle(ctx: &AppContext, args: ModelsArgs) -> Result<()> {
    match args.command {
        ModelsCommands::List(list) => list_models(ctx, list).await,
    }
}

async fn list_models(ctx: &AppContext, args: ListArgs) -> Result<()> {
    let (_, mut config) = ctx.load_profile(args.profile.as_deref()).await?;
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    if let Some(cross_region) = &args.cross_region {
        config.cross_region = cross_region.clone();
    }

    match config.effective_type() {
        ProfileType::Bedrock => list_bedrock(ctx, &config, args.provider.as_deref()).await,
        ProfileType::Api => list_api(ctx, &config, args.provider.as_deref()).await,
    }
}

async fn list_bedrock(ctx: &AppContext, config: &ProfileConfig, provider: Option<&str>) -> Result<()> {
    let geography = config.geography()?;
    println!("Fetching models from AWS Bedrock...");
    println!("  Region: {}", config.region);
    println!("  Cross-Region: {geography}");
    if let Some(provider) = provider {
        println!("  Provider Filter: {provider}");
    }
    println!();

    let grouped = ctx
        .resolver()
        .available_models(&config.catalog_source(), geography)
        .await?;
    let grouped = filter_providers(grouped, provider);
    if grouped.is_empty() {
        println!("No models found matching the criteria.");
        return Ok(());
    }
    print!("{}", render_listing(&grouped, &config.region, geography));
    Ok(())
}

async fn list_api(ctx: &AppContext, config: &ProfileConfig, provider: Option<&str>) -> Result<()> {
    println!("Fetching models from {}...", config.base_url);
    println!();

    let key = ctx.keys.get(&config.api_key_id)?;
    let models = ApiModelsClient::new(&config.base_url, key)?
        .fetch_models()
        .await?;

    let mut grouped: BTreeMap<String, Vec<&ApiModelInfo>> = BTreeMap::new();
    for model in &models {
        let vendor = model.id.split_once('/').map(|(v, _)| v).unwrap_or("other");
        if provider.is_some_and(|p| !p.eq_ignore_ascii_case(vendor)) {
            continue;
        }
        grouped
            .entry(provider_display_name(vendor))
            .or_default()
            .push(model);
    }
    if grouped.is_empty() {
        println!("No models found matching the criteria.");
        return Ok(());
    }

    let total: usize = grouped.values().map(Vec::len).sum();
    for (vendor, models) in &grouped {
        println!("{vendor}:");
        for model in models {
            let marker = if model.is_recommended_for(ModelTier::Main) {
                " (recommended)"
            } else if model.is_recommended_for(ModelTier::Fast) {
                " (fast)"
            } else {
                ""
            };
            println!("  • {} [{}]{marker}", model.display_name(), model.id);
        }
        println!();
    }
    println!("Found {total} models across {} providers.", grouped.len());
    Ok(())
}

fn filter_providers(
    grouped: BTreeMap<String, BTreeSet<String>>,
    provider: Option<&str>,
) -> BTreeMap<String, BTreeSet<String>> {
    match provider {
        None => grouped,
        Some(wanted) => grouped
            .into_iter()
            .filter(|(p, _)| p.eq_ignore_ascii_case(wanted))
            .collect(),
    }
}

/// Marker shown after a friendly model name.
pub fn model_indicator(friendly: &str) -> &'static str {
    let lower = friendly.to_ascii_lowercase();
    if lower.contains("haiku") {
        " (fast)"
    } else if lower.contains("sonnet-4-5") || lower.contains("sonnet-4.5") {
        " (recommended)"
    } else {
        ""
    }
}

/// Grouped listing, providers and models in sorted order.
pub fn render_listing(
    grouped: &BTreeMap<String, BTreeSet<String>>,
    region: &str,
    geography: Geography,
) -> String {
    let mut out = format!("Available models in {region} ({geography} cross-region):\n\n");
    let mut total = 0;
    for (provider, models) in grouped {
        total += models.len();
        out.push_str(&format!("{}:\n", provider_display_name(provider)));
        for model in models {
            out.push_str(&format!("  • {model}{}\n", model_indicator(model)));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "Found {total} models across {} providers.\n",
        grouped.len()
    ));
    out
}
