//! `clauderock manage profiles`.

use clap::{Args, Subcommand};

use super::context::AppContext;
use crate::config::{ConfigStore, FileProfileStore};
use crate::error::{ClauderockError, Result};

#[derive(Args, Debug)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommands {
    /// List all profiles
    List,
    /// Switch the active profile
    Switch { name: String },
    /// Save the active configuration under a new name
    Save { name: String },
    /// Delete a profile
    Delete { name: String },
    /// Rename a profile
    Rename { from: String, to: String },
    /// Copy a profile to a new name
    Copy { from: String, to: String },
}

pub async fn handle(ctx: &AppContext, args: ProfilesArgs) -> Result<()> {
    let store = &ctx.store;
    match args.command {
        ProfilesCommands::List => print!("{}", render_list(store)?),
        ProfilesCommands::Switch { name } => {
            store.set_current(&name)?;
            println!("Switched to profile '{name}'");
        }
        ProfilesCommands::Save { name } => {
            if store.exists(&name) {
                return Err(ClauderockError::InvalidArgument(format!(
                    "profile '{name}' already exists, delete it first or choose a different name"
                )));
            }
            let (current, _) = ctx.load_profile(None).await?;
            store.copy(&current, &name, &ctx.keys)?;
            println!("Saved current configuration as profile '{name}'");
        }
        ProfilesCommands::Delete { name } => {
            store.delete(&name, &ctx.keys)?;
            println!("Deleted profile '{name}'");
        }
        ProfilesCommands::Rename { from, to } => {
            store.rename(&from, &to)?;
            println!("Renamed profile '{from}' to '{to}'");
        }
        ProfilesCommands::Copy { from, to } => {
            // Migrate the source first so the copy starts current.
            ctx.load_profile(Some(&from)).await?;
            store.copy(&from, &to, &ctx.keys)?;
            println!("Copied profile '{from}' to '{to}'");
        }
    }
    Ok(())
}

fn render_list(store: &FileProfileStore) -> Result<String> {
    let names = store.list()?;
    if names.is_empty() {
        return Ok("No profiles found\n".to_string());
    }
    let current = store.current()?;
    let mut out = String::from("Available profiles:\n");
    for name in names {
        let kind = store
            .load(&name)
            .map(|config| config.effective_type().to_string())
            .unwrap_or_else(|_| "unreadable".to_string());
        if name == current {
            out.push_str(&format!("  * {name} ({kind}, active)\n"));
        } else {
            out.push_str(&format!("    {name} ({kind})\n"));
        }
    }
    Ok(out)
}
