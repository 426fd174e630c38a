//! CLI entry point for clauderock.
//!
//! `clauderock manage ...` administers profiles. Any other invocation
//! launches the coding assistant: `--clauderock-*` flags are ours and every
//! other argument is handed to the child untouched.

pub mod config;
pub mod context;
pub mod launch;
pub mod models;
pub mod profiles;
pub mod stats;

pub use context::AppContext;
pub use launch::LaunchOverrides;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;

/// Configure and launch Claude Code with Bedrock inference profiles or an HTTP API.
#[derive(Parser, Debug)]
#[command(
    name = "clauderock",
    version,
    about = "Launch Claude Code with AWS Bedrock or API configuration",
    long_about = "clauderock configures and launches Claude Code.\n\n\
                  Arguments other than --clauderock-* flags are passed through to claude.\n\
                  Use `clauderock manage` to administer profiles and models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration, profiles, models and usage statistics
    Manage(ManageArgs),
}

#[derive(Args, Debug)]
pub struct ManageArgs {
    #[command(subcommand)]
    pub command: ManageCommands,
}

#[derive(Subcommand, Debug)]
pub enum ManageCommands {
    /// Read and write settings of the active profile
    Config(config::ConfigArgs),
    /// List, switch and organise profiles
    Profiles(profiles::ProfilesArgs),
    /// List available models
    Models(models::ModelsArgs),
    /// View usage statistics and estimated costs
    Stats(stats::StatsArgs),
}

/// Flags that take a value and belong to clauderock rather than the child.
pub const OWN_FLAGS: &[&str] = &[
    "--clauderock-profile",
    "--clauderock-profile-type",
    "--clauderock-model",
    "--clauderock-fast-model",
    "--clauderock-heavy-model",
    "--clauderock-aws-profile",
    "--clauderock-region",
    "--clauderock-cross-region",
    "--clauderock-base-url",
    "--clauderock-api-key",
];

/// What a command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Administration or help. Holds the full argv for clap.
    Manage(Vec<String>),
    /// Launch the child.
    Launch {
        /// Program name followed by `--clauderock-*` flags.
        own: Vec<String>,
        /// Everything else, in order.
        passthrough: Vec<String>,
    },
}

/// Split argv into our own arguments and the child's.
pub fn split_args(args: &[String]) -> Invocation {
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "clauderock".to_string());
    let rest = args.get(1..).unwrap_or_default();

    if let Some(first) = rest.first() {
        if matches!(
            first.as_str(),
            "manage" | "--help" | "-h" | "--version" | "-V"
        ) {
            return Invocation::Manage(args.to_vec());
        }
    }

    let mut own = vec![program];
    let mut passthrough = Vec::new();
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--clauderock-") && arg.contains('=') {
            own.push(arg.clone());
        } else if OWN_FLAGS.contains(&arg.as_str()) {
            own.push(arg.clone());
            if let Some(value) = iter.next() {
                own.push(value.clone());
            }
        } else {
            passthrough.push(arg.clone());
        }
    }
    Invocation::Launch { own, passthrough }
}

/// Run the CLI and return the process exit code.
pub async fn run(args: Vec<String>) -> i32 {
    match split_args(&args) {
        Invocation::Manage(argv) => {
            let cli = match Cli::try_parse_from(argv) {
                Ok(cli) => cli,
                Err(err) => {
                    // Help and version land here too and exit 0.
                    let code = err.exit_code();
                    let _ = err.print();
                    return code;
                }
            };
            report(run_manage(cli).await)
        }
        Invocation::Launch { own, passthrough } => {
            let overrides = match LaunchOverrides::try_parse_from(own) {
                Ok(overrides) => overrides,
                Err(err) => {
                    let code = err.exit_code();
                    let _ = err.print();
                    return code;
                }
            };
            match launch::run(&overrides, passthrough).await {
                Ok(code) => code,
                Err(err) => report::<()>(Err(err)),
            }
        }
    }
}

async fn run_manage(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_env()?;
    let Commands::Manage(manage) = cli.command;
    match manage.command {
        ManageCommands::Config(args) => config::handle(&ctx, args).await,
        ManageCommands::Profiles(args) => profiles::handle(&ctx, args).await,
        ManageCommands::Models(args) => models::handle(&ctx, args).await,
        ManageCommands::Stats(args) => stats::handle(&ctx, args),
    }
}

fn report<T>(result: Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
    }
}
