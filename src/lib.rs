//! clauderock: configure and launch Claude Code against AWS Bedrock
//! cross-region inference profiles or a directly configured HTTP API.
//!
//! The core is the inference profile engine: friendly model names such as
//! `anthropic.claude-sonnet-4-5` are matched against a freshly fetched
//! catalog of versioned identifiers like
//! `global.anthropic.claude-sonnet-4-5-20250929-v1:0`, stored profiles are
//! migrated across schema versions, and launches validate the configured
//! identifiers in the background while the assistant is already running.
//!
//! # Quick Start
//!
//! ```no_run
//! use clauderock::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> clauderock::error::Result<()> {
//! let resolver = ModelResolver::new(Arc::new(BedrockCatalogFetcher::new()?));
//! let id = resolver
//!     .resolve(
//!         &CatalogSource::new("default", "us-east-1"),
//!         Geography::Global,
//!         "anthropic.claude-sonnet-4-5",
//!     )
//!     .await?;
//! println!("{id}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod launcher;
pub mod migrations;
pub mod models;
pub mod prelude;
pub mod pricing;
pub mod usage;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
