//! Environment handed to the coding assistant.

use crate::catalog::normalize_base_url;
use crate::config::profile::{ProfileConfig, ProfileKind};
use crate::error::{ClauderockError, Result};

const BEDROCK_VARS: &[&str] = &["CLAUDE_CODE_USE_BEDROCK", "AWS_PROFILE", "AWS_REGION"];
const API_VARS: &[&str] = &["ANTHROPIC_BASE_URL", "ANTHROPIC_AUTH_TOKEN", "ANTHROPIC_API_KEY"];

/// Variables to set and inherited variables to clear.
///
/// The Bedrock and API variable sets are mutually exclusive: whichever set
/// the profile does not use is removed from the inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnv {
    pub set: Vec<(String, String)>,
    pub remove: Vec<String>,
}

impl LaunchEnv {
    fn put(&mut self, name: &str, value: impl Into<String>) {
        self.set.push((name.to_string(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.set
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Build the child's environment for `config`.
///
/// `api_key` is required for API profiles and ignored for Bedrock ones.
pub fn launch_env(config: &ProfileConfig, api_key: Option<&str>) -> Result<LaunchEnv> {
    let mut env = LaunchEnv::default();
    match config.kind()? {
        ProfileKind::Bedrock(target) => {
            env.put("CLAUDE_CODE_USE_BEDROCK", "1");
            env.put("AWS_PROFILE", target.aws_profile);
            env.put("AWS_REGION", target.region);
            env.remove.extend(API_VARS.iter().map(|v| v.to_string()));
        }
        ProfileKind::Api(target) => {
            let key = api_key.ok_or_else(|| {
                ClauderockError::Authentication("no API key available for this profile".into())
            })?;
            env.put("ANTHROPIC_BASE_URL", normalize_base_url(&target.base_url));
            env.put("ANTHROPIC_AUTH_TOKEN", key);
            env.remove.extend(BEDROCK_VARS.iter().map(|v| v.to_string()));
            env.remove.push("ANTHROPIC_API_KEY".to_string());
        }
    }

    env.put("ANTHROPIC_MODEL", config.model.as_str());
    env.put("ANTHROPIC_DEFAULT_SONNET_MODEL", config.model.as_str());
    env.put("ANTHROPIC_SMALL_FAST_MODEL", config.fast_model.as_str());
    env.put("ANTHROPIC_DEFAULT_HAIKU_MODEL", config.fast_model.as_str());
    env.put("ANTHROPIC_DEFAULT_OPUS_MODEL", config.heavy_model.as_str());
    Ok(env)
}
