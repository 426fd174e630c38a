//! Typed model providers and provider inference for bare model names.

use strum::{Display, EnumString};

/// Providers whose models are served through Bedrock inference profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKey {
    Anthropic,
    Meta,
    Amazon,
    Ai21,
    Cohere,
    Mistral,
}

/// Model-name prefixes and the provider that publishes them, checked in order.
const MODEL_PREFIXES: &[(&str, ProviderKey)] = &[
    ("claude", ProviderKey::Anthropic),
    ("llama", ProviderKey::Meta),
    ("titan", ProviderKey::Amazon),
    ("j2", ProviderKey::Ai21),
    ("command", ProviderKey::Cohere),
    ("mistral", ProviderKey::Mistral),
    ("jamba", ProviderKey::Ai21),
];

impl ProviderKey {
    /// Display name used in listings.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::Meta => "Meta",
            Self::Amazon => "Amazon",
            Self::Ai21 => "AI21",
            Self::Cohere => "Cohere",
            Self::Mistral => "Mistral",
        }
    }

    /// Guess the provider from a bare model name.
    ///
    /// Unknown prefixes fall back to Anthropic, the provider nearly every
    /// legacy config used.
    pub fn infer_from_model(model: &str) -> Self {
        MODEL_PREFIXES
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, provider)| *provider)
            .unwrap_or(Self::Anthropic)
    }
}

/// Prefix a bare model name with its provider (`claude-x` becomes `anthropic.claude-x`).
///
/// Empty values and names that already contain a dot are returned unchanged.
pub fn qualify_model_name(model: &str) -> String {
    if model.is_empty() || model.contains('.') {
        return model.to_string();
    }
    format!("{}.{model}", ProviderKey::infer_from_model(model))
}

/// Title-cased provider name for any provider token, known or not.
pub fn provider_display_name(provider: &str) -> String {
    match provider.parse::<ProviderKey>() {
        Ok(key) => key.display_name().to_string(),
        Err(_) => {
            let mut chars = provider.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Unknown".to_string(),
            }
        }
    }
}
