//! Inference profile identifier grammar.
//!
//! A full identifier has the shape `{geography}.{provider}.{model-slug}-{date}-{version}`,
//! e.g. `global.anthropic.claude-sonnet-4-5-20250929-v1:0`. The friendly name
//! for that identifier is `anthropic.claude-sonnet-4-5`.
//!
//! Nothing in this module fails loudly: parsing returns `None` and conversion
//! returns its input unchanged when the grammar does not match.

use super::geography::Geography;

/// Components of a full identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentifier {
    pub geography: Geography,
    pub provider: String,
    pub model_slug: String,
}

impl ParsedIdentifier {
    /// `provider.model-slug`.
    pub fn friendly_name(&self) -> String {
        format!("{}.{}", self.provider, self.model_slug)
    }
}

/// Whether `s` starts with a known geography segment followed by a dot.
pub fn is_full_identifier(s: &str) -> bool {
    s.split_once('.')
        .is_some_and(|(head, _)| head.parse::<Geography>().is_ok())
}

fn is_slug_terminator(token: &str) -> bool {
    let is_date = token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit());
    is_date || token.starts_with('v') || token.contains(':')
}

/// Strip the date stamp and version tag from `model-slug-date-version`.
///
/// Returns an empty string when the very first token is already a terminator.
pub fn extract_model_slug(model_with_version: &str) -> String {
    model_with_version
        .split('-')
        .take_while(|token| !is_slug_terminator(token))
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse `id` assuming it is routed through `expected`.
pub fn parse_identifier(id: &str, expected: Geography) -> Option<ParsedIdentifier> {
    let rest = id.strip_prefix(expected.as_str())?.strip_prefix('.')?;
    let (provider, model_with_version) = rest.split_once('.')?;
    // A provider named like a geography would make the friendly name look full again.
    if provider.is_empty() || provider.parse::<Geography>().is_ok() {
        return None;
    }
    let model_slug = extract_model_slug(model_with_version);
    if model_slug.is_empty() {
        return None;
    }
    Some(ParsedIdentifier {
        geography: expected,
        provider: provider.to_string(),
        model_slug,
    })
}

/// Reduce a full identifier to its friendly name.
///
/// Friendly names and anything that does not parse come back unchanged, so
/// callers can apply this to any stored model value without branching.
pub fn to_friendly_name(identifier: &str) -> String {
    let Some(geography) = identifier
        .split_once('.')
        .and_then(|(head, _)| head.parse::<Geography>().ok())
    else {
        return identifier.to_string();
    };

    parse_identifier(identifier, geography)
        .map(|parsed| parsed.friendly_name())
        .unwrap_or_else(|| identifier.to_string())
}
