//! Catalog of inference profile identifiers and matching against it.

use std::collections::{BTreeMap, BTreeSet};

use super::geography::Geography;
use super::profile_id::parse_identifier;
use crate::error::{ClauderockError, Result};

/// Identifiers returned by one catalog fetch, in the order the upstream listed them.
///
/// Matching is "first prefix wins", so that order is part of the contract
/// with the fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    identifiers: Vec<String>,
}

impl Catalog {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|id| id == identifier)
    }

    /// Find the first identifier starting with `{geography}.{friendly_model}`.
    ///
    /// The error carries every identifier in the catalog so the caller can
    /// print the complete list.
    pub fn find_match(&self, geography: Geography, friendly_model: &str) -> Result<&str> {
        let prefix = format!("{geography}.{friendly_model}");
        self.identifiers
            .iter()
            .find(|id| id.starts_with(&prefix))
            .map(String::as_str)
            .ok_or_else(|| ClauderockError::NoMatchingProfile {
                model: friendly_model.to_string(),
                geography: geography.to_string(),
                available: self.identifiers.clone(),
            })
    }

    /// Friendly names available in `geography`, bucketed by provider.
    ///
    /// Identifiers outside the geography or the grammar are skipped. Both
    /// levels are ordered, which gives the (provider, model-slug) display order.
    pub fn group_by_provider(&self, geography: Geography) -> BTreeMap<String, BTreeSet<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for parsed in self
            .identifiers
            .iter()
            .filter_map(|id| parse_identifier(id, geography))
        {
            let friendly = parsed.friendly_name();
            grouped.entry(parsed.provider).or_default().insert(friendly);
        }
        grouped
    }

    /// Identifiers from `wanted` that this catalog does not contain, deduplicated.
    pub fn missing(&self, wanted: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for id in wanted {
            if !self.contains(id) && !missing.contains(id) {
                missing.push(id.clone());
            }
        }
        missing
    }
}

impl FromIterator<String> for Catalog {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile_id::to_friendly_name;

    const SONNET: &str = "global.anthropic.claude-sonnet-4-5-20250929-v1:0";
    const HAIKU_US: &str = "us.anthropic.claude-haiku-4-5-20251001-v1:0";

    fn sample() -> Catalog {
        Catalog::new([SONNET, HAIKU_US])
    }

    #[test]
    fn finds_identifier_for_friendly_name() {
        let catalog = sample();
        assert_eq!(
            catalog
                .find_match(Geography::Global, "anthropic.claude-sonnet-4-5")
                .unwrap(),
            SONNET
        );
    }

    #[test]
    fn no_match_lists_all_identifiers() {
        let err = sample()
            .find_match(Geography::Global, "anthropic.claude-opus-4")
            .unwrap_err();
        match err {
            ClauderockError::NoMatchingProfile {
                model,
                geography,
                available,
            } => {
                assert_eq!(model, "anthropic.claude-opus-4");
                assert_eq!(geography, "global");
                assert_eq!(available, vec![SONNET.to_string(), HAIKU_US.to_string()]);
            }
            other => panic!("expected NoMatchingProfile, got {other:?}"),
        }
    }

    #[test]
    fn geography_is_part_of_the_prefix() {
        assert!(sample()
            .find_match(Geography::Us, "anthropic.claude-sonnet-4-5")
            .is_err());
        assert_eq!(
            sample()
                .find_match(Geography::Us, "anthropic.claude-haiku-4-5")
                .unwrap(),
            HAIKU_US
        );
    }

    #[test]
    fn first_listed_match_wins() {
        let older = "global.anthropic.claude-sonnet-4-5-20250101-v1:0";
        let catalog = Catalog::new([older, SONNET]);
        assert_eq!(
            catalog
                .find_match(Geography::Global, "anthropic.claude-sonnet-4-5")
                .unwrap(),
            older
        );
        let reversed = Catalog::new([SONNET, older]);
        assert_eq!(
            reversed
                .find_match(Geography::Global, "anthropic.claude-sonnet-4-5")
                .unwrap(),
            SONNET
        );
    }

    #[test]
    fn friendly_name_round_trips_through_match() {
        let ids = [
            SONNET,
            HAIKU_US,
            "eu.meta.llama3-2-90b-instruct-v1:0",
            "us.amazon.nova-pro-v1:0",
        ];
        for id in ids {
            let catalog = Catalog::new([id]);
            let geography: Geography = id.split('.').next().unwrap().parse().unwrap();
            assert_eq!(
                catalog.find_match(geography, &to_friendly_name(id)).unwrap(),
                id
            );
        }
    }

    #[test]
    fn groups_by_provider_within_geography() {
        let catalog = Catalog::new([
            "us.meta.llama3-2-90b-instruct-v1:0",
            "us.anthropic.claude-sonnet-4-5-20250929-v1:0",
            "us.anthropic.claude-haiku-4-5-20251001-v1:0",
            "us.anthropic.claude-haiku-4-5-20251101-v1:0",
            "eu.anthropic.claude-opus-4-1-20250805-v1:0",
            "us.broken",
            "arn:aws:bedrock:us-east-1::foundation-model/x",
        ]);
        let grouped = catalog.group_by_provider(Geography::Us);

        let providers: Vec<&String> = grouped.keys().collect();
        assert_eq!(providers, ["anthropic", "meta"]);
        let anthropic: Vec<&String> = grouped["anthropic"].iter().collect();
        assert_eq!(
            anthropic,
            ["anthropic.claude-haiku-4-5", "anthropic.claude-sonnet-4-5"]
        );
        assert_eq!(
            grouped["meta"].iter().next().unwrap(),
            "meta.llama3-2-90b-instruct"
        );
    }

    #[test]
    fn missing_reports_each_absent_identifier_once() {
        let catalog = sample();
        let wanted = vec![
            SONNET.to_string(),
            "global.anthropic.claude-opus-4-1-v1:0".to_string(),
            "global.anthropic.claude-opus-4-1-v1:0".to_string(),
        ];
        assert_eq!(
            catalog.missing(&wanted),
            vec!["global.anthropic.claude-opus-4-1-v1:0".to_string()]
        );
    }
}
