//! Cross-region routing geographies.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Routing geography prefix of a Bedrock inference profile identifier.
///
/// The set is closed: an identifier is "full" exactly when its first
/// dot-segment parses as one of these.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Geography {
    Us,
    Eu,
    Global,
}

impl Geography {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Parse a user-supplied geography, naming the valid choices on failure.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        raw.parse().map_err(|_| {
            crate::error::ClauderockError::InvalidArgument(format!(
                "invalid cross-region: {raw} (must be one of: us, eu, global)"
            ))
        })
    }
}
