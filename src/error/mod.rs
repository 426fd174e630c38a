//! Error types for clauderock.

use thiserror::Error;

/// Exit code for configuration, migration and validation failures (`EX_CONFIG`).
pub const EXIT_CONFIG: i32 = 78;
/// Exit code when a catalog or remote endpoint could not be reached (`EX_UNAVAILABLE`).
pub const EXIT_UNAVAILABLE: i32 = 69;

/// Primary error type for all clauderock operations.
#[derive(Error, Debug)]
pub enum ClauderockError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "could not find inference profile for model '{model}' with cross-region '{geography}'\nAvailable profiles:\n{}",
        format_available(.available)
    )]
    NoMatchingProfile {
        model: String,
        geography: String,
        available: Vec<String>,
    },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("failed to migrate profile from {from} to {to}: {source}\nPlease run: clauderock manage config")]
    Migration {
        from: String,
        to: String,
        source: Box<ClauderockError>,
    },

    #[error("Invalid model configuration: {} not available\n{hint}", join_ids(.invalid))]
    Validation { invalid: Vec<String>, hint: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Launch error: {0}")]
    Launch(String),
}

/// Broad error category used for exit codes and recovery hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Catalog,
    Validation,
    Authentication,
    Network,
    Timeout,
    Api,
    Launch,
    Unknown,
}

fn join_ids(ids: &[String]) -> String {
    ids.join(", ")
}

fn format_available(available: &[String]) -> String {
    available
        .iter()
        .map(|id| format!("  - {id}\n"))
        .collect()
}

impl ClauderockError {
    /// Create an API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a validation failure naming the unavailable identifiers.
    pub fn validation(invalid: Vec<String>) -> Self {
        Self::Validation {
            invalid,
            hint: "Run 'clauderock manage models list' to see available models, then 'clauderock manage config' to update this profile".to_string(),
        }
    }

    /// Wrap any catalog-fetch failure so it is never mistaken for "no match".
    pub fn catalog_unavailable(err: impl std::fmt::Display) -> Self {
        Self::CatalogUnavailable(err.to_string())
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidArgument(_) => ErrorCategory::Configuration,
            // An upgrade that could not reach the catalog is an availability problem.
            Self::Migration { source, .. } => match source.category() {
                category @ (ErrorCategory::Catalog
                | ErrorCategory::Network
                | ErrorCategory::Timeout) => category,
                _ => ErrorCategory::Configuration,
            },
            Self::NoMatchingProfile { .. } | Self::Validation { .. } => ErrorCategory::Validation,
            Self::CatalogUnavailable(_) => ErrorCategory::Catalog,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Api,
            },
            Self::Launch(_) => ErrorCategory::Launch,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Unknown,
        }
    }

    /// Host exit code for an internal failure.
    ///
    /// Child-process exit codes never pass through here; they are forwarded
    /// unchanged by the launcher.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Validation => EXIT_CONFIG,
            ErrorCategory::Catalog | ErrorCategory::Network | ErrorCategory::Timeout => {
                EXIT_UNAVAILABLE
            }
            _ => 1,
        }
    }

    /// Whether this error means the remote endpoint does not exist at all.
    pub fn is_endpoint_missing(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ClauderockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_profile_lists_every_identifier() {
        let err = ClauderockError::NoMatchingProfile {
            model: "anthropic.claude-opus-4".into(),
            geography: "global".into(),
            available: vec![
                "global.anthropic.claude-sonnet-4-5-20250929-v1:0".into(),
                "us.anthropic.claude-haiku-4-5-20251001-v1:0".into(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("'anthropic.claude-opus-4'"));
        assert!(text.contains("cross-region 'global'"));
        assert!(text.contains("  - global.anthropic.claude-sonnet-4-5-20250929-v1:0\n"));
        assert!(text.contains("  - us.anthropic.claude-haiku-4-5-20251001-v1:0\n"));
    }

    #[test]
    fn exit_codes_separate_config_from_availability() {
        assert_eq!(ClauderockError::validation(vec!["x".into()]).exit_code(), EXIT_CONFIG);
        assert_eq!(
            ClauderockError::Migration {
                from: "0.3.0".into(),
                to: "0.4.0".into(),
                source: Box::new(ClauderockError::NoMatchingProfile {
                    model: "anthropic.claude-opus-9".into(),
                    geography: "us".into(),
                    available: Vec::new(),
                }),
            }
            .exit_code(),
            EXIT_CONFIG
        );
        assert_eq!(
            ClauderockError::Migration {
                from: "0.3.0".into(),
                to: "0.4.0".into(),
                source: Box::new(ClauderockError::CatalogUnavailable("expired token".into())),
            }
            .exit_code(),
            EXIT_UNAVAILABLE
        );
        assert_eq!(
            ClauderockError::CatalogUnavailable("offline".into()).exit_code(),
            EXIT_UNAVAILABLE
        );
        assert_eq!(ClauderockError::Timeout(10).exit_code(), EXIT_UNAVAILABLE);
        assert_eq!(ClauderockError::Launch("no binary".into()).exit_code(), 1);
    }

    #[test]
    fn only_404_counts_as_missing_endpoint() {
        assert!(ClauderockError::api(404, "nope").is_endpoint_missing());
        assert!(!ClauderockError::api(500, "nope").is_endpoint_missing());
        assert_eq!(
            ClauderockError::api(401, "bad key").category(),
            ErrorCategory::Authentication
        );
    }

    #[test]
    fn validation_message_points_at_listing_command() {
        let err = ClauderockError::validation(vec!["a".into(), "b".into()]);
        let text = err.to_string();
        assert!(text.contains("a, b not available"));
        assert!(text.contains("clauderock manage models list"));
    }
}
