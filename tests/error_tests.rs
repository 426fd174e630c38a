//! Tests for the error system.

use clauderock::error::*;

#[test]
fn error_api_creation() {
    let err = ClauderockError::api(404, "Not found");
    assert!(matches!(&err, ClauderockError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn category_and_exit_code_mappings_are_stable() {
    struct Case {
        error: ClauderockError,
        expected_category: ErrorCategory,
        expected_exit: i32,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: ClauderockError::Configuration("bad-config".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_exit: EXIT_CONFIG,
        },
        Case {
            error: ClauderockError::InvalidArgument("--clauderock-region".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_exit: EXIT_CONFIG,
        },
        Case {
            error: ClauderockError::NoMatchingProfile {
                model: "anthropic.claude-opus-9".to_string(),
                geography: "eu".to_string(),
                available: Vec::new(),
            },
            expected_category: ErrorCategory::Validation,
            expected_exit: EXIT_CONFIG,
        },
        Case {
            error: ClauderockError::CatalogUnavailable("no credentials".to_string()),
            expected_category: ErrorCategory::Catalog,
            expected_exit: EXIT_UNAVAILABLE,
        },
        Case {
            error: ClauderockError::Network(network_error),
            expected_category: ErrorCategory::Network,
            expected_exit: EXIT_UNAVAILABLE,
        },
        Case {
            error: ClauderockError::Timeout(15_000),
            expected_category: ErrorCategory::Timeout,
            expected_exit: EXIT_UNAVAILABLE,
        },
        Case {
            error: ClauderockError::api(403, "Forbidden"),
            expected_category: ErrorCategory::Authentication,
            expected_exit: 1,
        },
        Case {
            error: ClauderockError::api(500, "boom"),
            expected_category: ErrorCategory::Api,
            expected_exit: 1,
        },
        Case {
            error: ClauderockError::Serialization(serde_error),
            expected_category: ErrorCategory::Unknown,
            expected_exit: 1,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(case.error.exit_code(), case.expected_exit, "{}", case.error);
    }
}

#[test]
fn catalog_failures_keep_their_cause() {
    let err = ClauderockError::catalog_unavailable("ExpiredToken: the security token has expired");
    assert!(err.to_string().contains("ExpiredToken"));
    assert!(!err.is_endpoint_missing());
}
