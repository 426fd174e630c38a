//! HTTP helpers shared by the catalog fetchers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{ClauderockError, Result};

/// Request timeout for catalog listings.
pub const CATALOG_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client for catalog requests.
pub fn catalog_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(CATALOG_REQUEST_TIMEOUT)
        .build()
        .map_err(ClauderockError::from)
}

/// Default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success status and its body to an error.
pub fn status_to_error(status: u16, body: &str) -> ClauderockError {
    match status {
        401 | 403 => ClauderockError::Authentication(extract_message(body)),
        _ => ClauderockError::api(status, extract_message(body)),
    }
}

// Bedrock and most model APIs wrap the reason in a JSON `message`.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_authentication() {
        assert!(matches!(
            status_to_error(403, r#"{"message":"The security token included in the request is expired"}"#),
            ClauderockError::Authentication(ref m) if m.contains("expired")
        ));
    }

    #[test]
    fn other_statuses_keep_the_body() {
        match status_to_error(404, "not here") {
            ClauderockError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not here");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nested_error_message_is_extracted() {
        let err = status_to_error(500, r#"{"error":{"message":"upstream down"}}"#);
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn bearer_header_is_set() {
        let headers = bearer_headers("sk-test");
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
    }
}
