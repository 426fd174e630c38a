//! Bedrock inference-profile catalog.
//!
//! Lists `SYSTEM_DEFINED` inference profiles through the Bedrock control
//! plane, signing each page with SigV4 using credentials from the AWS
//! shared-config profile named by the [`CatalogSource`].

use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4::SigningParams;
use aws_smithy_runtime_api::client::identity::Identity;
use serde::Deserialize;

use super::http::{catalog_client, status_to_error};
use super::{CatalogFetcher, CatalogSource};
use crate::error::{ClauderockError, Result};
use crate::models::catalog::Catalog;

const SERVICE: &str = "bedrock";
const PAGE_SIZE: &str = "1000";
// Guards against an upstream that keeps handing back tokens.
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListInferenceProfilesResponse {
    #[serde(default)]
    inference_profile_summaries: Vec<InferenceProfileSummary>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InferenceProfileSummary {
    inference_profile_id: Option<String>,
}

/// Fetches inference profile identifiers from Amazon Bedrock.
#[derive(Debug, Clone)]
pub struct BedrockCatalogFetcher {
    http: reqwest::Client,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
}

impl BedrockCatalogFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: catalog_client()?,
            endpoint: None,
            credentials: None,
        })
    }

    /// Send requests to `endpoint` instead of `https://bedrock.{region}.amazonaws.com`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    /// Sign with fixed credentials instead of loading the AWS profile.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn endpoint_for(&self, region: &str) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock.{region}.amazonaws.com"))
    }

    async fn load_credentials(&self, source: &CatalogSource) -> Result<Credentials> {
        if let Some(creds) = &self.credentials {
            return Ok(creds.clone());
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(source.region.clone()));
        if !source.aws_profile.is_empty() {
            loader = loader.profile_name(&source.aws_profile);
        }
        let config = loader.load().await;

        let provider = config.credentials_provider().ok_or_else(|| {
            ClauderockError::Authentication(format!(
                "no AWS credentials configured for profile '{}'",
                source.aws_profile
            ))
        })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| ClauderockError::Authentication(format!("failed to load AWS config: {e}")))
    }

    fn sign(&self, creds: &Credentials, url: &str, region: &str) -> Result<Vec<(String, String)>> {
        let identity = Identity::new(creds.clone(), creds.expiry());
        let signing_params = SigningParams::builder()
            .identity(&identity)
            .region(region)
            .name(SERVICE)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| ClauderockError::Authentication(e.to_string()))?;

        let signable_request = SignableRequest::new(
            "GET",
            url,
            std::iter::empty::<(&str, &str)>(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|e| ClauderockError::Authentication(e.to_string()))?;

        let (instructions, _) = sign(signable_request, &signing_params.into())
            .map_err(|e| ClauderockError::Authentication(e.to_string()))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    fn page_url(&self, region: &str, next_token: Option<&str>) -> Result<reqwest::Url> {
        let base = format!("{}/inference-profiles", self.endpoint_for(region));
        let mut url = reqwest::Url::parse(&base)
            .map_err(|e| ClauderockError::Configuration(format!("invalid Bedrock endpoint {base}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", PAGE_SIZE);
            if let Some(token) = next_token {
                query.append_pair("nextToken", token);
            }
            query.append_pair("typeEquals", "SYSTEM_DEFINED");
        }
        Ok(url)
    }
}

#[async_trait]
impl CatalogFetcher for BedrockCatalogFetcher {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn fetch(&self, source: &CatalogSource) -> Result<Catalog> {
        let creds = self.load_credentials(source).await?;
        let mut identifiers = Vec::new();
        let mut next_token: Option<String> = None;

        for page in 0..MAX_PAGES {
            let url = self.page_url(&source.region, next_token.as_deref())?;
            let headers = self.sign(&creds, url.as_str(), &source.region)?;

            let mut request = self.http.get(url);
            for (name, value) in headers {
                request = request.header(name, value);
            }
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(status.as_u16(), &body));
            }

            let parsed: ListInferenceProfilesResponse = response.json().await?;
            identifiers.extend(
                parsed
                    .inference_profile_summaries
                    .into_iter()
                    .filter_map(|summary| summary.inference_profile_id),
            );
            tracing::debug!(page, total = identifiers.len(), "fetched inference profile page");

            match parsed.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => return Ok(Catalog::new(identifiers)),
            }
        }

        tracing::warn!(pages = MAX_PAGES, "inference profile listing truncated");
        Ok(Catalog::new(identifiers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_uses_region() {
        let fetcher = BedrockCatalogFetcher::new().unwrap();
        assert_eq!(
            fetcher.endpoint_for("eu-west-1"),
            "https://bedrock.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn page_url_encodes_next_token() {
        let fetcher = BedrockCatalogFetcher::new()
            .unwrap()
            .with_endpoint("http://localhost:9000/");
        let url = fetcher.page_url("us-east-1", Some("a+b/c=")).unwrap();
        assert_eq!(url.path(), "/inference-profiles");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("nextToken".into(), "a+b/c=".into())));
        assert!(pairs.contains(&("typeEquals".into(), "SYSTEM_DEFINED".into())));
    }

    #[test]
    fn signing_produces_authorization_header() {
        let fetcher = BedrockCatalogFetcher::new().unwrap();
        let creds = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let headers = fetcher
            .sign(
                &creds,
                "https://bedrock.us-east-1.amazonaws.com/inference-profiles?typeEquals=SYSTEM_DEFINED",
                "us-east-1",
            )
            .unwrap();
        let auth = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.clone())
            .unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(auth.contains("/us-east-1/bedrock/aws4_request"));
    }
}
