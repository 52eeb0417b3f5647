use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ProviderUsage, TranslationProvider};
use crate::app_config::DeepLConfig;
use crate::errors::ProviderError;

/// Default endpoint for free DeepL accounts
pub const DEFAULT_ENDPOINT: &str = "https://api-free.deepl.com";

/// DeepL client for interacting with the DeepL REST API
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for making requests
    client: Client,
    /// Authentication key
    api_key: String,
    /// Base URL without the `/v2` path
    endpoint: String,
    /// Per-request timeout
    timeout: Duration,
}

/// Translate response from the DeepL API
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Usage response from the DeepL API
#[derive(Debug, Deserialize)]
struct UsageResponse {
    character_count: u64,
    character_limit: u64,
}

impl DeepL {
    /// Create a new DeepL client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;
        let endpoint = endpoint.into();
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
            timeout,
        })
    }

    /// Create a client from the provider section of the configuration
    pub fn from_config(config: &DeepLConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn api_url(&self, path: &str) -> Result<Url, ProviderError> {
        Url::parse(&format!("{}/v2/{}", self.endpoint, path))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid DeepL endpoint {}: {}", self.endpoint, e)))
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Turn a non-success response into the matching provider error
    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("DeepL API error ({}): {}", status, message);
        map_status(status, message)
    }
}

/// Map an HTTP status from DeepL to a provider error
fn map_status(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimitExceeded(message),
        456 => ProviderError::QuotaExceeded(message),
        401 | 403 => ProviderError::AuthenticationError(message),
        status_code => ProviderError::ApiError { status_code, message },
    }
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

#[async_trait]
impl TranslationProvider for DeepL {
    async fn translate(&self, text: &str, source_code: &str, target_code: &str) -> Result<String, ProviderError> {
        let url = self.api_url("translate")?;
        debug!("DeepL translate {} -> {} ({} chars)", source_code, target_code, text.chars().count());

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .form(&[("text", text), ("source_lang", source_code), ("target_lang", target_code)])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response
            .json::<TranslateResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::ParseError("DeepL returned no translations".to_string()))
    }

    async fn usage(&self) -> Result<ProviderUsage, ProviderError> {
        let url = self.api_url("usage")?;

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let usage = response
            .json::<UsageResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(ProviderUsage {
            character_count: usage.character_count,
            character_limit: usage.character_limit,
        })
    }
}
