use std::error::Error as _;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::config::{mask_secret, AuthScheme, GatewayConfig};
use crate::error::{GatewayError, GatewayResult};

use super::message::compose_status_message;
use super::{BookmarkApi, UpstreamRequest};

/// reqwest-backed client for the Hoarder REST API.
#[derive(Debug, Clone)]
pub struct HoarderClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    auth_scheme: AuthScheme,
}

impl HoarderClient {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| GatewayError::Unexpected(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone().filter(|token| !token.is_empty()),
            auth_scheme: config.auth_scheme.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, token: &str, has_body: bool) -> GatewayResult<HeaderMap> {
        let (name, raw) = match &self.auth_scheme {
            AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {token}")),
            AuthScheme::ApiKeyHeader(header) => (
                HeaderName::from_bytes(header.as_bytes()).map_err(|e| {
                    GatewayError::Unexpected(format!("invalid API key header name '{header}': {e}"))
                })?,
                token.to_string(),
            ),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            GatewayError::Unexpected("configured API token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Header listing for diagnostics with the credential masked.
    fn masked_headers(&self, token: &str, has_body: bool) -> Vec<(String, String)> {
        let auth = match &self.auth_scheme {
            AuthScheme::Bearer => (
                AUTHORIZATION.as_str().to_string(),
                format!("Bearer {}", mask_secret(token)),
            ),
            AuthScheme::ApiKeyHeader(header) => (header.clone(), mask_secret(token)),
        };
        let mut headers = vec![auth, (ACCEPT.as_str().to_string(), "application/json".to_string())];
        if has_body {
            headers.push((CONTENT_TYPE.as_str().to_string(), "application/json".to_string()));
        }
        headers
    }
}

#[async_trait]
impl BookmarkApi for HoarderClient {
    async fn call(&self, request: UpstreamRequest) -> GatewayResult<Value> {
        let Some(token) = self.token.as_deref() else {
            tracing::error!("HOARDER_API_KEY is not configured; refusing upstream call");
            return Err(GatewayError::Configuration);
        };

        let url = self.endpoint(&request.path);
        let has_body = request.body.is_some();
        let headers = self.headers(token, has_body)?;
        tracing::debug!(headers = ?self.masked_headers(token, has_body), "Hoarder request headers");
        tracing::info!(method = %request.method, url = %url, "Calling Hoarder API");

        let mut builder = self.http.request(request.method.clone(), &url).headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            let cause = error_chain(&error);
            if error.is_builder() || error.is_redirect() {
                tracing::error!(url = %url, "Unexpected error during Hoarder API call: {cause}");
                GatewayError::Unexpected(cause)
            } else {
                tracing::error!(url = %url, "HTTP request error contacting Hoarder API: {cause}");
                GatewayError::UpstreamUnreachable(cause)
            }
        })?;

        let status = response.status();
        tracing::info!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            "Hoarder API response"
        );

        let text = response.text().await.map_err(|error| {
            let cause = error_chain(&error);
            if error.is_timeout() {
                GatewayError::UpstreamUnreachable(cause)
            } else {
                GatewayError::Unexpected(format!("failed to read Hoarder response: {cause}"))
            }
        })?;

        if !status.is_success() {
            let message = compose_status_message(status.as_u16(), &text);
            tracing::error!(status = status.as_u16(), body = %text, "Hoarder API error");
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Hoarder API returned a body that is not JSON: {e}");
            GatewayError::Unexpected(format!("invalid JSON from Hoarder API: {e}"))
        })
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
