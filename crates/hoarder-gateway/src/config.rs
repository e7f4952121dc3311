//! Gateway configuration.
//!
//! Values are read once at startup and passed down explicitly; nothing in the
//! request path touches the process environment.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://hoarder.karakeep.app/api/v1";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// How the secret token is attached to upstream requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "scheme", content = "header")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `<header>: <token>`
    ApiKeyHeader(String),
}

impl Default for AuthScheme {
    fn default() -> Self {
        AuthScheme::Bearer
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream API root, without a trailing slash.
    pub base_url: String,
    pub api_token: Option<String>,
    pub auth_scheme: AuthScheme,
    pub host: String,
    pub port: u16,
    pub upstream_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            auth_scheme: AuthScheme::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();

        let base_url = get("HOARDER_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let auth_scheme = match get("HOARDER_AUTH_SCHEME").as_deref() {
            None | Some("bearer") => AuthScheme::Bearer,
            Some("api-key") | Some("api_key") => AuthScheme::ApiKeyHeader(
                get("HOARDER_API_KEY_HEADER")
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            ),
            Some(other) => {
                return Err(format!(
                    "invalid HOARDER_AUTH_SCHEME '{other}': expected 'bearer' or 'api-key'"
                ))
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|error| format!("invalid PORT '{raw}': {error}"))?,
            None => defaults.port,
        };

        let upstream_timeout = match get("HOARDER_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err("invalid HOARDER_TIMEOUT_SECS '0': must be at least 1".into()),
                Ok(secs) => Duration::from_secs(secs),
                Err(error) => {
                    return Err(format!("invalid HOARDER_TIMEOUT_SECS '{raw}': {error}"))
                }
            },
            None => defaults.upstream_timeout,
        };

        Ok(Self {
            base_url,
            api_token: get("HOARDER_API_KEY"),
            auth_scheme,
            host: get("HOST").unwrap_or(defaults.host),
            port,
            upstream_timeout,
        })
    }

    pub fn has_api_token(&self) -> bool {
        self.api_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|error| format!("invalid listen address {}:{}: {error}", self.host, self.port))
    }

    /// Create a redacted copy safe for logs.
    pub fn redacted(&self) -> RedactedGatewayConfig {
        RedactedGatewayConfig {
            base_url: self.base_url.clone(),
            has_api_key: self.has_api_token(),
            api_key_preview: self.api_token.as_deref().map(mask_secret),
            auth_scheme: self.auth_scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            upstream_timeout_secs: self.upstream_timeout.as_secs(),
        }
    }
}

/// Gateway configuration with the secret replaced by a masked preview.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedGatewayConfig {
    pub base_url: String,
    pub has_api_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_preview: Option<String>,
    pub auth_scheme: AuthScheme,
    pub host: String,
    pub port: u16,
    pub upstream_timeout_secs: u64,
}

/// Keep only a short prefix and suffix of a secret. Short secrets are hidden
/// entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
