//! Outbound calls to the Hoarder bookmarking API.

pub mod client;
pub mod message;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::GatewayResult;

pub use client::HoarderClient;

/// One call against the upstream API. `path` is relative to the configured
/// base URL and starts with `/`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// The surface the action handlers call through.
///
/// Implementations return the decoded JSON body on success and one of the
/// upstream error kinds otherwise. They never retry.
#[async_trait]
pub trait BookmarkApi: Send + Sync {
    async fn call(&self, request: UpstreamRequest) -> GatewayResult<Value>;
}
