//! Per-action parameter schemas and the handlers that turn validated
//! parameters into upstream calls.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::{FieldError, GatewayResult};
use crate::upstream::{BookmarkApi, UpstreamRequest};

pub const SEARCH_PATH: &str = "/bookmarks/search";
pub const BOOKMARKS_PATH: &str = "/bookmarks";

/// Validated parameters for `search_bookmarks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
}

impl SearchParams {
    pub fn parse(parameters: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let query = required_string(parameters, "query", &mut errors);
        match query {
            Some(query) if errors.is_empty() => Ok(Self { query }),
            _ => Err(errors),
        }
    }
}

/// Validated parameters for `create_bookmark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CreateParams {
    /// Collects every offending field rather than stopping at the first.
    pub fn parse(parameters: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let url = required_string(parameters, "url", &mut errors).and_then(|raw| {
            match validate_absolute_url(&raw) {
                Ok(url) => Some(url),
                Err(message) => {
                    errors.push(FieldError::new("url", message));
                    None
                }
            }
        });
        let title = optional_string(parameters, "title", &mut errors);
        let description = optional_string(parameters, "description", &mut errors);

        match url {
            Some(url) if errors.is_empty() => Ok(Self {
                url,
                title,
                description,
            }),
            _ => Err(errors),
        }
    }
}

fn required_string(
    parameters: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match parameters.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(Value::String(text)) if text.is_empty() => {
            errors.push(FieldError::new(field, "must not be empty"));
            None
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a string"));
            None
        }
    }
}

fn optional_string(
    parameters: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match parameters.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a string"));
            None
        }
    }
}

/// Returns the trimmed URL that was checked, which is what gets forwarded.
fn validate_absolute_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| format!("invalid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "URL scheme must be http or https, got '{}'",
            parsed.scheme()
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("URL must include a host".to_string());
    }
    Ok(trimmed.to_string())
}

/// Search bookmarks. A non-list upstream answer counts as no results.
pub async fn search_bookmarks(api: &dyn BookmarkApi, query: &str) -> GatewayResult<Vec<Value>> {
    let results = api
        .call(UpstreamRequest::get(SEARCH_PATH).with_query("q", query))
        .await?;
    match results {
        Value::Array(items) => Ok(items),
        other => {
            tracing::warn!(
                kind = json_kind(&other),
                "Hoarder search API did not return a list"
            );
            Ok(Vec::new())
        }
    }
}

/// Create a bookmark and return the upstream representation unchanged.
pub async fn create_bookmark(
    api: &dyn BookmarkApi,
    url: &str,
    title: Option<&str>,
    description: Option<&str>,
) -> GatewayResult<Value> {
    let payload = bookmark_payload(url, title, description);
    api.call(UpstreamRequest::post(BOOKMARKS_PATH).with_json(payload))
        .await
}

/// `{url}` plus `title`/`description` only when they are non-empty.
pub fn bookmark_payload(url: &str, title: Option<&str>, description: Option<&str>) -> Value {
    let mut payload = Map::new();
    payload.insert("url".to_string(), Value::String(url.to_string()));
    for (key, value) in [("title", title), ("description", description)] {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            payload.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(payload)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::GatewayError;
    use crate::test_support::FakeApi;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn search_params_require_non_empty_query() {
        assert_eq!(
            SearchParams::parse(&params(json!({ "query": "rust" }))),
            Ok(SearchParams {
                query: "rust".to_string()
            })
        );
        assert_eq!(
            SearchParams::parse(&params(json!({}))),
            Err(vec![FieldError::new("query", "field required")])
        );
        assert_eq!(
            SearchParams::parse(&params(json!({ "query": "" }))),
            Err(vec![FieldError::new("query", "must not be empty")])
        );
        assert_eq!(
            SearchParams::parse(&params(json!({ "query": "  " }))),
            Ok(SearchParams {
                query: "  ".to_string()
            })
        );
        assert_eq!(
            SearchParams::parse(&params(json!({ "query": 7 }))),
            Err(vec![FieldError::new("query", "must be a string")])
        );
    }

    #[test]
    fn create_params_accept_optional_fields() {
        let parsed = CreateParams::parse(&params(json!({
            "url": "https://example.com",
            "title": "Ex",
            "description": null,
            "ignored": true
        })))
        .expect("valid");
        assert_eq!(parsed.url, "https://example.com");
        assert_eq!(parsed.title.as_deref(), Some("Ex"));
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn create_params_reject_relative_and_non_http_urls() {
        for url in ["not-a-url", "/relative/path", "ftp://example.com/file", "mailto:a@b.c"] {
            let errors = CreateParams::parse(&params(json!({ "url": url }))).unwrap_err();
            assert_eq!(errors.len(), 1, "url {url}");
            assert_eq!(errors[0].field, "url");
        }
    }

    #[tokio::test]
    async fn create_forwards_the_trimmed_url_it_validated() {
        let parsed = CreateParams::parse(&params(json!({ "url": "  https://example.com  " })))
            .expect("valid");
        assert_eq!(parsed.url, "https://example.com");

        let api = FakeApi::returning(Ok(json!({ "id": "1" })));
        create_bookmark(api.as_ref(), &parsed.url, None, None)
            .await
            .expect("create");
        let body = api.last_request().and_then(|r| r.body).expect("body");
        assert_eq!(body, json!({ "url": "https://example.com" }));
    }

    #[test]
    fn create_params_report_every_bad_field() {
        let errors =
            CreateParams::parse(&params(json!({ "title": 1, "description": ["x"] }))).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["url", "title", "description"]);
    }

    #[test]
    fn payload_omits_empty_optional_fields() {
        assert_eq!(
            bookmark_payload("https://a.io", None, None),
            json!({ "url": "https://a.io" })
        );
        assert_eq!(
            bookmark_payload("https://a.io", Some(""), Some("desc")),
            json!({ "url": "https://a.io", "description": "desc" })
        );
        assert_eq!(
            bookmark_payload("https://a.io", Some("T"), Some("D")),
            json!({ "url": "https://a.io", "title": "T", "description": "D" })
        );
    }

    #[tokio::test]
    async fn search_issues_get_with_query_param() {
        let api = FakeApi::returning(Ok(json!([{ "id": "1" }, { "id": "2" }])));
        let results = search_bookmarks(api.as_ref(), "rust").await.expect("search");
        assert_eq!(results.len(), 2);

        let request = api.last_request().expect("request");
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.path, "/bookmarks/search");
        assert_eq!(request.query, vec![("q".to_string(), "rust".to_string())]);
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn search_treats_non_list_as_empty() {
        for body in [json!({ "bookmarks": [] }), Value::Null, json!("text")] {
            let api = FakeApi::returning(Ok(body));
            let results = search_bookmarks(api.as_ref(), "rust").await.expect("search");
            assert!(results.is_empty());
        }
    }

    #[tokio::test]
    async fn create_posts_payload_and_returns_upstream_value() {
        let created = json!({ "id": "9", "url": "https://example.com", "title": "Ex" });
        let api = FakeApi::returning(Ok(created.clone()));
        let value = create_bookmark(api.as_ref(), "https://example.com", Some("Ex"), Some(""))
            .await
            .expect("create");
        assert_eq!(value, created);

        let request = api.last_request().expect("request");
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.path, "/bookmarks");
        assert_eq!(
            request.body,
            Some(json!({ "url": "https://example.com", "title": "Ex" }))
        );
    }

    #[tokio::test]
    async fn handler_errors_propagate_unchanged() {
        let api = FakeApi::returning(Err(GatewayError::UpstreamUnreachable("timed out".into())));
        let error = search_bookmarks(api.as_ref(), "rust").await.unwrap_err();
        assert!(matches!(error, GatewayError::UpstreamUnreachable(_)));
        assert_eq!(api.calls(), 1);
    }
}
