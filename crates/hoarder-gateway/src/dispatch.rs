//! Command dispatch: envelope in, envelope out.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::actions::{self, CreateParams, SearchParams};
use crate::error::{FieldError, GatewayError, GatewayResult};
use crate::upstream::BookmarkApi;

/// The uniform inbound request shape.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CommandEnvelope {
    /// `search_bookmarks` or `create_bookmark`.
    pub action: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(action: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            action: action.into(),
            parameters,
        }
    }

    /// Shape-check an arbitrary JSON body.
    ///
    /// An empty `action` is an invalid action; a missing or non-string
    /// `action`, or non-object `parameters`, is reported field by field.
    pub fn from_value(value: Value) -> GatewayResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(envelope_error(vec![FieldError::new(
                "body",
                "must be a JSON object",
            )]));
        };

        let mut errors = Vec::new();
        let action = match body.remove("action") {
            Some(Value::String(action)) => Some(action),
            None | Some(Value::Null) => {
                errors.push(FieldError::new("action", "field required"));
                None
            }
            Some(_) => {
                errors.push(FieldError::new("action", "must be a string"));
                None
            }
        };
        let parameters = match body.remove("parameters") {
            Some(Value::Object(parameters)) => parameters,
            None | Some(Value::Null) => Map::new(),
            Some(_) => {
                errors.push(FieldError::new("parameters", "must be a JSON object"));
                Map::new()
            }
        };

        match action {
            Some(action) if errors.is_empty() => {
                if action.trim().is_empty() {
                    return Err(GatewayError::InvalidAction(action));
                }
                Ok(Self { action, parameters })
            }
            action => Err(GatewayError::InvalidParameters {
                action: action.unwrap_or_default(),
                fields: errors,
            }),
        }
    }
}

fn envelope_error(fields: Vec<FieldError>) -> GatewayError {
    GatewayError::InvalidParameters {
        action: String::new(),
        fields,
    }
}

/// The uniform success shape.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResponseEnvelope {
    /// Always `success`.
    pub status: String,
    pub action: String,
    /// Present for `search_bookmarks` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_count: Option<usize>,
    #[schema(value_type = Object)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn success(action: Action, data: Value) -> Self {
        Self {
            status: "success".to_string(),
            action: action.as_str().to_string(),
            results_count: None,
            data,
        }
    }

    pub fn with_results_count(mut self, count: usize) -> Self {
        self.results_count = Some(count);
        self
    }
}

/// Supported actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SearchBookmarks,
    CreateBookmark,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::SearchBookmarks, Action::CreateBookmark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SearchBookmarks => "search_bookmarks",
            Action::CreateBookmark => "create_bookmark",
        }
    }

    pub fn parse(name: &str) -> GatewayResult<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| GatewayError::InvalidAction(name.to_string()))
    }
}

/// Stateless router from command envelopes to action handlers.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn BookmarkApi>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish()
    }
}

impl Dispatcher {
    pub fn new(api: Arc<dyn BookmarkApi>) -> Self {
        Self { api }
    }

    /// Validate, run and wrap one command.
    ///
    /// A panic anywhere below is reported as [`GatewayError::Internal`].
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> GatewayResult<ResponseEnvelope> {
        let action_name = envelope.action.clone();
        match AssertUnwindSafe(self.run(envelope)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(action = %action_name, "command handler panicked: {message}");
                Err(GatewayError::Internal(message))
            }
        }
    }

    async fn run(&self, envelope: CommandEnvelope) -> GatewayResult<ResponseEnvelope> {
        let action = Action::parse(&envelope.action).inspect_err(|_| {
            tracing::warn!(action = %envelope.action, "Invalid action received");
        })?;
        let invalid = |fields: Vec<FieldError>| GatewayError::InvalidParameters {
            action: action.as_str().to_string(),
            fields,
        };

        match action {
            Action::SearchBookmarks => {
                let params = SearchParams::parse(&envelope.parameters).map_err(invalid)?;
                let results = actions::search_bookmarks(self.api.as_ref(), &params.query).await?;
                let count = results.len();
                Ok(ResponseEnvelope::success(action, Value::Array(results))
                    .with_results_count(count))
            }
            Action::CreateBookmark => {
                let params = CreateParams::parse(&envelope.parameters).map_err(invalid)?;
                let created = actions::create_bookmark(
                    self.api.as_ref(),
                    &params.url,
                    params.title.as_deref(),
                    params.description.as_deref(),
                )
                .await?;
                Ok(ResponseEnvelope::success(action, created))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
