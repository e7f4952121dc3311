use serde::Serialize;
use utoipa::ToSchema;

/// A single offending field reported by parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Unified error type for the gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The upstream secret token is not configured.
    #[error("Hoarder API key/token is not configured on the server.")]
    Configuration,

    #[error(
        "Invalid action specified: '{0}'. Valid actions are 'search_bookmarks', 'create_bookmark'."
    )]
    InvalidAction(String),

    #[error("Invalid parameters: {}", describe_fields(.fields))]
    InvalidParameters {
        action: String,
        fields: Vec<FieldError>,
    },

    /// Upstream answered with a non-2xx status.
    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    /// No response was received from upstream (DNS, refused connection, timeout).
    #[error("Could not connect to Hoarder API: {0}")]
    UpstreamUnreachable(String),

    #[error("An unexpected server error occurred: {0}")]
    Unexpected(String),

    #[error("An internal error occurred while processing the request: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Configuration => "configuration",
            GatewayError::InvalidAction(_) => "invalid_action",
            GatewayError::InvalidParameters { .. } => "invalid_parameters",
            GatewayError::UpstreamStatus { .. } => "upstream_status",
            GatewayError::UpstreamUnreachable(_) => "upstream_unreachable",
            GatewayError::Unexpected(_) => "unexpected",
            GatewayError::Internal(_) => "internal",
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|field| format!("{}: {}", field.field, field.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;
