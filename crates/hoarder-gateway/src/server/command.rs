//! The single command endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::dispatch::{CommandEnvelope, ResponseEnvelope};
use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;

/// POST /mcp
///
/// Validates the `{ action, parameters }` envelope, runs the action against
/// Hoarder and returns the `{ status, action, data }` envelope.
#[utoipa::path(
    post,
    path = "/mcp",
    tag = "mcp",
    request_body = CommandEnvelope,
    responses(
        (status = 200, body = ResponseEnvelope),
        (
            status = 400,
            description = "Unknown action or invalid parameters",
            body = ApiErrorResponse
        ),
        (
            status = 500,
            description = "Missing configuration or internal fault",
            body = ApiErrorResponse
        ),
        (status = 502, description = "Hoarder rejected the call", body = ApiErrorResponse),
        (status = 504, description = "Hoarder could not be reached", body = ApiErrorResponse),
    )
)]
#[tracing::instrument(
    skip_all,
    fields(request_id = %uuid::Uuid::new_v4(), action = tracing::field::Empty)
)]
pub(crate) async fn handle_command(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let envelope = CommandEnvelope::from_value(body)?;

    tracing::Span::current().record("action", envelope.action.as_str());
    tracing::info!(
        parameters = ?envelope.parameters.keys().collect::<Vec<_>>(),
        "Received MCP request"
    );

    match state.dispatcher.dispatch(envelope).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => {
            tracing::warn!(code = error.code(), "MCP request failed: {error}");
            Err(ApiError::from(error))
        }
    }
}
