use axum::Json;
use utoipa::OpenApi;

use crate::dispatch::{CommandEnvelope, ResponseEnvelope};
use crate::error::FieldError;
use crate::server::error::{ApiErrorBody, ApiErrorResponse};
use crate::server::system::StatusResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hoarder MCP Server",
        version = "1.0.0",
        description = "An MCP server to interact with the Hoarder bookmarking service API."
    ),
    paths(
        crate::server::command::handle_command,
        crate::server::system::root,
    ),
    components(schemas(
        // Error
        ApiErrorResponse,
        ApiErrorBody,
        FieldError,
        // Commands
        CommandEnvelope,
        ResponseEnvelope,
        // Status
        StatusResponse,
    )),
    tags(
        (name = "mcp", description = "Bookmark actions"),
        (name = "status", description = "Liveness"),
    )
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
