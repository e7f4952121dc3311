use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    responses((status = 200, body = StatusResponse)),
    description = "Basic liveness check."
)]
pub(crate) async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Hoarder MCP Server is running.".to_string(),
    })
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
