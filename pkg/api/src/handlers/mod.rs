pub mod auth;
pub mod configs;
pub mod roles;
pub mod users;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// GET /health: liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// A kubeconfig document served as a file download.
pub(crate) fn kubeconfig_attachment(namespace: &str, name: &str, yaml: String) -> Response {
    let disposition = format!(
        "attachment; filename=\"kubeconfig-{}-{}.yaml\"",
        namespace, name
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/x-yaml".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        yaml,
    )
        .into_response()
}
