use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use pkg_types::api::{LoginRequest, LoginResponse};
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;
use crate::auth::bearer_token;
use crate::error::ApiError;

/// POST /api/auth/login: exchange the admin password for a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    if !state.sessions.check_password(&req.password) {
        warn!("Failed admin login attempt");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let token = state.sessions.issue().map_err(|e| {
        error!("Failed to sign session token: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session_error",
            "Failed to issue session token",
        )
    })?;

    if let Err(e) = state.rbac.ensure_app_namespace().await {
        warn!("App namespace initialization failed: {}", e);
    }

    info!("Issued admin session");
    let body = LoginResponse {
        success: true,
        token,
        expires_in: state.sessions.ttl_label(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/auth/verify: report whether the presented token is still valid.
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Access token required" })),
        )
            .into_response();
    };
    match state.sessions.verify(token) {
        Ok(claims) => (
            StatusCode::OK,
            Json(json!({ "success": true, "decoded": claims })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": format!("Invalid token: {}", e) })),
        )
            .into_response(),
    }
}
