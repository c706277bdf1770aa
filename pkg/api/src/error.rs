//! Uniform JSON error responses.
//!
//! Every failing handler returns an [`ApiError`]: an HTTP status plus an
//! [`ErrorResponse`] body with a stable `code` and a readable `message`.
//! Server-side failures are logged here; their messages still reach the
//! client because the UI shows kubectl's complaint to the operator.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pkg_rbac::RbacError;
use pkg_types::api::ErrorResponse;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RbacError> for ApiError {
    fn from(err: RbacError) -> Self {
        let (status, code) = match &err {
            RbacError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            RbacError::NotManaged(_) => (StatusCode::FORBIDDEN, "not_managed"),
            RbacError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            RbacError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            RbacError::TokenUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "token_unavailable")
            }
            RbacError::Execution(_) => (StatusCode::INTERNAL_SERVER_ERROR, "execution_error"),
            RbacError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
            RbacError::ClusterConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "cluster_config_error")
            }
        };
        if status.is_server_error() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }
        ApiError::new(status, code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: RbacError) -> (StatusCode, String) {
        let api = ApiError::from(err);
        (api.status, api.body.code)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(RbacError::NotFound("Role dev/x".into())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RbacError::NotManaged("Role dev/x".into())),
            (StatusCode::FORBIDDEN, "not_managed".to_string())
        );
        assert_eq!(
            status_of(RbacError::AlreadyExists("x".into())).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RbacError::Validation("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RbacError::TokenUnavailable {
                secret: "s".into(),
                attempts: 10
            })
            .0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(RbacError::ClusterConfig("none".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_carries_resource() {
        let api = ApiError::from(RbacError::NotManaged("ClusterRole reader".into()));
        assert!(api.body.message.starts_with("ClusterRole reader"));
    }
}
