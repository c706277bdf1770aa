use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pkg_constants::auth::ADMIN_ROLE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;

/// Claims carried by an admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub role: String,
    pub iat: u64,
    pub exp: u64,
}

/// Issues and checks HS256 session tokens for the single admin identity.
pub struct SessionSigner {
    admin_password: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(admin_password: &str, secret: &str, ttl: Duration) -> Self {
        Self {
            admin_password: admin_password.to_string(),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        candidate == self.admin_password
    }

    pub fn issue(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            role: ADMIN_ROLE.to_string(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// Lifetime as shown to clients, e.g. `24h`.
    pub fn ttl_label(&self) -> String {
        let secs = self.ttl.as_secs();
        if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

/// The token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware: authenticates the request with a session token and injects
/// its [`Claims`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(req.headers()) else {
        debug!("Request without a Bearer token: {}", req.uri().path());
        return Err(ApiError::unauthorized("Access token required"));
    };

    match state.sessions.verify(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!("Rejected session token: {}", e);
            Err(ApiError::unauthorized("Invalid or expired token"))
        }
    }
}
