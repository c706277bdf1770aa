pub mod auth;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;

use std::sync::Arc;

use pkg_rbac::RbacService;

use crate::auth::SessionSigner;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub rbac: RbacService,
    pub sessions: Arc<SessionSigner>,
}
