use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::auth::auth_middleware;
use crate::handlers::{self, auth, configs, roles, users};
use crate::request_id::request_id_middleware;

/// Middleware: marks every GET response as non-cacheable.
pub async fn no_cache_middleware(req: Request, next: Next) -> Response {
    let is_get = req.method() == Method::GET;
    let mut response = next.run(req).await;
    if is_get {
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(header::EXPIRES, HeaderValue::from_static("-1"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    }
    response
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    // Protected API routes
    let api_routes = Router::new()
        // users
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/users/{ns}/{name}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/users/{ns}/{name}/kubeconfig",
            get(users::user_kubeconfig),
        )
        // roles and cluster roles
        .route("/api/roles", get(roles::list_roles))
        .route("/api/roles/templates", get(roles::templates))
        .route("/api/roles/namespace/{ns}", get(roles::namespace_roles))
        .route("/api/roles/namespace/{ns}/role", post(roles::create_role))
        .route(
            "/api/roles/namespace/{ns}/role/{name}",
            put(roles::update_role).delete(roles::delete_role),
        )
        .route("/api/roles/clusterrole", post(roles::create_cluster_role))
        .route(
            "/api/roles/clusterrole/{name}",
            put(roles::update_cluster_role).delete(roles::delete_cluster_role),
        )
        // bindings
        .route("/api/roles/bindings", get(roles::list_bindings))
        .route(
            "/api/roles/bindings/{ns}/{name}",
            get(roles::service_account_bindings),
        )
        .route(
            "/api/roles/namespace/{ns}/rolebinding",
            post(roles::create_role_binding),
        )
        .route(
            "/api/roles/namespace/{ns}/rolebinding/{name}",
            put(roles::update_role_binding).delete(roles::delete_role_binding),
        )
        .route(
            "/api/roles/clusterrolebinding",
            post(roles::create_cluster_role_binding),
        )
        .route(
            "/api/roles/clusterrolebinding/{name}",
            put(roles::update_cluster_role_binding).delete(roles::delete_cluster_role_binding),
        )
        // per-ServiceAccount permissions
        .route(
            "/api/roles/serviceaccount/add-role",
            post(roles::add_role_to_service_account),
        )
        .route(
            "/api/roles/serviceaccount/{ns}/{name}/permissions",
            get(roles::service_account_permissions),
        )
        .route(
            "/api/roles/serviceaccount/{ns}/{name}/role/{role_name}",
            delete(roles::remove_role_from_service_account),
        )
        // cluster configuration
        .route("/api/configs/cluster/info", get(configs::cluster_info))
        .route("/api/configs/nodes", get(configs::list_nodes))
        .route("/api/configs/namespaces", get(configs::list_namespaces))
        .route(
            "/api/configs/{ns}/{name}",
            get(configs::download_kubeconfig),
        )
        .route_layer(middleware::from_fn(no_cache_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes + merged
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", get(auth::verify))
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
