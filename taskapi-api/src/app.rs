/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapi_api::{app::AppState, config::Config};
/// use taskapi_shared::store::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = taskapi_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use taskapi_shared::{auth::middleware::resolve_principal, store::TaskStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Users and tasks
    pub store: Arc<dyn TaskStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn TaskStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # Health check (public)
/// └── /api/v1/
///     ├── GET  /                           # API index (public)
///     ├── POST /user/register/             # (public)
///     ├── POST /user/login/                # (public)
///     ├── GET  /user/profile/              # authenticated
///     └── /task/                           # authenticated
///         ├── POST   /add/
///         ├── GET    /list/
///         ├── GET    /detail/:task_id
///         ├── POST   /:task_id/mark-done/
///         ├── DELETE /:task_id/remove/
///         └── POST   /mark-done-bulk/
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes, no auth
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/", get(routes::health::api_index))
        .route("/api/v1/user/register/", post(routes::auth::register))
        .route("/api/v1/user/login/", post(routes::auth::login));

    // Everything else requires a bearer token
    let protected_routes = Router::new()
        .route("/user/profile/", get(routes::auth::profile))
        .route("/task/add/", post(routes::tasks::add_task))
        .route("/task/list/", get(routes::tasks::list_tasks))
        .route("/task/detail/:task_id", get(routes::tasks::task_detail))
        .route("/task/:task_id/mark-done/", post(routes::tasks::mark_done))
        .route("/task/:task_id/remove/", delete(routes::tasks::remove_task))
        .route("/task/mark-done-bulk/", post(routes::tasks::mark_done_bulk))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Resolves the bearer token to a user and injects the resulting
/// `AuthContext` into request extensions. Handlers read it back with the
/// `AuthContext` extractor.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let auth_context =
        resolve_principal(state.store.as_ref(), state.jwt_secret(), auth_header.as_deref()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
