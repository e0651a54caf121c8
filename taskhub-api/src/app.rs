/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::{build_router, AppState}, config::Config};
/// use taskhub_shared::store::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskhub_shared::{auth::session::SessionIssuer, error::ServiceResult, store::Store};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Users, tasks and todos
    pub store: Arc<dyn Store>,

    /// Signs and resolves session tokens
    pub sessions: Arc<SessionIssuer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Fails when the configured JWT secret is blank.
    pub fn new(store: Arc<dyn Store>, config: Config) -> ServiceResult<Self> {
        let sessions = SessionIssuer::new(config.jwt.secret.clone())?;

        Ok(Self {
            store,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/
///     ├── /user/
///     │   ├── POST /signup
///     │   └── POST /login
///     ├── /tasks/
///     │   ├── GET    /                       (open)
///     │   ├── POST   /                       (auth)
///     │   ├── GET    /:id                    (open)
///     │   ├── PUT    /:id                    (owner or collaborator)
///     │   ├── DELETE /:id                    (owner)
///     │   ├── POST   /:taskId/subtasks       (owner or collaborator)
///     │   ├── PUT    /:taskId/subtasks/:subtaskId
///     │   └── DELETE /:taskId/subtasks/:subtaskId
///     └── /todos/
///         ├── GET    /                       (open)
///         ├── POST   /                       (auth)
///         ├── GET    /:id                    (open)
///         ├── PUT    /:id                    (owner)
///         └── DELETE /:id                    (owner)
/// ```
///
/// Authentication is per handler: protected handlers take a
/// [`Caller`](crate::extract::Caller) argument.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/signup", post(routes::users::signup))
        .route("/login", post(routes::users::login));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/subtasks", post(routes::subtasks::create_subtask))
        .route(
            "/:id/subtasks/:subtask_id",
            put(routes::subtasks::update_subtask).delete(routes::subtasks::delete_subtask),
        );

    let todo_routes = Router::new()
        .route("/", get(routes::todos::list_todos).post(routes::todos::create_todo))
        .route(
            "/:id",
            get(routes::todos::get_todo)
                .put(routes::todos::update_todo)
                .delete(routes::todos::delete_todo),
        );

    let api_routes = Router::new()
        .nest("/user", user_routes)
        .nest("/tasks", task_routes)
        .nest("/todos", todo_routes);

    let cors = build_cors(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, LogFormat};
    use taskhub_shared::store::MemoryStore;

    fn config(secret: &str) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["https://app.example".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://unused".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: secret.to_string(),
            },
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_app_state_requires_secret() {
        assert!(AppState::new(Arc::new(MemoryStore::new()), config("")).is_err());

        let state = AppState::new(Arc::new(MemoryStore::new()), config("secret")).unwrap();
        let _router = build_router(state);
    }
}
