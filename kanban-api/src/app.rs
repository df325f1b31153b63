/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use kanban_api::{app::{build_router, AppState}, config::Config};
/// use kanban_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use kanban_shared::database::Database;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
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
    /// Models over the shared pool
    pub db: Database,

    /// The pool itself, for health checks and stats
    pub pool: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Cancelled on shutdown; in-flight queries stop with 503
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            db: Database::from_pool(pool.clone()),
            pool,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token for one request's queries
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Builds the Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /                      # Index page
/// ├── GET /health                # Health check
/// └── /v1/
///     ├── POST   /persons
///     ├── GET    /persons/:id
///     ├── DELETE /persons/:id
///     ├── POST   /boards
///     ├── GET    /boards/:id
///     ├── DELETE /boards/:id
///     ├── GET    /tasks/:id
///     └── GET    /tags/:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/persons", post(routes::persons::create_person))
        .route(
            "/persons/:id",
            get(routes::persons::get_person).delete(routes::persons::delete_person),
        )
        .route("/boards", post(routes::boards::create_board))
        .route(
            "/boards/:id",
            get(routes::boards::get_board).delete(routes::boards::delete_board),
        )
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tags/:id", get(routes::tags::get_tag));

    Router::new()
        .route("/", get(routes::index::index))
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
