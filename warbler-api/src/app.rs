/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use warbler_api::{app::{build_router, AppState}, config::Config};
/// use warbler_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use warbler_shared::{
    auth::middleware::jwt_auth_middleware, credentials::CredentialService, feed::FeedComposer,
    store::Store, tweets::TweetService,
};

use crate::config::Config;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` or wraps one, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub credentials: CredentialService,
    pub tweets: TweetService,
    pub feed: FeedComposer,
}

impl AppState {
    /// Wires the services to one store
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            credentials: CredentialService::new(store.clone(), config.jwt.settings()),
            tweets: TweetService::new(store.clone()),
            feed: FeedComposer::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /healthz                  # Health check (public)
/// └── /v1/
///     ├── POST /auth/register       # public
///     ├── POST /auth/login          # public
///     ├── GET  /auth/user           # bearer token
///     ├── GET  /tweets              # bearer token
///     ├── POST /tweets              # bearer token
///     ├── GET  /my-feed             # bearer token
///     └── GET  /users/:id/tweets    # bearer token
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

    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    // route_layer so unknown paths stay 404 instead of 401
    let protected_routes = Router::new()
        .route("/auth/user", get(routes::auth::current_user))
        .route(
            "/tweets",
            get(routes::tweets::list_tweets).post(routes::tweets::create_tweet),
        )
        .route("/my-feed", get(routes::tweets::my_feed))
        .route("/users/:id/tweets", get(routes::tweets::user_tweets))
        .route_layer(from_fn_with_state(
            state.credentials.jwt_settings().clone(),
            jwt_auth_middleware,
        ));

    let v1_routes = public_routes.merge(protected_routes);

    Router::new()
        .route("/healthz", get(routes::health::health_check))
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
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
