//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState, JwtService};
use crate::constants::{API_PREFIX, DOCS_PATH, MULTIPART_OVERHEAD_BYTES, OPENAPI_JSON_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use postyt_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1_000;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = AuthState {
        jwt: JwtService::new(config.jwt_secret()),
    };

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        Arc::new(auth_state),
        auth_middleware,
    ));

    // Multipart framing and text fields ride on top of the video itself
    let body_limit = state
        .upload
        .max_video_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    let app = public_routes()
        .merge(protected_routes)
        .route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path(DOCS_PATH))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/oauth/{platform}/callback",
            get(handlers::oauth::oauth_callback),
        )
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/user/accounts", API_PREFIX),
            get(handlers::accounts::list_accounts),
        )
        .route(
            &format!("{}/auth/{{platform}}/url", API_PREFIX),
            get(handlers::oauth::get_auth_url),
        )
        .route(
            &format!("{}/upload", API_PREFIX),
            post(handlers::upload::upload_video),
        )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}
