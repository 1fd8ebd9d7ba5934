use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{accreditations, bulk_import, health, projects, scans};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Create rate limiter if rate limiting is enabled (rate_limit_per_minute > 0)
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Portal routes (project/record management and import)
    let portal_routes = Router::new()
        // Project routes (v1)
        .route("/api/v1/projects", post(projects::create_project))
        .route("/api/v1/projects", get(projects::list_projects))
        .route("/api/v1/projects/:project_id", get(projects::get_project))
        .route("/api/v1/projects/:project_id", put(projects::update_project))
        // Accreditation routes (v1)
        .route(
            "/api/v1/projects/:project_id/accreditations",
            post(accreditations::create_accreditation),
        )
        .route(
            "/api/v1/accreditations",
            get(accreditations::list_accreditations),
        )
        .route(
            "/api/v1/accreditations/:id",
            get(accreditations::get_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id",
            put(accreditations::update_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id/submit",
            post(accreditations::submit_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id/approve",
            post(accreditations::approve_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id/reject",
            post(accreditations::reject_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id/revoke",
            post(accreditations::revoke_accreditation),
        )
        .route(
            "/api/v1/accreditations/:id/scans",
            get(accreditations::list_scans),
        )
        // Bulk import routes (v1)
        .route("/api/v1/import/template", get(bulk_import::get_template))
        .route("/api/v1/import/validate", post(bulk_import::validate_import))
        .route("/api/v1/import/commit", post(bulk_import::commit_import));

    // Scan routes: the exposed surface, rate limited per client
    let scan_routes = Router::new()
        .route("/api/v1/verify/:token", get(scans::verify_token))
        .route("/api/v1/scans", post(scans::record_scan_attempt))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Public routes (no actor context required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(portal_routes)
        .merge(scan_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware)) // Security headers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
