use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The GUI may be served from another origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/v1/sessions", sessions_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn sessions_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::sessions::create_session))
        .route("/{id}", get(handlers::sessions::get_session))
        .route("/{id}/guesses", post(handlers::sessions::submit_guess))
        .route("/{id}/hints", post(handlers::sessions::request_hint))
        .route("/{id}/give-up", post(handlers::sessions::give_up))
        .route(
            "/{id}/survey",
            get(handlers::sessions::get_survey).post(handlers::sessions::submit_survey),
        )
        .route("/{id}/advance", post(handlers::sessions::advance))
        .route("/{id}/audio", get(handlers::sessions::get_audio))
        .route("/{id}/audio/stop", post(handlers::sessions::stop_audio))
}
