//! Router assembly

use crate::{handlers, middleware, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Platform analysis and repair
        .route("/platforms/{platform_id}/balance", get(handlers::platforms::balance))
        .route("/platforms/{platform_id}/authority", get(handlers::platforms::authority))
        .route("/platforms/{platform_id}/repair", post(handlers::platforms::repair))

        // Suggestions
        .route("/articles/{article_id}/suggestions", get(handlers::articles::suggestions))

        // External links
        .route("/links/verify", post(handlers::links::verify))
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}
