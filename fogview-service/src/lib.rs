//! fogview Service Library
//!
//! HTTP handlers, OpenAPI document and router for the viewshed service.
//! This library is used by both the fogview-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use fogview::TileStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Tile store backing every request.
    pub store: TileStore,
}

impl AppState {
    pub fn new(store: TileStore) -> Self {
        Self { store }
    }
}

/// OpenAPI documentation for the fogview service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "fogview Viewshed Service",
        version = "0.1.0",
        description = "REST API for SRTM tile metadata and terrain viewsheds.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    paths(
        handlers::health_check,
        handlers::list_tiles,
        handlers::get_tile,
        handlers::get_viewshed,
    ),
    components(
        schemas(
            handlers::CoordinateResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::TilesResponse,
            handlers::TileResponse,
            handlers::ViewshedResponse,
        )
    ),
    tags(
        (name = "tiles", description = "Tile discovery and metadata"),
        (name = "viewshed", description = "Line-of-sight queries"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with documentation, CORS and tracing layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health_check))
        .route("/tiles", get(handlers::list_tiles))
        .route("/tiles/:id", get(handlers::get_tile))
        .route("/viewshed", get(handlers::get_viewshed))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, TileResponse, TilesResponse, ViewshedQuery, ViewshedResponse,
};
