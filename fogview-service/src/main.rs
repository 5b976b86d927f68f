//! fogview Service - HTTP microservice for SRTM terrain viewsheds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FOGVIEW_DATA_DIR` | Directory containing .hgt / .hgt.zip files | `.` |
//! | `FOGVIEW_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /tiles` - Tiles in the data directory
//! - `GET /tiles/{id}` - Footprint, resolution and elevation range of a tile
//! - `GET /viewshed?tile=&x=&y=&height=&radius=` - Viewshed of an observer
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use fogview::TileStoreBuilder;
use fogview_service::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fogview=info,fogview_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("FOGVIEW_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let store = match TileStoreBuilder::from_env() {
        Ok(builder) => builder.build(),
        Err(_) => {
            tracing::warn!("FOGVIEW_DATA_DIR not set, using current directory");
            TileStoreBuilder::new(".").build()
        }
    };

    tracing::info!(
        data_dir = %store.data_dir().display(),
        tiles = store.scan_tiles().len(),
        port = port,
        "Starting fogview service"
    );

    let app = router(Arc::new(AppState::new(store)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
