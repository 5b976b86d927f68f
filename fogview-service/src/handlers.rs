//! HTTP request handlers for the viewshed service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fogview::{
    viewshed, Coordinate, ElevationTile, ErrorKind, FogError, Observer, SrtmResolution, Strategy,
    TileId, ViewshedOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the viewshed endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewshedQuery {
    /// Tile identifier, e.g. `N35E138`.
    pub tile: String,
    /// Observer column.
    pub x: usize,
    /// Observer row (0 = north edge).
    pub y: usize,
    /// Eye height above the terrain, in meters.
    pub height: f64,
    /// Half-width of the square query window, in cells.
    pub radius: usize,
    /// Spread the window rows over the thread pool.
    #[serde(default)]
    pub parallel: bool,
}

/// Geographic position.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CoordinateResponse {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinate> for CoordinateResponse {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: c.lat,
            lon: c.lon,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Tiles available in the data directory.
#[derive(Debug, Serialize, ToSchema)]
pub struct TilesResponse {
    pub count: usize,
    pub tiles: Vec<String>,
}

/// Metadata for one tile.
#[derive(Debug, Serialize, ToSchema)]
pub struct TileResponse {
    pub id: String,
    /// `SRTM1` or `SRTM3`.
    pub resolution: String,
    /// Samples per side.
    pub samples: usize,
    /// Approximate sample spacing in meters.
    pub resolution_meters: f64,
    /// Lower-left, upper-left, upper-right, lower-right.
    pub corners: Vec<CoordinateResponse>,
    pub center: CoordinateResponse,
    /// Lowest non-void elevation in meters.
    pub min_elevation: Option<f64>,
    /// Highest non-void elevation in meters.
    pub max_elevation: Option<f64>,
    pub void_count: usize,
}

/// Result of a viewshed query.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewshedResponse {
    pub tile: String,
    /// Grid column of the window's north-west corner.
    pub origin_x: usize,
    /// Grid row of the window's north-west corner.
    pub origin_y: usize,
    pub width: usize,
    pub height: usize,
    pub visible: usize,
    pub occluded: usize,
    pub void: usize,
    /// Window corners: lower-left, upper-left, upper-right, lower-right.
    pub corners: Vec<CoordinateResponse>,
    /// Row-major cell codes from the north edge: 1 visible, 0 occluded, -1 void.
    pub cells: Vec<i8>,
}

/// Failure of a request, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    Fog(FogError),
    Internal(String),
}

impl From<FogError> for ApiError {
    fn from(e: FogError) -> Self {
        ApiError::Fog(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fog(FogError::TileNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Fog(e) => match e.kind() {
                ErrorKind::Format | ErrorKind::Precondition => StatusCode::BAD_REQUEST,
                ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Fog(e) => e.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List the tiles available in the data directory.
#[utoipa::path(
    get,
    path = "/tiles",
    tag = "tiles",
    responses(
        (status = 200, description = "Sorted tile identifiers", body = TilesResponse),
        (status = 500, description = "Unexpected error", body = ErrorResponse)
    )
)]
pub async fn list_tiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TilesResponse>, ApiError> {
    let tiles = tokio::task::spawn_blocking(move || state.store.scan_tiles()).await?;

    Ok(Json(TilesResponse {
        count: tiles.len(),
        tiles: tiles.iter().map(ToString::to_string).collect(),
    }))
}

/// Describe one tile: footprint, resolution and elevation range.
///
/// # Returns
///
/// - `200 OK` with tile metadata
/// - `400 Bad Request` if the identifier or the tile file is malformed
/// - `404 Not Found` if the tile is not in the data directory
#[utoipa::path(
    get,
    path = "/tiles/{id}",
    tag = "tiles",
    params(("id" = String, Path, description = "Tile identifier, e.g. N35E138")),
    responses(
        (status = 200, description = "Tile metadata", body = TileResponse),
        (status = 400, description = "Malformed identifier or tile", body = ErrorResponse),
        (status = 404, description = "Tile not found", body = ErrorResponse)
    )
)]
pub async fn get_tile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TileResponse>, ApiError> {
    let id = TileId::parse(&id)?;
    tracing::debug!(tile = %id, "Tile query");

    let tile = load(state, id).await?;
    Ok(Json(tile_response(&tile)))
}

/// Compute the viewshed of an observer standing on a tile.
///
/// # Returns
///
/// - `200 OK` with the classified window
/// - `400 Bad Request` if the tile identifier is malformed or the observer is
///   outside the tile
/// - `404 Not Found` if the tile is not in the data directory
#[utoipa::path(
    get,
    path = "/viewshed",
    tag = "viewshed",
    params(ViewshedQuery),
    responses(
        (status = 200, description = "Classified window", body = ViewshedResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 404, description = "Tile not found", body = ErrorResponse)
    )
)]
pub async fn get_viewshed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewshedQuery>,
) -> Result<Json<ViewshedResponse>, ApiError> {
    let id = TileId::parse(&query.tile)?;
    tracing::debug!(
        tile = %id,
        x = query.x,
        y = query.y,
        height = query.height,
        radius = query.radius,
        parallel = query.parallel,
        "Viewshed query"
    );

    let strategy = if query.parallel {
        Strategy::Parallel
    } else {
        Strategy::Sequential
    };
    let observer = Observer::new(query.x, query.y, query.height, query.radius);

    let response = tokio::task::spawn_blocking(move || -> Result<ViewshedResponse, FogError> {
        let tile = state.store.load(id)?;
        let result = viewshed::compute(
            tile.grid(),
            &observer,
            ViewshedOptions::with_strategy(strategy),
        )?;

        let (origin_x, origin_y) = result.origin();
        let counts = result.counts();
        Ok(ViewshedResponse {
            tile: id.to_string(),
            origin_x,
            origin_y,
            width: result.width(),
            height: result.height(),
            visible: counts.visible,
            occluded: counts.occluded,
            void: counts.void,
            corners: corners(result.footprint(&tile).corners()),
            cells: result.codes(),
        })
    })
    .await??;

    tracing::info!(
        tile = %response.tile,
        visible = response.visible,
        occluded = response.occluded,
        void = response.void,
        "Viewshed computed"
    );

    Ok(Json(response))
}

async fn load(state: Arc<AppState>, id: TileId) -> Result<ElevationTile, ApiError> {
    Ok(tokio::task::spawn_blocking(move || state.store.load(id)).await??)
}

fn tile_response(tile: &ElevationTile) -> TileResponse {
    let stats = tile.grid().stats();
    let resolution = match tile.resolution() {
        SrtmResolution::Srtm1 => "SRTM1",
        SrtmResolution::Srtm3 => "SRTM3",
    };

    TileResponse {
        id: tile.id().to_string(),
        resolution: resolution.to_string(),
        samples: tile.grid().size(),
        resolution_meters: tile.resolution().meters(),
        corners: corners(tile.footprint().corners()),
        center: tile.center().into(),
        min_elevation: stats.min,
        max_elevation: stats.max,
        void_count: stats.void_count,
    }
}

fn corners(corners: [Coordinate; 4]) -> Vec<CoordinateResponse> {
    corners.into_iter().map(CoordinateResponse::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogview::BoundingBox;

    #[test]
    fn test_viewshed_query_deserialize() {
        let json = r#"{"tile": "N35E138", "x": 600, "y": 600, "height": 30.0, "radius": 50}"#;
        let query: ViewshedQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.tile, "N35E138");
        assert_eq!((query.x, query.y, query.radius), (600, 600, 50));
        assert!(!query.parallel);
    }

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::Fog(FogError::TileNotFound {
            id: "N35E138".to_string(),
            dir: "/data".into(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_id = ApiError::Fog(FogError::InvalidTileId {
            name: "X".to_string(),
        });
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let bbox = BoundingBox::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)).unwrap();
        let disjoint = ApiError::Fog(FogError::NoIntersection { a: bbox, b: bbox });
        assert_eq!(disjoint.status(), StatusCode::BAD_REQUEST);

        let io = ApiError::Fog(FogError::Io(std::io::Error::other("disk")));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
    }
}
