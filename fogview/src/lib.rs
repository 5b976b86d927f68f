//! # fogview - Terrain Viewsheds from SRTM Tiles
//!
//! Decodes SRTM (Shuttle Radar Topography Mission) `.hgt` tiles into
//! elevation grids and computes which cells around an observer are visible,
//! occluded by terrain, or unknown.
//!
//! ## Features
//!
//! - **Decoding**: Big-endian `.hgt` samples into an immutable [`ElevationGrid`],
//!   void samples preserved
//! - **Geometry**: Axis-aligned [`BoundingBox`] with strict intersection and
//!   a versioned binary encoding
//! - **Viewshed**: Line-of-sight classification over a clipped square window,
//!   sequential or spread over a thread pool
//! - **Overlays**: Render-ready descriptions of tile footprints and viewshed
//!   images
//!
//! ## Quick Start
//!
//! ```ignore
//! use fogview::{viewshed, Observer, TileStore, ViewshedOptions};
//!
//! let store = TileStore::new("/data/srtm");
//! let tile = store.load_by_name("N39W075")?;
//!
//! // Observer 30m above the terrain at column 600, row 200, looking 200 cells out
//! let observer = Observer::new(600, 200, 30.0, 200);
//! let result = viewshed::compute(tile.grid(), &observer, ViewshedOptions::default())?;
//!
//! let counts = result.counts();
//! println!("{} visible, {} occluded", counts.visible, counts.occluded);
//! ```
//!
//! ## SRTM Data Format
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer representing elevation in meters.
//! The special value -32768 indicates void (no data).

pub mod bbox;
pub mod error;
pub mod grid;
pub mod overlay;
pub mod store;
pub mod tile;
pub mod tile_id;
pub mod viewshed;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use bbox::{BoundingBox, Coordinate};
pub use error::{ErrorKind, FogError, Result};
pub use grid::{ElevationGrid, GridStats, VOID_ELEVATION};
pub use overlay::{Overlay, Rendering, Rgba, ViewshedImage};
pub use store::{TileStore, TileStoreBuilder};
pub use tile::{ElevationTile, SrtmResolution, VOID_VALUE};
pub use tile_id::TileId;
pub use viewshed::{
    Observer, Strategy, ViewshedOptions, ViewshedResult, Visibility, VisibilityCounts,
};
