//! Tile lookup in a data directory.
//!
//! This module provides [`TileStore`], which resolves tile identifiers to
//! `.hgt` files (or `.hgt.zip` archives) in a directory and decodes them.
//!
//! Tiles are decoded on every call; nothing is cached. Callers that need a
//! tile repeatedly should keep the returned [`ElevationTile`] around.
//!
//! ```ignore
//! use fogview::{TileStoreBuilder, TileId};
//!
//! let store = TileStoreBuilder::from_env()?.build();
//! let tile = store.load(TileId::parse("N39W075")?)?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::bbox::BoundingBox;
use crate::error::{FogError, Result};
use crate::tile::ElevationTile;
use crate::tile_id::TileId;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "FOGVIEW_DATA_DIR";

/// Directory of SRTM tiles.
///
/// # Example
///
/// ```ignore
/// use fogview::TileStore;
///
/// let store = TileStore::new("/path/to/hgt/files");
///
/// for id in store.scan_tiles() {
///     println!("{}", id);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TileStore {
    /// Directory containing .hgt / .hgt.zip files.
    data_dir: PathBuf,
}

impl TileStore {
    /// Create a store over `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> TileStoreBuilder {
        TileStoreBuilder::new(data_dir)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load and decode a tile.
    ///
    /// `<id>.hgt` is preferred; if it is missing, `<id>.hgt.zip` is opened and
    /// its `.hgt` entry decoded in memory.
    ///
    /// # Errors
    ///
    /// - [`FogError::TileNotFound`] if neither file exists
    /// - [`FogError::Io`] / [`FogError::Archive`] if the file cannot be read
    /// - [`FogError::InvalidTileSize`] if the data is truncated
    pub fn load(&self, id: TileId) -> Result<ElevationTile> {
        let filename = id.filename();
        let path = self.data_dir.join(&filename);

        let tile = if path.exists() {
            tracing::debug!(tile = %id, path = %path.display(), "Loading tile");
            ElevationTile::from_file_with_id(&path, id)?
        } else {
            let zip_path = self.data_dir.join(format!("{}.zip", filename));
            if !zip_path.exists() {
                return Err(FogError::TileNotFound {
                    id: id.to_string(),
                    dir: self.data_dir.clone(),
                });
            }
            tracing::debug!(tile = %id, path = %zip_path.display(), "Loading zipped tile");
            ElevationTile::from_zip_with_id(&zip_path, id)?
        };

        Ok(tile)
    }

    /// Load a tile by name, e.g. `"N39W075"` or `"N39W075.hgt"`.
    pub fn load_by_name(&self, name: &str) -> Result<ElevationTile> {
        self.load(TileId::from_filename(name)?)
    }

    /// Load several tiles, independently and in parallel.
    ///
    /// Returns one result per requested id, in the same order. A failure for
    /// one tile does not affect the others.
    pub fn load_many(&self, ids: &[TileId]) -> Vec<Result<ElevationTile>> {
        ids.par_iter()
            .map(|&id| {
                let result = self.load(id);
                if let Err(e) = &result {
                    tracing::warn!(tile = %id, error = %e, "Tile failed to load");
                }
                result
            })
            .collect()
    }

    /// Scan the data directory for `.hgt` and `.hgt.zip` files.
    ///
    /// Returns a sorted, deduplicated list of tile ids. Files whose names are
    /// not tile identifiers are skipped. An unreadable directory yields an
    /// empty list.
    pub fn scan_tiles(&self) -> Vec<TileId> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.data_dir.display(), error = %e, "Cannot read data directory");
                return Vec::new();
            }
        };

        let ids: BTreeSet<TileId> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                let lower = name.to_ascii_lowercase();
                if lower.ends_with(".hgt") || lower.ends_with(".hgt.zip") {
                    TileId::from_filename(&name).ok()
                } else {
                    None
                }
            })
            .collect();

        ids.into_iter().collect()
    }

    /// Tiles in the data directory whose footprint overlaps `region`.
    ///
    /// Overlap is strict: a tile that only touches the region along an edge
    /// is not returned.
    pub fn tiles_covering(&self, region: &BoundingBox) -> Vec<TileId> {
        self.scan_tiles()
            .into_iter()
            .filter(|id| id.footprint().intersects(region))
            .collect()
    }
}

/// Builder for creating [`TileStore`] with custom configuration.
///
/// ```ignore
/// use fogview::TileStoreBuilder;
///
/// let store = TileStoreBuilder::new("/data/srtm").build();
/// ```
#[derive(Debug, Clone)]
pub struct TileStoreBuilder {
    data_dir: PathBuf,
}

impl TileStoreBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `FOGVIEW_DATA_DIR` | Directory containing .hgt files | Required |
    ///
    /// # Errors
    ///
    /// Returns an error if `FOGVIEW_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var(DATA_DIR_ENV).map_err(|_| {
            FogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} environment variable not set", DATA_DIR_ENV),
            ))
        })?;

        Ok(Self::new(data_dir))
    }

    /// Set the data directory.
    ///
    /// Overrides the directory set in the constructor or from environment.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Build the [`TileStore`].
    pub fn build(self) -> TileStore {
        TileStore {
            data_dir: self.data_dir,
        }
    }
}
